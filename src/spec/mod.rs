//! # Spec Module
//!
//! Declarations of what a route expects from a request.
//!
//! A [`RouteSpec`] carries an ordered list of [`ParameterSpec`]s, each wrapping a
//! [`FieldSpec`] (name, [`ValueType`], required flag, default, [`Constraints`]) together with
//! the [`ParameterLocation`] it is read from. Structured bodies are described by
//! [`ObjectSchema`] trees whose nodes carry their own field lists.
//!
//! Declarations are built either with the builder API in [`build`] or loaded from a
//! YAML/JSON route file with [`load_routes`]. They are immutable once registered with a
//! [`Router`](crate::router::Router).

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
