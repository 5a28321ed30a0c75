//! # CLI Module
//!
//! The `brrtbind` command-line tool: inspect and check route files, and bind a single
//! request against them without running a server.
//!
//! ## Commands
//!
//! ### `inspect`
//!
//! ```bash
//! brrtbind inspect --routes demos/tutorial_routes.yaml
//! ```
//!
//! ### `check`
//!
//! Loads and registers every route, listing all declaration issues. Exits non-zero
//! if there are any.
//!
//! ```bash
//! brrtbind check --routes demos/tutorial_routes.yaml
//! ```
//!
//! ### `bind`
//!
//! Prints the bound parameters as JSON, or the error payload (exit code 1).
//!
//! ```bash
//! brrtbind bind --routes demos/tutorial_routes.yaml \
//!     --method PUT --url /items/5 \
//!     --body '{"item": {"name": "Foo", "price": 35.4}}'
//!
//! brrtbind bind --routes demos/tutorial_routes.yaml \
//!     --url /items/ -H 'X-Token: foo' -H 'X-Token: bar' --cookie 'cookie_id=abc'
//! ```

mod commands;

pub use commands::{build_request, run, run_cli, Cli, Commands};
