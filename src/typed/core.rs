use crate::binder::BoundRequest;
use crate::dispatcher::{Dispatcher, HandlerResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Trait implemented by typed handlers.
///
/// The bound parameters are deserialized into [`TypedHandler::Params`] before
/// `handle` runs, and the returned value is serialized as a 200 JSON response.
pub trait TypedHandler: Send + Sync + 'static {
    /// Parameter struct; its field names are the parameter names of the route
    type Params: DeserializeOwned + Send + 'static;
    /// Response type (serialized to JSON)
    type Response: Serialize + Send + 'static;

    fn handle(&self, req: TypedRequest<Self::Params>) -> Self::Response;
}

/// Bound parameters of one request, as the handler's own type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRequest<T> {
    pub handler_name: Arc<str>,
    pub data: T,
}

impl<T: DeserializeOwned> TypedRequest<T> {
    /// Convert a [`BoundRequest`] into the typed form.
    ///
    /// # Errors
    ///
    /// Returns an error if the bound parameters do not fit `T`.
    pub fn from_bound(req: &BoundRequest) -> Result<Self, serde_json::Error> {
        Ok(TypedRequest {
            handler_name: Arc::clone(&req.handler_name),
            data: req.deserialize()?,
        })
    }
}

impl Dispatcher {
    /// Register a typed handler under `name`.
    ///
    /// A parameter set that does not deserialize into `H::Params` is a declaration
    /// mismatch, not a client error, and is answered with 500.
    pub fn register_typed<H>(&mut self, name: &str, handler: H)
    where
        H: TypedHandler,
    {
        self.register_handler(name, move |bound: BoundRequest| {
            let typed = match TypedRequest::<H::Params>::from_bound(&bound) {
                Ok(typed) => typed,
                Err(err) => {
                    error!(
                        handler_name = %bound.handler_name,
                        error = %err,
                        "Bound parameters do not match handler type"
                    );
                    return HandlerResponse::json(
                        500,
                        json!({
                            "error": "Invalid handler parameters",
                            "handler": bound.handler_name.as_ref(),
                            "message": err.to_string(),
                        }),
                    );
                }
            };
            HandlerResponse::ok(&handler.handle(typed))
        });
    }
}
