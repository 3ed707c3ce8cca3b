//! The dispatch core.
//!
//! For each completed request: route lookup, path-parameter attachment,
//! middleware composition around the matched handler, invocation, and —
//! this being the single place errors become responses — mapping any
//! failure to its textual response per the fixed taxonomy in
//! [`crate::error`].

use std::sync::Arc;

use crate::error::Error;
use crate::middleware::{compose, Middleware};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The immutable request-processing pipeline: one route table plus one
/// global middleware list, shared read-only across every connection.
pub struct Dispatcher {
    router: Arc<Router>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    pub(crate) fn new(router: Router, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            router: Arc::new(router),
            middleware,
        }
    }

    /// Processes one request to completion. Never fails: every error is
    /// converted to a response here.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method();
        let path = request.path().to_owned();

        let response = match self.run(request).await {
            Ok(response) => response,
            Err(err) => error_response(err),
        };

        tracing::debug!(%method, %path, status = response.status().code(), "handled");
        response
    }

    async fn run(&self, mut request: Request) -> Result<Response, Error> {
        let (handler, params) = self
            .router
            .lookup(request.method(), request.path())
            .ok_or(Error::RouteNotFound)?;
        request.set_path_params(params);

        let chain = compose(handler, &self.middleware);
        chain.call(request).await
    }
}

/// Maps an error to its textual response.
///
/// Internal errors log their cause here and send only the generic label —
/// the one spot where the client-visible text and the server-side record
/// intentionally differ.
pub(crate) fn error_response(err: Error) -> Response {
    if let Error::Internal(cause) = &err {
        tracing::error!(%cause, "request failed");
    }
    Response::text(err.to_string()).with_status(err.status())
}
