//! Middleware trait, continuation, and onion composition.
//!
//! A middleware sits around the rest of the pipeline. It receives the
//! request and a [`Next`] continuation representing everything inside it —
//! the remaining middleware plus the route handler — and either:
//!
//! - calls `next.run(request)` exactly once (possibly with a modified
//!   request) and returns its result, possibly with a modified response, or
//! - returns (or fails) without calling `next`, short-circuiting everything
//!   inside it.
//!
//! [`compose`] folds the middleware list from last to first around a base
//! handler, so the *first-registered* middleware runs outermost: it sees the
//! request first and the response last, exactly like nested scoped blocks.
//! Composition itself is pure — all effects happen when the composed handler
//! is invoked.

use std::sync::Arc;

use crate::handler::{BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;
use crate::{Error, Result};

pub use crate::handler::BoxFuture;

/// A cross-cutting stage wrapped around the route handler.
pub trait Middleware: Send + Sync + 'static {
    /// Processes `request`, invoking `next` to continue the chain.
    fn handle(&self, request: Request, next: Next) -> BoxFuture;
}

/// The rest of the pipeline, handed to a middleware.
///
/// Consumed by [`Next::run`] so it can only be invoked once. Dropping it
/// without running it is the short-circuit case.
pub struct Next {
    inner: BoxedHandler,
}

impl Next {
    /// Invokes the remaining middleware and, ultimately, the route handler.
    pub async fn run(self, request: Request) -> Result<Response> {
        self.inner.call(request).await
    }
}

/// One onion layer: a middleware plus everything inside it.
struct Layer {
    middleware: Arc<dyn Middleware>,
    inner: BoxedHandler,
}

impl ErasedHandler for Layer {
    fn call(&self, req: Request) -> BoxFuture {
        let next = Next { inner: Arc::clone(&self.inner) };
        self.middleware.handle(req, next)
    }
}

/// Folds `middleware` around `base`, last to first.
///
/// The result is a single handler: `middleware[0]` outermost, `base`
/// innermost.
pub(crate) fn compose(base: BoxedHandler, middleware: &[Arc<dyn Middleware>]) -> BoxedHandler {
    let mut handler = base;
    for mw in middleware.iter().rev() {
        handler = Arc::new(Layer {
            middleware: Arc::clone(mw),
            inner: handler,
        });
    }
    handler
}

/// Builds a middleware from an async closure.
///
/// ```rust
/// use trellis::middleware::{from_fn, Next};
/// use trellis::{Request, Response, Result};
///
/// let trace = from_fn(|req: Request, next: Next| async move {
///     tracing::debug!(path = req.path(), "request");
///     next.run(req).await
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Response, Error>> + Send + 'static,
{
    FnMiddleware(f)
}

/// A middleware backed by a plain async function. See [`from_fn`].
pub struct FnMiddleware<F>(F);

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn handle(&self, request: Request, next: Next) -> BoxFuture {
        Box::pin((self.0)(request, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::method::Method;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn request() -> Request {
        Request::new(Method::Get, "/", HashMap::new(), None)
    }

    /// Appends a marker before and after its continuation runs.
    struct Tracer {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Tracer {
        fn handle(&self, request: Request, next: Next) -> BoxFuture {
            let label = self.label;
            let log = Arc::clone(&self.log);
            Box::pin(async move {
                log.lock().unwrap().push(format!("{label}:before"));
                let res = next.run(request).await;
                log.lock().unwrap().push(format!("{label}:after"));
                res
            })
        }
    }

    fn base(log: Arc<Mutex<Vec<String>>>) -> BoxedHandler {
        (move |_req: Request| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push("handler".to_owned());
                Ok::<_, Error>(Response::text("ok"))
            }
        })
        .into_boxed_handler()
    }

    #[tokio::test]
    async fn first_registered_runs_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let middleware: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Tracer { label: "outer", log: Arc::clone(&log) }),
            Arc::new(Tracer { label: "inner", log: Arc::clone(&log) }),
        ];

        let chain = compose(base(Arc::clone(&log)), &middleware);
        chain.call(request()).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer:before", "inner:before", "handler", "inner:after", "outer:after"]
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_inner_layers_and_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let middleware: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Tracer { label: "outer", log: Arc::clone(&log) }),
            Arc::new(from_fn(|_req, _next| async move {
                Ok::<_, Error>(Response::forbidden())
            })),
            Arc::new(Tracer { label: "never", log: Arc::clone(&log) }),
        ];

        let chain = compose(base(Arc::clone(&log)), &middleware);
        let res = chain.call(request()).await.unwrap();

        assert_eq!(res.status(), crate::Status::Forbidden);
        // The short-circuiting layer cut off the inner tracer and the handler.
        assert_eq!(*log.lock().unwrap(), vec!["outer:before", "outer:after"]);
    }

    #[tokio::test]
    async fn failure_propagates_through_outer_layers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let middleware: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(from_fn(|_req, _next| async move {
                Err::<Response, _>(Error::PermissionDenied)
            })),
        ];

        let chain = compose(base(log), &middleware);
        let err = chain.call(request()).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied));
    }

    #[tokio::test]
    async fn empty_list_is_just_the_base_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = compose(base(Arc::clone(&log)), &[]);
        chain.call(request()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["handler"]);
    }
}
