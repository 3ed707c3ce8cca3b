//! Handler trait and type erasure.
//!
//! The route table needs to hold handlers of *different* concrete types in
//! one `Vec`. Rust collections hold one type, so handlers are stored as
//! trait objects behind a common erased interface:
//!
//! ```text
//! async fn show(req: Request) -> Result<Response> { … }   ← user writes this
//!        ↓ app.get("/users/<id>", show)
//! show.into_boxed_handler()                               ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                               ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                      ← one vtable dispatch
//! ```
//!
//! The same erased shape is what the middleware composer folds around
//! (see [`crate::middleware`]): a fully composed chain is itself just one
//! `BoxedHandler`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future resolving to a handler outcome.
///
/// Appears in the signature of [`Middleware::handle`](crate::Middleware::handle),
/// so middleware implemented outside this crate name it too.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> trellis::Result<Response>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype holding a concrete handler `F`, bridging the typed world to the
/// trait-object world.
struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin((self.0)(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use std::collections::HashMap;

    async fn ok(_req: Request) -> Result<Response> {
        Ok(Response::text("ok"))
    }

    #[tokio::test]
    async fn erased_handler_invokes_the_function() {
        let handler = ok.into_boxed_handler();
        let req = Request::new(Method::Get, "/", HashMap::new(), None);
        let res = handler.call(req).await.unwrap();
        assert_eq!(res.body(), Some(&b"ok"[..]));
    }

    #[tokio::test]
    async fn closures_are_handlers_too() {
        let handler = (|req: Request| async move {
            Ok::<_, Error>(Response::text(req.path().to_owned()))
        })
        .into_boxed_handler();
        let req = Request::new(Method::Get, "/echo", HashMap::new(), None);
        let res = handler.call(req).await.unwrap();
        assert_eq!(res.body(), Some(&b"/echo"[..]));
    }
}
