//! Authentication and permission guards.
//!
//! Two small middleware, both session-based:
//!
//! - [`RequireAuth`] rejects requests whose session carries no logged-in
//!   marker — either by redirecting to a login page or by failing with
//!   `401 Authentication required`.
//! - [`Permission`] wraps any [`Guard`] and fails with `403 Permission
//!   denied` when the guard says no.
//!
//! How the marker gets *into* the session (a login handler checking
//! credentials against storage) is application code; these guards only
//! enforce its presence.

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Default session key marking an authenticated user.
pub const DEFAULT_USER_KEY: &str = "user_id";

/// Rejects requests without an authenticated session.
#[derive(Clone)]
pub struct RequireAuth {
    session_key: String,
    redirect_to: Option<String>,
}

impl RequireAuth {
    /// Requires a non-null [`DEFAULT_USER_KEY`] entry in the session.
    pub fn new() -> Self {
        Self {
            session_key: DEFAULT_USER_KEY.to_owned(),
            redirect_to: None,
        }
    }

    /// Requires a non-null entry under `session_key` instead.
    pub fn with_session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = session_key.into();
        self
    }

    /// Redirect unauthenticated requests to `path` instead of failing
    /// with 401.
    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = Some(path.into());
        self
    }
}

impl Default for RequireAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for RequireAuth {
    fn handle(&self, request: Request, next: Next) -> BoxFuture {
        let this = self.clone();
        Box::pin(async move {
            let authenticated = request
                .session()
                .and_then(|s| s.get(&this.session_key))
                .is_some_and(|v| !v.is_null());

            if authenticated {
                return next.run(request).await;
            }

            match this.redirect_to {
                Some(path) => Ok(Response::redirect(&path, false)),
                None => Err(Error::NotAuthenticated),
            }
        })
    }
}

/// A capability check against a request.
pub trait Guard: Send + Sync + 'static {
    /// Whether `request` is allowed through.
    fn allows(&self, request: &Request) -> bool;
}

impl<F> Guard for F
where
    F: Fn(&Request) -> bool + Send + Sync + 'static,
{
    fn allows(&self, request: &Request) -> bool {
        self(request)
    }
}

/// Fails with `403` when its guard rejects the request.
pub struct Permission<G> {
    guard: G,
}

impl<G: Guard> Permission<G> {
    pub fn new(guard: G) -> Self {
        Self { guard }
    }
}

impl<G: Guard> Middleware for Permission<G> {
    fn handle(&self, request: Request, next: Next) -> BoxFuture {
        if self.guard.allows(&request) {
            Box::pin(next.run(request))
        } else {
            Box::pin(async { Err(Error::PermissionDenied) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{BoxedHandler, Handler};
    use crate::method::Method;
    use crate::middleware::compose;
    use crate::session::Session;
    use crate::Status;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn ok_handler() -> BoxedHandler {
        (|_req: Request| async move { Ok::<_, Error>(Response::text("ok")) }).into_boxed_handler()
    }

    fn anonymous() -> Request {
        let session = Session::new("sid".to_owned(), HashMap::new());
        Request::new(Method::Get, "/private", HashMap::new(), None).with_session(session)
    }

    fn logged_in() -> Request {
        let session = Session::new("sid".to_owned(), HashMap::new());
        session.insert(DEFAULT_USER_KEY, "7");
        Request::new(Method::Get, "/private", HashMap::new(), None).with_session(session)
    }

    #[tokio::test]
    async fn missing_user_key_fails_with_not_authenticated() {
        let chain = compose(ok_handler(), &[Arc::new(RequireAuth::new())]);
        let err = chain.call(anonymous()).await.unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
    }

    #[tokio::test]
    async fn authenticated_session_passes() {
        let chain = compose(ok_handler(), &[Arc::new(RequireAuth::new())]);
        let res = chain.call(logged_in()).await.unwrap();
        assert_eq!(res.body(), Some(&b"ok"[..]));
    }

    #[tokio::test]
    async fn redirect_variant_short_circuits_with_307() {
        let mw = RequireAuth::new().redirect_to("/login");
        let chain = compose(ok_handler(), &[Arc::new(mw)]);
        let res = chain.call(anonymous()).await.unwrap();
        assert_eq!(res.status(), Status::TemporaryRedirect);
        assert_eq!(res.header("location"), Some("/login"));
    }

    #[tokio::test]
    async fn no_session_at_all_is_unauthenticated() {
        let chain = compose(ok_handler(), &[Arc::new(RequireAuth::new())]);
        let req = Request::new(Method::Get, "/private", HashMap::new(), None);
        assert!(matches!(chain.call(req).await.unwrap_err(), Error::NotAuthenticated));
    }

    #[tokio::test]
    async fn permission_guard_rejects_with_403() {
        let gate = Permission::new(|req: &Request| req.header("X-Admin").is_some());
        let chain = compose(ok_handler(), &[Arc::new(gate)]);

        let err = chain.call(anonymous()).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied));

        let mut headers = HashMap::new();
        headers.insert("X-Admin".to_owned(), "1".to_owned());
        let req = Request::new(Method::Get, "/private", headers, None);
        assert!(chain.call(req).await.is_ok());
    }
}
