//! Sessions: per-client server-held state keyed by a cookie.
//!
//! [`SessionMiddleware`] resolves the session identifier from the request's
//! cookie header (synthesizing a fresh one when absent), loads the stored
//! data, attaches a [`Session`] handle to the request, and — after the rest
//! of the chain finishes, *whether it succeeded or failed* — persists the
//! data back to the shared store. Session state written before a later
//! failure is deliberately kept. On success the response additionally gets
//! the `Set-Cookie` header carrying the identifier.
//!
//! Two requests racing on the same session identifier (two tabs, one cookie)
//! are serialized at the granularity of each store or handle operation by
//! the locks inside; the store never sees a torn entry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::value::Value;

/// Default name of the cookie carrying the session identifier.
pub const DEFAULT_COOKIE_NAME: &str = "session_id";

#[derive(Debug)]
struct SessionInner {
    id: String,
    data: HashMap<String, Value>,
}

/// A live session handle.
///
/// Cheap to clone; every clone refers to the same underlying entry, so a
/// value inserted by the handler is visible to the middleware persisting the
/// session afterwards.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    pub(crate) fn new(id: String, data: HashMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner { id, data })),
        }
    }

    /// The opaque session identifier.
    pub fn id(&self) -> String {
        self.inner.lock().id.clone()
    }

    /// Returns a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().data.get(key).cloned()
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.lock().data.insert(key.into(), value.into());
    }

    /// Removes and returns the entry under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.lock().data.remove(key)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.inner.lock().data.clear();
    }

    fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.lock().data.clone()
    }
}

type Store = Arc<Mutex<HashMap<String, HashMap<String, Value>>>>;

/// Middleware attaching and persisting sessions.
///
/// Holds the shared in-memory store. Clone it to keep a handle outside the
/// middleware list — all clones share one store.
#[derive(Clone)]
pub struct SessionMiddleware {
    store: Store,
    cookie_name: String,
}

impl SessionMiddleware {
    /// A session middleware using [`DEFAULT_COOKIE_NAME`].
    pub fn new() -> Self {
        Self::with_cookie_name(DEFAULT_COOKIE_NAME)
    }

    /// A session middleware reading and setting the given cookie name.
    pub fn with_cookie_name(cookie_name: impl Into<String>) -> Self {
        Self {
            store: Arc::new(Mutex::new(HashMap::new())),
            cookie_name: cookie_name.into(),
        }
    }

    /// Extracts the session id from the cookie header, or mints a new one.
    fn resolve_id(&self, request: &Request) -> String {
        request
            .header("Cookie")
            .and_then(|cookies| {
                cookies
                    .split(';')
                    .map(str::trim)
                    .find_map(|entry| entry.strip_prefix(&format!("{}=", self.cookie_name)))
            })
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

impl Default for SessionMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for SessionMiddleware {
    fn handle(&self, request: Request, next: Next) -> BoxFuture {
        let this = self.clone();
        Box::pin(async move {
            let id = this.resolve_id(&request);
            let data = this.store.lock().get(&id).cloned().unwrap_or_default();
            let session = Session::new(id.clone(), data);

            let result = next.run(request.with_session(session.clone())).await;

            // Save on exit: the store is updated on the failure path too.
            this.store.lock().insert(id.clone(), session.snapshot());

            let response = result?;
            Ok(response.with_header(
                "Set-Cookie",
                format!("{}={}; Path=/; HttpOnly", this.cookie_name, id),
            ))
        })
    }
}
