//! CSRF protection.
//!
//! State-changing requests must echo a token the server previously issued
//! and stored in the session. Safe methods (GET, HEAD, OPTIONS, TRACE) skip
//! the check entirely.
//!
//! Token issuance is a separate operation from validation:
//! [`CsrfProtection::generate_token`] mints a token and records its issue
//! time in an in-memory cache independent of any session — the caller is
//! responsible for writing the token into the session under the configured
//! key. Cache entries older than 24 hours are pruned lazily, each time a new
//! token is generated.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Default request header carrying the token.
pub const DEFAULT_HEADER_NAME: &str = "X-CSRF-Token";

/// Default session key under which the expected token is stored.
pub const DEFAULT_SESSION_KEY: &str = "csrftoken";

const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// CSRF validation middleware and token issuer.
///
/// Clone it to keep a handle for issuing tokens from handlers while the
/// middleware list owns another clone — all clones share one token cache.
#[derive(Clone)]
pub struct CsrfProtection {
    header_name: String,
    session_key: String,
    tokens: Arc<Mutex<HashMap<String, Instant>>>,
}

impl CsrfProtection {
    /// CSRF protection with [`DEFAULT_HEADER_NAME`] and [`DEFAULT_SESSION_KEY`].
    pub fn new() -> Self {
        Self::with_names(DEFAULT_HEADER_NAME, DEFAULT_SESSION_KEY)
    }

    /// CSRF protection with a custom header name and session key.
    pub fn with_names(header_name: impl Into<String>, session_key: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
            session_key: session_key.into(),
            tokens: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Mints a new opaque token and records its issue time.
    ///
    /// Prunes cache entries older than 24 hours as a side effect. The token
    /// is *not* written into any session — store it yourself:
    ///
    /// ```rust,ignore
    /// let token = csrf.generate_token();
    /// req.session().unwrap().insert("csrftoken", token.clone());
    /// ```
    pub fn generate_token(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut tokens = self.tokens.lock();
        tokens.insert(token.clone(), now);
        tokens.retain(|_, issued| now.duration_since(*issued) < TOKEN_TTL);

        token
    }

    #[cfg(test)]
    fn cached_token_count(&self) -> usize {
        self.tokens.lock().len()
    }
}

impl Default for CsrfProtection {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for CsrfProtection {
    fn handle(&self, request: Request, next: Next) -> BoxFuture {
        let this = self.clone();
        Box::pin(async move {
            if request.method().is_safe() {
                return next.run(request).await;
            }

            let session = request
                .session()
                .ok_or_else(|| Error::InvalidRequest("No session available".to_owned()))?;

            let supplied = request.header(&this.header_name).unwrap_or("");
            let stored = session
                .get(&this.session_key)
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default();

            if stored.is_empty() || supplied != stored {
                return Err(Error::InvalidRequest(
                    "CSRF token missing or invalid".to_owned(),
                ));
            }

            next.run(request).await
        })
    }
}
