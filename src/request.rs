//! Incoming HTTP request type.
//!
//! A [`Request`] is assembled once from transport events and then treated as
//! an immutable value. The two exceptions are made explicit: the dispatch
//! core attaches path parameters after the route match, and the session
//! middleware produces a new request carrying the session via
//! [`Request::with_session`]. No two pipeline stages ever mutate the same
//! request concurrently.

use std::collections::HashMap;

use bytes::Bytes;

use crate::method::Method;
use crate::session::Session;

/// An incoming HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
    session: Option<Session>,
}

impl Request {
    /// Builds a request from its transport-level parts.
    ///
    /// The query string is stripped from `target` and parsed exactly once,
    /// splitting on `&` then `=`. A duplicated key keeps its last occurrence.
    /// Header names keep their wire spelling; lookups via [`Request::header`]
    /// are case-insensitive.
    pub fn new(
        method: Method,
        target: &str,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (target, None),
        };

        let mut query_params = HashMap::new();
        if let Some(query) = query {
            for pair in query.split('&') {
                if let Some((key, value)) = pair.split_once('=') {
                    query_params.insert(key.to_owned(), value.to_owned());
                }
            }
        }

        Self {
            method,
            path: path.to_owned(),
            headers,
            body,
            path_params: HashMap::new(),
            query_params,
            session: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The request path with the query string already stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request body. `None` when the transport delivered no body bytes.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns a named path parameter bound by the route match.
    ///
    /// For a route `/users/<id>`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Returns a query-string parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// The session attached by the session middleware, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Produces a new request with `session` attached.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub(crate) fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(target: &str) -> Request {
        Request::new(Method::Get, target, HashMap::new(), None)
    }

    #[test]
    fn query_string_is_stripped_from_path() {
        let req = get("/search?q=rust");
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query("q"), Some("rust"));
    }

    #[test]
    fn duplicate_query_key_keeps_last_occurrence() {
        let req = get("/search?q=first&q=second");
        assert_eq!(req.query("q"), Some("second"));
    }

    #[test]
    fn pair_without_equals_is_dropped() {
        let req = get("/search?flag&q=x");
        assert_eq!(req.query("flag"), None);
        assert_eq!(req.query("q"), Some("x"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_owned(), "text/plain".to_owned());
        let req = Request::new(Method::Get, "/", headers, None);
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn no_query_string_means_empty_params() {
        let req = get("/plain");
        assert_eq!(req.path(), "/plain");
        assert_eq!(req.query("anything"), None);
    }
}
