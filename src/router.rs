//! The ordered route table.
//!
//! Registration appends; lookup scans in registration order and the first
//! entry whose method and pattern both match wins. There is no
//! specificity-based reordering: registering `/users/<id>` *after* a
//! `/users/*` catch-all means the catch-all shadows it. That trade keeps
//! lookup semantics trivially predictable — the table reads top to bottom,
//! like the source file that built it.
//!
//! The table is append-only: it is built once at startup, then read
//! concurrently by every connection without synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::pattern::PathPattern;

struct RouteEntry {
    method: Method,
    pattern: PathPattern,
    handler: BoxedHandler,
}

/// The application route table.
#[derive(Default)]
pub struct Router {
    routes: Vec<RouteEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends an entry for a method + template pair.
    ///
    /// Templates use `<name>` for parameters and `*` for a wildcard — see
    /// [`PathPattern`] for matching semantics.
    pub fn register(&mut self, method: Method, template: &str, handler: impl Handler) {
        self.routes.push(RouteEntry {
            method,
            pattern: PathPattern::compile(template),
            handler: handler.into_boxed_handler(),
        });
    }

    /// First-match lookup in registration order.
    ///
    /// Returns the matched handler and the path parameters its pattern bound,
    /// or `None` when no entry matches.
    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        self.routes.iter().find_map(|route| {
            if route.method != method {
                return None;
            }
            route
                .pattern
                .matches(path)
                .map(|params| (Arc::clone(&route.handler), params))
        })
    }
}
