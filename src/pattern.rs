//! Route template compilation and path matching.
//!
//! A template is split on `/` and each segment becomes one component:
//!
//! - `*` — wildcard
//! - `<name>` — named parameter, binds the corresponding path segment
//! - anything else — literal, compared case-sensitively
//!
//! There is no escaping: a literal segment cannot itself look like `<x>`
//! or `*`.
//!
//! # Wildcard semantics
//!
//! A wildcard is "match and stop": the moment the walk reaches a wildcard
//! component the match succeeds with the parameters bound so far, and both
//! the remaining path segments *and any pattern components after the
//! wildcard* are discarded. `/a/*/b` therefore matches exactly what `/a/*`
//! matches — the trailing `/b` is unreachable. This mirrors the behavior
//! existing route tables rely on; it is kept deliberately rather than
//! requiring the wildcard to be the last component.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled route template.
///
/// Compiled once at registration, matched on every request. Matching is a
/// plain component walk — no backtracking, no allocation beyond the bound
/// parameters.
#[derive(Debug, Clone)]
pub struct PathPattern {
    components: Vec<Component>,
    has_wildcard: bool,
}

impl PathPattern {
    /// Compiles a template string such as `/users/<id>/posts` or `/static/*`.
    pub fn compile(template: &str) -> Self {
        let components: Vec<Component> = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                if segment == "*" {
                    Component::Wildcard
                } else if let Some(name) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                    Component::Param(name.to_owned())
                } else {
                    Component::Literal(segment.to_owned())
                }
            })
            .collect();
        let has_wildcard = components.contains(&Component::Wildcard);
        Self { components, has_wildcard }
    }

    /// Matches a concrete path, returning the bound parameters on success.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // Without a wildcard the segment counts must agree exactly.
        if !self.has_wildcard && segments.len() != self.components.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (index, component) in self.components.iter().enumerate() {
            // Wildcard terminates the walk: everything bound so far wins,
            // everything after — path or pattern — is ignored.
            if let Component::Wildcard = component {
                return Some(params);
            }

            let segment = segments.get(index)?;

            match component {
                Component::Literal(text) => {
                    if text != segment {
                        return None;
                    }
                }
                Component::Param(name) => {
                    params.insert(name.clone(), (*segment).to_owned());
                }
                Component::Wildcard => unreachable!(),
            }
        }

        Some(params)
    }
}
