//! Per-segment trie.
//!
//! One node per path segment. A node may hold a terminal handler, a sorted
//! middleware sequence, literal children (sorted for binary search) and at
//! most one parameter child. Nodes are created lazily and never removed.
//!
//! ```text
//!                 (root)  [mw: "/"]
//!                    │
//!        ┌───────────┴───────────┐
//!     "items"                 "admin"  [mw: "/admin"]
//!    [GET list]                  │
//!        │                    "stats"
//!      :id                   [GET stats]
//!    [GET show]
//! ```

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::RouteError;
use crate::middleware::{insert_sorted, MiddlewareEntry};
use crate::params::Params;
use crate::types::Handler;

/// Segments kept inline when splitting a request path.
const INLINE_SEGMENTS: usize = 8;

/// One parsed segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this text.
    Literal(String),
    /// Captures any non-empty segment under this name.
    Param(String),
}

impl Segment {
    /// Parses one raw segment. `:name` and `{name}` are parameters.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            Self::Param(name.to_string())
        } else if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Self::Param(name.to_string())
        } else {
            Self::Literal(raw.to_string())
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Param(name) => write!(f, ":{name}"),
        }
    }
}

/// Parses a route pattern or middleware scope into segments.
///
/// Leading and trailing `/` are trimmed; `/` and `""` parse to no segments.
///
/// # Errors
///
/// Returns `RouteError::InvalidPath` for empty segments (`a//b`), empty
/// parameter names and parameter names repeated within one pattern.
pub fn parse_pattern(path: &str) -> Result<Vec<Segment>, RouteError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for raw in trimmed.split('/') {
        if raw.is_empty() {
            return Err(RouteError::invalid_path(path, "empty segment"));
        }
        let segment = Segment::parse(raw);
        if let Segment::Param(name) = &segment {
            if name.is_empty() {
                return Err(RouteError::invalid_path(path, "empty parameter name"));
            }
            let repeated = segments
                .iter()
                .any(|s| matches!(s, Segment::Param(existing) if existing == name));
            if repeated {
                return Err(RouteError::invalid_path(
                    path,
                    format!("parameter '{name}' appears more than once"),
                ));
            }
        }
        segments.push(segment);
    }
    Ok(segments)
}

/// Splits a request path into raw segments.
///
/// Leading and trailing `/` are trimmed first, so `/` yields no segments.
/// Interior empty segments are kept; they never match.
#[must_use]
pub fn split_path(path: &str) -> SmallVec<[&str; INLINE_SEGMENTS]> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        SmallVec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// A node in the route trie.
#[derive(Clone, Default)]
pub(crate) struct Node {
    /// Literal text, parameter name, or empty for a root.
    name: String,

    /// Pattern the handler was registered with.
    pattern: Option<String>,

    handler: Option<Handler>,

    /// Sorted by `(priority, seq)`.
    middleware: Vec<Arc<MiddlewareEntry>>,

    /// Sorted by `name` for binary search.
    literal_children: Vec<Node>,

    param_child: Option<Box<Node>>,
}

/// Outcome of a successful resolution.
pub(crate) struct Resolved<'a> {
    /// Terminal handler.
    pub handler: &'a Handler,
    /// Pattern the handler was registered with.
    pub pattern: &'a str,
    /// Captured parameters.
    pub params: Params,
    /// Middleware of every node from the root to the terminal node, sorted
    /// by `(priority, seq)`.
    pub middleware: SmallVec<[&'a Arc<MiddlewareEntry>; INLINE_SEGMENTS]>,
}

impl Node {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Verifies `segments` can be added below this node without a parameter
    /// name conflict. Does not mutate.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::ParamConflict` naming `path` if a tier already
    /// has a parameter child with a different name.
    pub(crate) fn check(&self, segments: &[Segment], path: &str) -> Result<(), RouteError> {
        let mut node = self;
        for segment in segments {
            let next = match segment {
                Segment::Literal(text) => node.find_literal(text),
                Segment::Param(name) => match node.param_child.as_deref() {
                    Some(child) if child.name != *name => {
                        return Err(RouteError::param_conflict(path, &child.name, name));
                    }
                    other => other,
                },
            };
            match next {
                Some(child) => node = child,
                // Everything below is new, so nothing can conflict.
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Walks `segments`, creating missing nodes, and returns the last one.
    ///
    /// Callers run [`check`](Self::check) first; an existing parameter child
    /// is reused whatever its name.
    pub(crate) fn entry(&mut self, segments: &[Segment]) -> &mut Self {
        let mut node = self;
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.literal_child_mut(text),
                Segment::Param(name) => &mut **node
                    .param_child
                    .get_or_insert_with(|| Box::new(Self::named(name))),
            };
        }
        node
    }

    /// Stores the handler for `pattern`. Returns `false` without replacing
    /// anything if a handler is already present.
    pub(crate) fn set_handler(&mut self, pattern: &str, handler: Handler) -> bool {
        if self.handler.is_some() {
            return false;
        }
        self.pattern = Some(pattern.to_string());
        self.handler = Some(handler);
        true
    }

    /// Attaches a middleware entry at the node `segments` names, creating
    /// nodes as needed.
    pub(crate) fn attach(&mut self, segments: &[Segment], entry: Arc<MiddlewareEntry>) {
        insert_sorted(&mut self.entry(segments).middleware, entry);
    }

    /// Resolves request path segments to a handler.
    ///
    /// Each tier takes the matching literal child if there is one and
    /// commits to it; otherwise the parameter child captures the segment.
    /// A parameter never captures an empty segment.
    #[must_use]
    pub(crate) fn resolve(&self, segments: &[&str]) -> Option<Resolved<'_>> {
        let mut params = Params::new();
        let mut trail: SmallVec<[&Self; INLINE_SEGMENTS]> = SmallVec::new();
        trail.push(self);

        let mut node = self;
        for segment in segments {
            node = match node.find_literal(segment) {
                Some(child) => child,
                None => {
                    let child = node.param_child.as_deref().filter(|_| !segment.is_empty())?;
                    params.push(child.name.as_str(), *segment);
                    child
                }
            };
            trail.push(node);
        }

        let handler = node.handler.as_ref()?;
        let pattern = node.pattern.as_deref().unwrap_or("/");

        let mut middleware: SmallVec<[&Arc<MiddlewareEntry>; INLINE_SEGMENTS]> =
            trail.iter().copied().flat_map(|node| node.middleware.iter()).collect();
        middleware.sort_by_key(|entry| entry.sort_key());

        Some(Resolved {
            handler,
            pattern,
            params,
            middleware,
        })
    }

    fn find_literal(&self, text: &str) -> Option<&Self> {
        self.literal_children
            .binary_search_by(|child| child.name.as_str().cmp(text))
            .ok()
            .map(|i| &self.literal_children[i])
    }

    fn literal_child_mut(&mut self, text: &str) -> &mut Self {
        let index = match self
            .literal_children
            .binary_search_by(|child| child.name.as_str().cmp(text))
        {
            Ok(i) => i,
            Err(i) => {
                self.literal_children.insert(i, Self::named(text));
                i
            }
        };
        &mut self.literal_children[index]
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("middleware", &self.middleware)
            .field("literal_children", &self.literal_children)
            .field("param_child", &self.param_child)
            .finish_non_exhaustive()
    }
}
