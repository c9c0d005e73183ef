//! Route patterns and fixed-arity segment matching.
//!
//! A pattern is split on `/`. A segment starting with `:` is a named
//! parameter and binds whatever occupies that position in the request path;
//! every other segment must match byte for byte. There is no wildcard or
//! catch-all: a path only matches a pattern with the same segment count.

use std::collections::HashMap;

/// Parameters extracted from a matched path, keyed by name.
pub type Params = HashMap<String, String>;

#[derive(Clone, Debug)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern such as `/users/:id/posts`.
#[derive(Clone, Debug)]
pub(crate) struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(s.to_owned()),
            })
            .collect();
        Self { raw: raw.to_owned(), segments }
    }

    /// The pattern exactly as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `true` if at least one segment is a `:param`.
    pub fn has_params(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// Matches `path` against this pattern, returning the bound parameters.
    ///
    /// Segments are compared pairwise and the first mismatching literal ends
    /// the match. A parameter name that appears twice keeps the last value.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let mut params = Params::new();
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_owned());
                }
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
            }
        }

        // Path has more segments than the pattern.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Structural equality: same arity, parameters in the same positions and
/// identical literals. Parameter names are ignored, so `/users/:id` equals
/// `/users/:uid`.
impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Param(_), Segment::Param(_)) => true,
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                _ => false,
            })
    }
}

impl Eq for Pattern {}
