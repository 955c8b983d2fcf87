//! Path patterns: literal components and named `:param` components.
//!
//! Paths are compared component by component; empty components are ignored,
//! so `/movies`, `/movies/` and `//movies` are the same path.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

use crate::error::RouteError;

/// Captured path parameters (name → percent-decoded value).
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path pattern such as `/movies/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

/// Result of matching a pattern against the front of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    pub params: Params,
    /// The consumed part of the path, normalized (`/movies`).
    pub matched: String,
    /// What is left below the prefix, always starting with `/`.
    pub remainder: String,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if raw.is_empty() {
            return Err(RouteError::EmptyPattern);
        }
        if !raw.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(raw.to_string()));
        }

        let mut segments = Vec::new();
        for component in components(raw) {
            let segment = match component.strip_prefix(':') {
                Some("") => return Err(RouteError::UnnamedParam(raw.to_string())),
                Some(name) if name.contains(':') => {
                    return Err(RouteError::MisplacedParam(raw.to_string()));
                }
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                    if duplicate {
                        return Err(RouteError::DuplicateParam {
                            name: name.to_string(),
                            pattern: raw.to_string(),
                        });
                    }
                    Segment::Param(name.to_string())
                }
                None if component.contains(':') => {
                    return Err(RouteError::MisplacedParam(raw.to_string()));
                }
                None => Segment::Literal(component.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the parameters in this pattern, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match the whole path. Returns the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = components(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        self.capture(&parts)
    }

    /// Match the leading components of the path (mount-point semantics).
    pub fn match_prefix(&self, path: &str) -> Option<PrefixMatch> {
        let parts: Vec<&str> = components(path).collect();
        if parts.len() < self.segments.len() {
            return None;
        }
        let (head, tail) = parts.split_at(self.segments.len());
        let params = self.capture(head)?;

        Some(PrefixMatch {
            params,
            matched: join(head),
            remainder: join(tail),
        })
    }

    fn capture(&self, parts: &[&str]) -> Option<Params> {
        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = percent_decode_str(part).decode_utf8_lossy().into_owned();
                    params.insert(name.clone(), value);
                }
            }
        }
        Some(params)
    }
}

impl core::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

fn join(parts: &[&str]) -> String {
    if parts.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for part in parts {
        out.push('/');
        out.push_str(part);
    }
    out
}
