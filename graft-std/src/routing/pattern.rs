//! Ant-style URL patterns.
//!
//! A pattern is a `/`-separated sequence of segments:
//!
//! | Segment | Matches |
//! |---------|---------|
//! | `users` | exactly `users` |
//! | `*`     | any single segment |
//! | `*.css` | any single segment with that shape (`*` within a segment) |
//! | `**`    | zero or more segments |
//!
//! Empty segments are ignored on both sides, so `/a//b/` matches `/a/b`.

use graft_core::PatternError;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Glob(String),
    Any,
    AnyDepth,
}

impl Segment {
    fn parse(raw: &str, pattern: &str) -> Result<Self, PatternError> {
        match raw {
            "*" => Ok(Segment::Any),
            "**" => Ok(Segment::AnyDepth),
            _ if raw.contains("**") => Err(PatternError::EmbeddedDoubleWildcard(pattern.into())),
            _ if raw.contains('*') => Ok(Segment::Glob(raw.to_owned())),
            _ => Ok(Segment::Literal(raw.to_owned())),
        }
    }

    fn matches(&self, part: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == part,
            Segment::Glob(glob) => glob_match(glob, part),
            Segment::Any => true,
            // Handled by `match_segments`.
            Segment::AnyDepth => true,
        }
    }
}

/// A compiled URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_owned()));
        }
        let segments = split(raw)
            .map(|segment| Segment::parse(segment, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        match_segments(&self.segments, &parts)
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A set of include and exclude patterns restricting where an interceptor
/// applies. A path is in scope when it matches at least one include pattern
/// and no exclude pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathScope {
    include: Vec<PathPattern>,
    exclude: Vec<PathPattern>,
}

impl Default for PathScope {
    fn default() -> Self {
        Self::all()
    }
}

impl PathScope {
    /// A scope covering every path (`/**`).
    pub fn all() -> Self {
        Self {
            include: vec![PathPattern {
                raw: "/**".to_owned(),
                segments: vec![Segment::AnyDepth],
            }],
            exclude: Vec::new(),
        }
    }

    /// A scope with a single include pattern and no excludes.
    pub fn including(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            include: vec![PathPattern::parse(pattern)?],
            exclude: Vec::new(),
        })
    }

    /// Build a scope from include and exclude patterns.
    pub fn new<I, X>(include: I, exclude: X) -> Result<Self, PatternError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        X: IntoIterator,
        X::Item: AsRef<str>,
    {
        Ok(Self {
            include: include
                .into_iter()
                .map(|p| PathPattern::parse(p.as_ref()))
                .collect::<Result<_, _>>()?,
            exclude: exclude
                .into_iter()
                .map(|p| PathPattern::parse(p.as_ref()))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Whether `path` is in scope.
    pub fn matches(&self, path: &str) -> bool {
        self.include.iter().any(|p| p.matches(path)) && !self.exclude.iter().any(|p| p.matches(path))
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn match_segments(pattern: &[Segment], parts: &[&str]) -> bool {
    match pattern.split_first() {
        None => parts.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((segment, rest)) => match parts.split_first() {
            Some((part, tail)) => segment.matches(part) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn glob_match(glob: &str, text: &str) -> bool {
    match glob.split_once('*') {
        None => glob == text,
        Some((head, tail)) => {
            let Some(rest) = text.strip_prefix(head) else {
                return false;
            };
            (0..=rest.len())
                .filter(|&i| rest.is_char_boundary(i))
                .any(|i| glob_match(tail, &rest[i..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(raw: &str) -> PathPattern {
        PathPattern::parse(raw).unwrap()
    }

    #[test]
    fn test_literal_match() {
        let p = pattern("/evilcontroller");
        assert!(p.matches("/evilcontroller"));
        assert!(p.matches("/evilcontroller/"));
        assert!(!p.matches("/evilcontroller/x"));
        assert!(!p.matches("/"));
    }

    #[test]
    fn test_single_wildcard() {
        let p = pattern("/users/*/profile");
        assert!(p.matches("/users/42/profile"));
        assert!(!p.matches("/users/profile"));
        assert!(!p.matches("/users/1/2/profile"));
    }

    #[test]
    fn test_any_depth() {
        let p = pattern("/intercept/**");
        assert!(p.matches("/intercept"));
        assert!(p.matches("/intercept/ping"));
        assert!(p.matches("/intercept/a/b/c"));
        assert!(!p.matches("/other/ping"));

        let all = pattern("/**");
        assert!(all.matches("/"));
        assert!(all.matches("/any/path"));
    }

    #[test]
    fn test_glob_segment() {
        let p = pattern("/static/*.css");
        assert!(p.matches("/static/site.css"));
        assert!(!p.matches("/static/site.js"));
    }

    #[test]
    fn test_root_pattern() {
        let p = pattern("/");
        assert!(p.matches("/"));
        assert!(!p.matches("/x"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(
            PathPattern::parse("inject"),
            Err(PatternError::MissingLeadingSlash("inject".into()))
        );
        assert!(matches!(
            PathPattern::parse("/a/b**"),
            Err(PatternError::EmbeddedDoubleWildcard(_))
        ));
    }

    #[test]
    fn test_scope_excludes() {
        let scope = PathScope::new(["/**"], ["/css/**", "/js/**", "/images/**"]).unwrap();
        assert!(scope.matches("/login"));
        assert!(scope.matches("/"));
        assert!(!scope.matches("/css/site.css"));
        assert!(!scope.matches("/images/a/b.png"));
    }

    #[test]
    fn test_default_scope_is_everything() {
        assert!(PathScope::default().matches("/deep/nested/path"));
    }
}
