//! # Paths: Addressing Nodes in a Data Tree
//!
//! A [`Path`] is an ordered list of [`Segment`]s. On the wire every segment
//! is a string; a segment made only of ASCII digits (without a leading zero)
//! is read as an array index, anything else as an object key. Index segments
//! still resolve against objects by their decimal key, so error trees that
//! key array items by `"0"`, `"1"`, … are addressed by the same paths as the
//! form data they describe.
//!
//! Paths also have a textual form, `items[0].name`, used in flattened error
//! lists and on the command line.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathError;

/// A single step in a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Object key access.
    Key(String),
    /// Array index access.
    Index(usize),
}

impl Segment {
    /// Read a wire segment: numeric-looking strings become indices.
    pub fn parse(raw: &str) -> Self {
        if looks_like_index(raw) {
            if let Ok(index) = raw.parse() {
                return Segment::Index(index);
            }
        }
        Segment::Key(raw.to_owned())
    }

    /// A key segment taken verbatim, even if it looks numeric.
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    /// An index segment.
    pub fn index(index: usize) -> Self {
        Segment::Index(index)
    }

    /// The wire (string) form of this segment.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(k) => Cow::Borrowed(k),
            Segment::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// The array index this segment addresses, if any.
    ///
    /// Numeric-looking keys count as indices so that a verbatim key such as
    /// `Segment::key("2")` still reaches the third array element.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(k) if looks_like_index(k) => k.parse().ok(),
            Segment::Key(_) => None,
        }
    }

    /// Returns true if this is an index segment.
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

fn looks_like_index(raw: &str) -> bool {
    !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'))
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&str> for Segment {
    fn from(raw: &str) -> Self {
        Segment::parse(raw)
    }
}

impl From<String> for Segment {
    fn from(raw: String) -> Self {
        Segment::parse(&raw)
    }
}

impl From<&String> for Segment {
    fn from(raw: &String) -> Self {
        Segment::parse(raw)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Number(u64),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Text(s) => Ok(Segment::parse(&s)),
            Wire::Number(n) => usize::try_from(n)
                .map(Segment::Index)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// An ordered sequence of segments addressing a node in a data tree.
///
/// The empty path addresses the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Segment>);

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Alias for [`Path::root`].
    pub fn new() -> Self {
        Self::root()
    }

    /// Build a path from wire strings.
    pub fn from_strs<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(segments.into_iter().map(|s| Segment::parse(s.as_ref())).collect())
    }

    /// Parse the textual form `a.b[0].c` (`["key"]` quotes unusual keys).
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let err_empty = |offset| PathError::EmptySegment {
            path: text.to_owned(),
            offset,
        };

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut chars = text.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '.' => {
                    if current.is_empty() && !after_bracket {
                        return Err(err_empty(pos));
                    }
                    if !current.is_empty() {
                        segments.push(Segment::parse(&current));
                        current.clear();
                    }
                    if chars.peek().is_none() {
                        return Err(err_empty(pos + 1));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Segment::parse(&current));
                        current.clear();
                    }
                    let (segment, close) = scan_bracket(text, pos)?;
                    segments.push(segment);
                    while chars.peek().is_some_and(|&(p, _)| p <= close) {
                        chars.next();
                    }
                    after_bracket = true;
                }
                _ => {
                    if after_bracket {
                        return Err(PathError::MissingSeparator {
                            path: text.to_owned(),
                            offset: pos,
                        });
                    }
                    current.push(ch);
                }
            }
        }

        if !current.is_empty() {
            segments.push(Segment::parse(&current));
        }
        Ok(Self(segments))
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Iterate over segments.
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.0.iter()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.0.push(segment.into());
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// Builder form of [`Path::child`] for a verbatim key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(Segment::key(key));
        self
    }

    /// Builder form of [`Path::child`] for an index.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Segment::Index(index));
        self
    }

    /// The path without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    /// This path followed by `other`.
    pub fn concat(&self, other: &Path) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Returns true if `prefix` is a leading part of this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Wire segments joined by single spaces; used as a deduplication key.
    pub fn joined(&self) -> String {
        self.to_strings().join(" ")
    }

    /// The wire form: every segment as a string.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|s| s.as_str().into_owned()).collect()
    }
}

/// Read the bracket opened at byte `open`, returning the segment and the byte
/// offset of the closing `]`.
///
/// Quoted keys may contain `]`; inside quotes a backslash escapes the next
/// character.
fn scan_bracket(text: &str, open: usize) -> Result<(Segment, usize), PathError> {
    let unterminated = || PathError::UnterminatedBracket {
        path: text.to_owned(),
        offset: open,
    };
    let invalid = |body: &str| PathError::InvalidBracket {
        path: text.to_owned(),
        segment: body.split(']').next().unwrap_or(body).to_owned(),
    };

    let body = &text[open + 1..];
    let mut chars = body.char_indices();
    match chars.next() {
        Some((_, quote @ ('"' | '\''))) => {
            let mut key = String::new();
            while let Some((i, ch)) = chars.next() {
                if ch == '\\' {
                    let (_, escaped) = chars.next().ok_or_else(unterminated)?;
                    key.push(escaped);
                } else if ch == quote {
                    let close = open + 1 + i + 1;
                    return match text[close..].chars().next() {
                        Some(']') => Ok((Segment::Key(key), close)),
                        Some(_) => Err(invalid(body)),
                        None => Err(unterminated()),
                    };
                } else {
                    key.push(ch);
                }
            }
            Err(unterminated())
        }
        _ => {
            let rel = body.find(']').ok_or_else(unterminated)?;
            let inner = &body[..rel];
            if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(index) = inner.parse() {
                    return Ok((Segment::Index(index), open + 1 + rel));
                }
            }
            Err(invalid(inner))
        }
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty() || looks_like_index(key) || key.contains(['.', '[', ']'])
}

fn escape_quoted(key: &str) -> Cow<'_, str> {
    if !key.contains(['"', '\\']) {
        return Cow::Borrowed(key);
    }
    let mut out = String::with_capacity(key.len() + 2);
    for ch in key.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) if needs_quoting(key) => write!(f, "[\"{}\"]", escape_quoted(key))?,
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        Self::from_strs(segments)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
