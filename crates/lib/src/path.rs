//! Dotted-path parsing, nesting, and extraction over JSON values.
//!
//! A path string addresses a nested field inside one top-level store key:
//! the first segment names the key, the remaining segments walk the value
//! stored under it. Splitting happens on `.` and on bracket indices, so
//! `servers[0].host` and `servers.0.host` address the same field.
//!
//! Structural names (key lists and key/default maps) never pass through this
//! module; they address top-level keys directly.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use storebind_lib::path::{build_nested, extract, to_segments};
//!
//! let segments = to_segments("user.profile.theme");
//! let nested = build_nested(&segments, json!("dark"));
//! assert_eq!(nested, json!({"user": {"profile": {"theme": "dark"}}}));
//! assert_eq!(extract(&nested, &segments), Some(&json!("dark")));
//! ```

use serde_json::{Map, Value};

/// Split a path string into its ordered, non-empty segments.
///
/// Accepted syntax:
/// - `a.b.c` - dot-delimited segments
/// - `a[0].b` - bracket indices (`a`, `0`, `b`)
/// - `a['x.y']` / `a["x.y"]` - quoted bracket keys, which may contain dots
///
/// Empty segments (leading/trailing/doubled dots) are dropped, so an empty
/// input yields an empty sequence. The splitter is lenient: an unclosed
/// bracket consumes the rest of the input as one segment.
pub fn to_segments(path: &str) -> Vec<String> {
  let mut segments = Vec::new();
  let mut current = String::new();
  let mut chars = path.chars().peekable();

  while let Some(ch) = chars.next() {
    match ch {
      '.' => {
        if !current.is_empty() {
          segments.push(std::mem::take(&mut current));
        }
      }
      '[' => {
        if !current.is_empty() {
          segments.push(std::mem::take(&mut current));
        }

        // Quoted keys keep their content verbatim, including dots
        let quote = match chars.peek() {
          Some(&q @ ('\'' | '"')) => {
            chars.next();
            Some(q)
          }
          _ => None,
        };

        let mut inner = String::new();
        while let Some(c) = chars.next() {
          match quote {
            Some(q) if c == q => {
              // Consume the closing bracket if present
              if chars.peek() == Some(&']') {
                chars.next();
              }
              break;
            }
            None if c == ']' => break,
            _ => inner.push(c),
          }
        }

        if !inner.is_empty() {
          segments.push(inner);
        }
      }
      _ => current.push(ch),
    }
  }

  if !current.is_empty() {
    segments.push(current);
  }

  segments
}

/// Build a nested mapping that places `terminal` at the given path.
///
/// Each non-terminal segment becomes a single-key mapping wrapping the next
/// node. The build always starts from an empty mapping: nothing previously
/// stored along the path is merged in. With no segments the result is the
/// empty mapping and `terminal` is discarded.
pub fn build_nested(segments: &[String], terminal: Value) -> Value {
  let Some((last, rest)) = segments.split_last() else {
    return Value::Object(Map::new());
  };

  let mut node = Map::new();
  node.insert(last.clone(), terminal);
  let mut acc = Value::Object(node);

  for segment in rest.iter().rev() {
    let mut outer = Map::new();
    outer.insert(segment.clone(), acc);
    acc = Value::Object(outer);
  }

  acc
}

/// Walk `root` one segment at a time and return the value at the full path.
///
/// Mappings are indexed by key, arrays by numeric segment. Returns `None` as
/// soon as any intermediate node is absent or cannot be indexed, and for an
/// empty segment list. The entire path is always consumed before the leaf is
/// returned; a partial walk never yields an intermediate node.
pub fn extract<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
  if segments.is_empty() {
    return None;
  }

  let mut node = root;
  for segment in segments {
    node = match node {
      Value::Object(map) => map.get(segment)?,
      Value::Array(items) => {
        let index: usize = segment.parse().ok()?;
        items.get(index)?
      }
      _ => return None,
    };
  }

  Some(node)
}
