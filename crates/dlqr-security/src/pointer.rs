//! Slash-delimited JSON pointers (RFC 6901)
//!
//! Lookups never fail loudly: a missing branch or a step off a scalar is
//! `None`, and writes through a missing parent are silent no-ops.

use std::cmp::Ordering;

use serde_json::Value;

/// A concrete location inside a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `/a/b~1c/0`. Tokens are unescaped; the empty string is the root.
    /// A string without a leading slash is read as a single-level pointer.
    pub fn parse(pointer: &str) -> Self {
        if pointer.is_empty() {
            return Self::root();
        }

        let body = pointer.strip_prefix('/').unwrap_or(pointer);
        Self {
            tokens: body.split('/').map(unescape).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(token);
        next
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// Order by location, token by token, with array indices compared as
    /// numbers. An ancestor sorts before its descendants.
    pub fn cmp_location(&self, other: &Self) -> Ordering {
        for (a, b) in self.tokens.iter().zip(&other.tokens) {
            let order = match (parse_index(a), parse_index(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.cmp(b),
            };
            if order != Ordering::Equal {
                return order;
            }
        }
        self.tokens.len().cmp(&other.tokens.len())
    }

    /// Split into the parent pointer and the last token
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.tokens
            .split_last()
            .map(|(last, parent)| (parent, last.as_str()))
    }
}

impl std::fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl From<&str> for JsonPointer {
    fn from(pointer: &str) -> Self {
        Self::parse(pointer)
    }
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Canonical array index: `0` or digits without a leading zero
pub(crate) fn parse_index(token: &str) -> Option<usize> {
    let canonical = token == "0"
        || (!token.is_empty()
            && !token.starts_with('0')
            && token.bytes().all(|b| b.is_ascii_digit()));
    if canonical { token.parse().ok() } else { None }
}

fn step<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => parse_index(token).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => parse_index(token).and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

fn resolve_mut<'a>(root: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    tokens
        .iter()
        .try_fold(root, |node, token| step_mut(node, token))
}

pub fn get<'a>(root: &'a Value, pointer: &JsonPointer) -> Option<&'a Value> {
    pointer
        .tokens
        .iter()
        .try_fold(root, |node, token| step(node, token))
}

/// Write `value` at `pointer`.
///
/// The parent must exist and be a container. Objects gain or overwrite the
/// key; arrays only accept an in-bounds index. Anything else is a no-op.
/// The root pointer replaces the whole document.
pub fn set(root: &mut Value, pointer: &JsonPointer, value: Value) {
    let Some((parent, last)) = pointer.split_last() else {
        *root = value;
        return;
    };

    match resolve_mut(root, parent) {
        Some(Value::Object(map)) => {
            map.insert(last.to_string(), value);
        }
        Some(Value::Array(items)) => {
            if let Some(slot) = parse_index(last).and_then(|i| items.get_mut(i)) {
                *slot = value;
            }
        }
        _ => {}
    }
}

/// Remove the value at `pointer` and return it.
///
/// Array elements are spliced out so later indices shift down. Object keys
/// are removed keeping the order of the remaining keys. Returns `None`
/// when nothing was removed, including for the root pointer.
pub fn delete(root: &mut Value, pointer: &JsonPointer) -> Option<Value> {
    let (parent, last) = pointer.split_last()?;

    match resolve_mut(root, parent)? {
        Value::Object(map) => map.shift_remove(last),
        Value::Array(items) => {
            let index = parse_index(last).filter(|&i| i < items.len())?;
            Some(items.remove(index))
        }
        _ => None,
    }
}
