//! JSONPath-style path expressions
//!
//! Supported: root `$`, dotted and bracketed member access, `*`, recursive
//! descent `..`, array indices (negative counts from the end), unions and
//! slices with a positive step. Filters and script expressions are rejected.
//!
//! Resolution is eager and yields pointers in document order: object keys in
//! the order they appear, array indices ascending, a node before its
//! descendants.

use std::collections::HashSet;

use dlqr_core::{CoreError, Result};
use serde_json::Value;

use crate::pointer::{JsonPointer, parse_index};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: usize,
    },
    Union(Vec<Selector>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Child(Selector),
    Descendant(Selector),
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    pub fn parse(expression: &str) -> Result<Self> {
        let segments = Parser::new(expression).parse()?;
        Ok(Self {
            source: expression.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every existing location the expression selects in `root`
    pub fn resolve(&self, root: &Value) -> Vec<JsonPointer> {
        let mut current: Vec<(JsonPointer, &Value)> = vec![(JsonPointer::root(), root)];

        for segment in &self.segments {
            let mut next = Vec::new();
            for (pointer, node) in &current {
                match segment {
                    Segment::Child(selector) => select(selector, pointer, node, &mut next),
                    Segment::Descendant(selector) => descend(selector, pointer, node, &mut next),
                }
            }
            current = next;
        }

        let mut seen = HashSet::new();
        current
            .into_iter()
            .map(|(pointer, _)| pointer)
            .filter(|pointer| seen.insert(pointer.clone()))
            .collect()
    }
}

impl std::fmt::Display for PathExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse `expression` and resolve it against `root`
pub fn resolve(root: &Value, expression: &str) -> Result<Vec<JsonPointer>> {
    Ok(PathExpr::parse(expression)?.resolve(root))
}

fn select<'a>(
    selector: &Selector,
    pointer: &JsonPointer,
    node: &'a Value,
    out: &mut Vec<(JsonPointer, &'a Value)>,
) {
    match (selector, node) {
        (Selector::Name(name), Value::Object(map)) => {
            if let Some(child) = map.get(name) {
                out.push((pointer.child(name.as_str()), child));
            }
        }
        (Selector::Name(name), Value::Array(items)) => {
            if let Some(i) = parse_index(name)
                && let Some(child) = items.get(i)
            {
                out.push((pointer.index(i), child));
            }
        }
        (Selector::Index(index), Value::Array(items)) => {
            if let Some(i) = normalize_index(*index, items.len()) {
                out.push((pointer.index(i), &items[i]));
            }
        }
        (Selector::Wildcard, Value::Object(map)) => {
            for (key, child) in map {
                out.push((pointer.child(key.as_str()), child));
            }
        }
        (Selector::Wildcard, Value::Array(items)) => {
            for (i, child) in items.iter().enumerate() {
                out.push((pointer.index(i), child));
            }
        }
        (Selector::Slice { start, end, step }, Value::Array(items)) => {
            let len = items.len() as i64;
            let bound = |value: Option<i64>, default: i64| match value {
                Some(v) if v < 0 => (len + v).max(0),
                Some(v) => v.min(len),
                None => default,
            };
            let from = bound(*start, 0) as usize;
            let to = bound(*end, len) as usize;
            for i in (from..to.max(from)).step_by(*step) {
                out.push((pointer.index(i), &items[i]));
            }
        }
        (Selector::Union(members), _) => {
            let mut picked = Vec::new();
            for member in members {
                select(member, pointer, node, &mut picked);
            }
            sort_by_position(node, &mut picked);
            out.extend(picked);
        }
        _ => {}
    }
}

/// Put children of `node` back in document order
fn sort_by_position(node: &Value, picked: &mut [(JsonPointer, &Value)]) {
    picked.sort_by_cached_key(|(pointer, _)| {
        let last = pointer.split_last().map(|(_, last)| last).unwrap_or_default();
        match node {
            Value::Array(_) => parse_index(last).unwrap_or(usize::MAX),
            Value::Object(map) => map.keys().position(|key| key == last).unwrap_or(usize::MAX),
            _ => usize::MAX,
        }
    });
}

fn descend<'a>(
    selector: &Selector,
    pointer: &JsonPointer,
    node: &'a Value,
    out: &mut Vec<(JsonPointer, &'a Value)>,
) {
    select(selector, pointer, node, out);

    match node {
        Value::Object(map) => {
            for (key, child) in map {
                descend(selector, &pointer.child(key.as_str()), child, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                descend(selector, &pointer.index(i), child, out);
            }
        }
        _ => {}
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { len as i64 + index } else { index };
    (0..len as i64)
        .contains(&resolved)
        .then_some(resolved as usize)
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.trim().chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>> {
        if self.chars.is_empty() {
            return Err(self.error("expression is empty"));
        }

        let mut segments = Vec::new();

        if self.eat('$') {
            if let Some(c) = self.peek()
                && c != '.'
                && c != '['
            {
                return Err(self.error(format!("unexpected '{}' after '$'", c)));
            }
        } else if self.peek().is_some_and(is_name_start) {
            segments.push(Segment::Child(Selector::Name(self.name())));
        }

        while let Some(c) = self.peek() {
            let segment = match c {
                '.' => {
                    self.bump();
                    if self.eat('.') {
                        Segment::Descendant(self.after_descent()?)
                    } else {
                        Segment::Child(self.after_dot()?)
                    }
                }
                '[' => Segment::Child(self.bracket()?),
                other => {
                    return Err(self.error(format!(
                        "unexpected '{}' at position {}",
                        other, self.pos
                    )));
                }
            };
            segments.push(segment);
        }

        Ok(segments)
    }

    fn after_dot(&mut self) -> Result<Selector> {
        match self.peek() {
            Some('*') => {
                self.bump();
                Ok(Selector::Wildcard)
            }
            Some(c) if is_name_start(c) => Ok(Selector::Name(self.name())),
            Some(c) => Err(self.error(format!("expected a member name after '.', found '{}'", c))),
            None => Err(self.error("expected a member name after '.'")),
        }
    }

    fn after_descent(&mut self) -> Result<Selector> {
        match self.peek() {
            Some('[') => self.bracket(),
            Some('*') => {
                self.bump();
                Ok(Selector::Wildcard)
            }
            Some(c) if is_name_start(c) => Ok(Selector::Name(self.name())),
            Some(c) => Err(self.error(format!("expected a member name after '..', found '{}'", c))),
            None => Err(self.error("expected a member name after '..'")),
        }
    }

    fn bracket(&mut self) -> Result<Selector> {
        self.bump();
        self.skip_whitespace();

        match self.peek() {
            Some('?') => return Err(self.error("filter expressions are not supported")),
            Some('(') => return Err(self.error("script expressions are not supported")),
            Some(']') => return Err(self.error("empty brackets")),
            _ => {}
        }

        let mut members = Vec::new();
        loop {
            self.skip_whitespace();
            let member = match self.peek() {
                Some('*') => {
                    self.bump();
                    Selector::Wildcard
                }
                Some(q @ ('\'' | '"')) => Selector::Name(self.quoted(q)?),
                Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.index_or_slice()?,
                Some(c) => return Err(self.error(format!("unexpected '{}' inside brackets", c))),
                None => return Err(self.error("unterminated '['")),
            };
            members.push(member);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(c) => return Err(self.error(format!("expected ',' or ']', found '{}'", c))),
                None => return Err(self.error("unterminated '['")),
            }
        }

        if members.len() == 1 {
            return Ok(members.remove(0));
        }
        if members.contains(&Selector::Wildcard) {
            return Err(self.error("'*' cannot be part of a union"));
        }
        Ok(Selector::Union(members))
    }

    fn index_or_slice(&mut self) -> Result<Selector> {
        let start = self.integer()?;
        if !self.eat(':') {
            return start
                .map(Selector::Index)
                .ok_or_else(|| self.error("expected an array index"));
        }

        self.skip_whitespace();
        let end = self.integer()?;
        let mut step = 1;
        if self.eat(':') {
            self.skip_whitespace();
            if let Some(value) = self.integer()? {
                if value <= 0 {
                    return Err(self.error("slice step must be positive"));
                }
                step = value as usize;
            }
        }

        Ok(Selector::Slice { start, end, step })
    }

    fn integer(&mut self) -> Result<Option<i64>> {
        let begin = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }

        let text: String = self.chars[begin..self.pos].iter().collect();
        match text.as_str() {
            "" => Ok(None),
            "-" => Err(self.error("expected digits after '-'")),
            digits => digits
                .parse()
                .map(Some)
                .map_err(|_| self.error(format!("array index {} is out of range", digits))),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String> {
        self.bump();
        let mut name = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated quoted name")),
                Some('\\') => match self.bump() {
                    Some(escaped) => name.push(escaped),
                    None => return Err(self.error("unterminated quoted name")),
                },
                Some(c) if c == quote => return Ok(name),
                Some(c) => name.push(c),
            }
        }
    }

    fn name(&mut self) -> String {
        let begin = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        self.chars[begin..self.pos].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, reason: impl Into<String>) -> CoreError {
        CoreError::path_syntax(self.expression, reason)
    }
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '.' | '[' | ']' | '\'' | '"' | '(' | ')' | ',')
}

fn is_name_start(c: char) -> bool {
    is_name_char(c) && c != '*'
}
