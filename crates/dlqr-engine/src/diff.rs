//! Structural diff between the original and redacted documents
//!
//! Display only: nothing consumes a `Delta` to mutate documents.

use dlqr_security::JsonPointer;
use serde_json::{Map, Value, json};

/// Above this many cells the array alignment falls back to positions
const MAX_LCS_CELLS: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Added(Value),
    Removed(Value),
    Modified { old: Value, new: Value },
    /// Changed keys: original key order, then keys only in the new document
    Object(Vec<(String, Delta)>),
    Array(Vec<ArrayChange>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayChange {
    /// `index` into the new array
    Added { index: usize, value: Value },
    /// `index` into the original array
    Removed { index: usize, value: Value },
    /// `index` into the new array
    Nested { index: usize, delta: Delta },
}

/// One flattened change for terminal output
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub pointer: JsonPointer,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Added(Value),
    Removed(Value),
    Modified { old: Value, new: Value },
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ChangeKind::Added(value) => write!(f, "+ {}: {}", self.pointer, value),
            ChangeKind::Removed(value) => write!(f, "- {}: {}", self.pointer, value),
            ChangeKind::Modified { old, new } => {
                write!(f, "~ {}: {} -> {}", self.pointer, old, new)
            }
        }
    }
}

/// `None` when both documents are equal
pub fn diff(original: &Value, redacted: &Value) -> Option<Delta> {
    if original == redacted {
        return None;
    }

    let delta = match (original, redacted) {
        (Value::Object(old), Value::Object(new)) => Delta::Object(diff_objects(old, new)),
        (Value::Array(old), Value::Array(new)) => Delta::Array(diff_arrays(old, new)),
        _ => Delta::Modified {
            old: original.clone(),
            new: redacted.clone(),
        },
    };
    Some(delta)
}

fn diff_objects(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<(String, Delta)> {
    let mut changes = Vec::new();

    for (key, old_value) in old {
        match new.get(key) {
            Some(new_value) => {
                if let Some(delta) = diff(old_value, new_value) {
                    changes.push((key.clone(), delta));
                }
            }
            None => changes.push((key.clone(), Delta::Removed(old_value.clone()))),
        }
    }

    for (key, new_value) in new {
        if !old.contains_key(key) {
            changes.push((key.clone(), Delta::Added(new_value.clone())));
        }
    }

    changes
}

fn diff_arrays(old: &[Value], new: &[Value]) -> Vec<ArrayChange> {
    let prefix = old
        .iter()
        .zip(new)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    // Anchors are (old, new) index pairs of equal elements, relative to the middle
    let mut anchors = common_subsequence(old_mid, new_mid);
    anchors.push((old_mid.len(), new_mid.len()));

    let mut changes = Vec::new();
    let (mut old_at, mut new_at) = (0, 0);
    for (old_anchor, new_anchor) in anchors {
        let removed = old_at..old_anchor;
        let added = new_at..new_anchor;
        let paired = removed.len().min(added.len());

        for k in 0..paired {
            let (o, n) = (old_at + k, new_at + k);
            let (old_value, new_value) = (&old_mid[o], &new_mid[n]);
            if same_container_kind(old_value, new_value) {
                if let Some(delta) = diff(old_value, new_value) {
                    changes.push(ArrayChange::Nested {
                        index: prefix + n,
                        delta,
                    });
                }
            } else {
                changes.push(ArrayChange::Removed {
                    index: prefix + o,
                    value: old_value.clone(),
                });
                changes.push(ArrayChange::Added {
                    index: prefix + n,
                    value: new_value.clone(),
                });
            }
        }
        for o in old_at + paired..old_anchor {
            changes.push(ArrayChange::Removed {
                index: prefix + o,
                value: old_mid[o].clone(),
            });
        }
        for n in new_at + paired..new_anchor {
            changes.push(ArrayChange::Added {
                index: prefix + n,
                value: new_mid[n].clone(),
            });
        }

        old_at = old_anchor + 1;
        new_at = new_anchor + 1;
    }

    changes
}

fn same_container_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}

/// Longest common subsequence by equality, as ascending index pairs
fn common_subsequence(old: &[Value], new: &[Value]) -> Vec<(usize, usize)> {
    let (n, m) = (old.len(), new.len());
    if n == 0 || m == 0 || n.saturating_mul(m) > MAX_LCS_CELLS {
        return Vec::new();
    }

    // lengths[i][j] = LCS of old[i..] and new[j..]
    let mut lengths = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if old[i] == new[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

impl Delta {
    /// Render in the jsondiffpatch delta format
    pub fn to_json(&self) -> Value {
        match self {
            Delta::Added(value) => json!([value]),
            Delta::Removed(value) => json!([value, 0, 0]),
            Delta::Modified { old, new } => json!([old, new]),
            Delta::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, delta)| (key.clone(), delta.to_json()))
                    .collect(),
            ),
            Delta::Array(changes) => {
                let mut map = Map::new();
                map.insert("_t".to_string(), json!("a"));
                for change in changes {
                    match change {
                        ArrayChange::Added { index, value } => {
                            map.insert(index.to_string(), json!([value]));
                        }
                        ArrayChange::Removed { index, value } => {
                            map.insert(format!("_{}", index), json!([value, 0, 0]));
                        }
                        ArrayChange::Nested { index, delta } => {
                            map.insert(index.to_string(), delta.to_json());
                        }
                    }
                }
                Value::Object(map)
            }
        }
    }

    /// Flatten into one row per changed location
    pub fn changes(&self) -> Vec<Change> {
        let mut out = Vec::new();
        self.collect(JsonPointer::root(), &mut out);
        out
    }

    fn collect(&self, at: JsonPointer, out: &mut Vec<Change>) {
        let kind = match self {
            Delta::Added(value) => ChangeKind::Added(value.clone()),
            Delta::Removed(value) => ChangeKind::Removed(value.clone()),
            Delta::Modified { old, new } => ChangeKind::Modified {
                old: old.clone(),
                new: new.clone(),
            },
            Delta::Object(entries) => {
                for (key, delta) in entries {
                    delta.collect(at.child(key.as_str()), out);
                }
                return;
            }
            Delta::Array(changes) => {
                for change in changes {
                    match change {
                        ArrayChange::Added { index, value } => out.push(Change {
                            pointer: at.index(*index),
                            kind: ChangeKind::Added(value.clone()),
                        }),
                        ArrayChange::Removed { index, value } => out.push(Change {
                            pointer: at.index(*index),
                            kind: ChangeKind::Removed(value.clone()),
                        }),
                        ArrayChange::Nested { index, delta } => {
                            delta.collect(at.index(*index), out)
                        }
                    }
                }
                return;
            }
        };
        out.push(Change { pointer: at, kind });
    }
}
