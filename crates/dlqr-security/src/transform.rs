//! Field transformers applied at resolved pointers

use dlqr_core::{CoreError, HashOptions, MaskOptions, Result};
use serde_json::Value;

use crate::hasher::FieldHasher;
use crate::pointer::{self, JsonPointer};

const DEFAULT_PAD: &str = "*";

/// Mask a scalar, keeping `keep_first`/`keep_last` characters.
///
/// The result never grows: when the kept spans cover the whole value it is
/// returned as-is. `null` passes through. Objects and arrays are rejected.
pub fn mask(value: &Value, options: Option<&MaskOptions>) -> Result<Value> {
    let text = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(_) => return Err(CoreError::Transformer("cannot mask an object".into())),
        Value::Array(_) => return Err(CoreError::Transformer("cannot mask an array".into())),
    };

    if let Some(fixed) = options
        .and_then(|o| o.fixed_replacement.as_deref())
        .filter(|f| !f.is_empty())
    {
        return Ok(Value::String(fixed.to_string()));
    }

    let keep_first = options.and_then(|o| o.keep_first).unwrap_or(0);
    let keep_last = options.and_then(|o| o.keep_last).unwrap_or(0);
    let pad = options
        .and_then(|o| o.pad.as_deref())
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PAD);

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if keep_first.saturating_add(keep_last) >= len {
        return Ok(Value::String(text));
    }

    let gap = len - keep_first - keep_last;
    let mut masked = String::with_capacity(text.len());
    masked.extend(&chars[..keep_first]);
    masked.extend(pad.chars().cycle().take(gap));
    masked.extend(&chars[len - keep_last..]);

    Ok(Value::String(masked))
}

/// Hash the string form of `value`. Strings hash their content, anything
/// else its compact JSON text.
pub fn hash(hasher: &dyn FieldHasher, value: &Value, options: Option<&HashOptions>) -> Value {
    let input = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let defaults = HashOptions::default();
    Value::String(hasher.hash(&input, options.unwrap_or(&defaults)))
}

/// Structurally remove the value at `pointer`
pub fn remove(root: &mut Value, pointer: &JsonPointer) -> Result<Value> {
    if pointer.is_root() {
        return Err(CoreError::Transformer(
            "cannot remove the document root".into(),
        ));
    }
    pointer::delete(root, pointer)
        .ok_or_else(|| CoreError::Transformer(format!("nothing to remove at {}", pointer)))
}
