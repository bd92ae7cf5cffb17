//! Right-biased deep merge of definition trees

use serde_json::Value;

/// Merge `patch` over `base` in place
///
/// Mappings merge key by key: keys present in `patch` win, keys only in
/// `base` are kept. Any other value in `patch` (scalar or sequence) replaces
/// the base value wholesale. `null` in `patch` means "not provided" and
/// leaves the base value untouched.
pub fn merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        if !value.is_null() {
                            base.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Non-mutating variant of [`merge`]
pub fn merged(base: &Value, patch: &Value) -> Value {
    let mut out = base.clone();
    merge(&mut out, patch);
    out
}
