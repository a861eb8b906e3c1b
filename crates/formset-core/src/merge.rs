//! Merging user data with synthesized defaults.

use crate::value::Value;

/// Fill the gaps in `data` from `defaults`.
///
/// A key that is missing from `data`, or present but `Undefined`, takes the
/// default. Where both sides hold objects the merge recurses; every other
/// value already in `data` wins, arrays included. An `Undefined` root is
/// replaced by the defaults wholesale.
pub fn merge_defaults(data: &mut Value, defaults: &Value) {
    if data.is_undefined() {
        *data = defaults.clone();
        return;
    }
    if let (Value::Object(target), Value::Object(source)) = (data, defaults) {
        for (key, default) in source {
            match target.get_mut(key) {
                Some(existing) => merge_defaults(existing, default),
                None => {
                    target.insert(key.clone(), default.clone());
                }
            }
        }
    }
}

/// Owned form of [`merge_defaults`].
pub fn with_defaults(mut data: Value, defaults: &Value) -> Value {
    merge_defaults(&mut data, defaults);
    data
}

/// Deep merge where `overlay` wins: objects merge key by key, anything else
/// (arrays included) is replaced.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
