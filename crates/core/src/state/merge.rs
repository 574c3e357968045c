use serde_json::Value;

/// Check whether a value is record shaped (a map of named fields)
pub fn is_record(value: &Value) -> bool {
    value.is_object()
}

/// Combine the current state with a patch
///
/// Two records merge shallowly: patch fields override, the other fields are
/// kept as they are. Any other combination replaces the state with the patch.
pub fn merge_values(current: Value, patch: Value) -> Value {
    match (current, patch) {
        (Value::Object(mut fields), Value::Object(patch)) => {
            fields.extend(patch);
            Value::Object(fields)
        }
        (_, patch) => patch,
    }
}
