//! Dynamic scalar values crossing the inspection boundary.

/// A scalar value in the live state graph.
///
/// Numbers are `f64` rather than JSON numbers: a failed numeric coercion
/// during a remote `set` writes NaN, which JSON cannot represent but the
/// live graph can hold. Snapshots render NaN as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum DynValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl DynValue {
    /// Best-effort conversion from a wire value. Structured values are
    /// carried as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DynValue::Null,
            serde_json::Value::Bool(b) => DynValue::Bool(*b),
            serde_json::Value::Number(n) => DynValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => DynValue::Text(s.clone()),
            other => DynValue::Text(other.to_string()),
        }
    }

    /// Render for a snapshot. NaN and infinities become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DynValue::Null => serde_json::Value::Null,
            DynValue::Bool(b) => serde_json::Value::Bool(*b),
            DynValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            DynValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            DynValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DynValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for DynValue {
    fn from(value: f64) -> Self {
        DynValue::Number(value)
    }
}

impl From<bool> for DynValue {
    fn from(value: bool) -> Self {
        DynValue::Bool(value)
    }
}

impl From<&str> for DynValue {
    fn from(value: &str) -> Self {
        DynValue::Text(value.to_string())
    }
}

impl From<String> for DynValue {
    fn from(value: String) -> Self {
        DynValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_scalars() {
        assert_eq!(
            DynValue::from_json(&serde_json::json!(null)),
            DynValue::Null
        );
        assert_eq!(
            DynValue::from_json(&serde_json::json!(true)),
            DynValue::Bool(true)
        );
        assert_eq!(
            DynValue::from_json(&serde_json::json!(1.5)),
            DynValue::Number(1.5)
        );
        assert_eq!(
            DynValue::from_json(&serde_json::json!("hi")),
            DynValue::Text("hi".to_string())
        );
    }

    #[test]
    fn from_json_structured_becomes_text() {
        let value = DynValue::from_json(&serde_json::json!({"a": 1}));
        assert_eq!(value, DynValue::Text(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn nan_renders_as_null() {
        assert_eq!(
            DynValue::Number(f64::NAN).to_json(),
            serde_json::Value::Null
        );
    }
}
