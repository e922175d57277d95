use serde_json::Value;

/// Body of one inbound event
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Value);

impl Payload {
    /// Text that is valid JSON becomes that value, anything else is kept as
    /// a JSON string
    pub fn parse(line: &str) -> Self {
        match serde_json::from_str(line.trim()) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(line.to_string())),
        }
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
