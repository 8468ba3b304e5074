use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Key/value state threaded through an entire run.
///
/// Context variables are readable by instruction functions and tool handlers,
/// but the loop never mutates them in place: handlers receive a snapshot and
/// return updates inside their [`FunctionResult`](crate::tools::FunctionResult),
/// which the loop merges in dispatch order. Per-key merges are total
/// overwrites — the last merge for a key wins.
///
/// # Example
/// ```
/// use swarmkit::ContextVariables;
/// use serde_json::json;
///
/// let mut ctx = ContextVariables::new();
/// ctx.insert("name", json!("James"));
/// ctx.insert("user_id", json!(123));
/// assert_eq!(ctx.get("name"), Some(&json!("James")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextVariables(HashMap<String, Value>);

impl ContextVariables {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Convenience accessor for string-valued keys.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Merges `updates` into this map, overwriting existing keys.
    pub fn merge(&mut self, updates: ContextVariables) {
        for (key, value) in updates.0 {
            self.0.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for ContextVariables {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ContextVariables {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
