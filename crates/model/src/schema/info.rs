//! Schema facts obtained from server introspection.

use crate::schema::descriptor::TypeDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Introspected facts about one object type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Exclusive constraints known to the database. Each entry is the list
    /// of property names covered by one constraint; single-property
    /// constraints are lists of length one.
    pub exclusives: Vec<Vec<String>>,
}

impl ObjectInfo {
    /// All property names participating in any exclusive constraint, in
    /// declaration order, deduplicated.
    pub fn exclusive_property_names(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for constraint in &self.exclusives {
            for name in constraint {
                if !seen.contains(&name.as_str()) {
                    seen.push(name.as_str());
                }
            }
        }
        seen
    }
}

/// The result of one `describe_schema` round-trip, keyed by EdgeQL type
/// name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaInfo {
    types: HashMap<String, ObjectInfo>,
}

impl SchemaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: impl Into<String>, info: ObjectInfo) {
        self.types.insert(type_name.into(), info);
    }

    pub fn by_name(&self, type_name: &str) -> Option<&ObjectInfo> {
        self.types.get(type_name)
    }

    pub fn object(&self, descriptor: &TypeDescriptor) -> Option<&ObjectInfo> {
        self.by_name(descriptor.edgedb_name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_names_dedup_and_order() {
        let info = ObjectInfo {
            exclusives: vec![
                vec!["name".to_string()],
                vec!["name".to_string(), "email".to_string()],
            ],
        };
        assert_eq!(info.exclusive_property_names(), vec!["name", "email"]);
    }
}
