//! Shared builder state: query variables, globals, and sub-queries.

use crate::error::QueryError;
use model::{core::value::Value, schema::info::SchemaInfo, schema::object::RefId};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use std::{fmt, sync::Arc};

/// Returns an opaque identifier usable as a variable or global name.
///
/// Names start with a lowercase letter so they are always valid EdgeQL
/// identifiers. Uniqueness within a builder is enforced by the caller
/// re-rolling on collision; with 12 random characters a collision is
/// effectively unreachable.
pub fn generate_random_variable_name() -> String {
    let mut rng = thread_rng();
    let first = char::from(rng.gen_range(b'a'..=b'z'));
    let rest: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(char::from)
        .collect();
    format!("{first}{rest}")
}

/// Insertion-ordered mapping from variable name to bound value.
///
/// The emitted query references every entry as `<type>$name`; the map is
/// handed to the server alongside the query text.
#[derive(Debug, Clone, Default)]
pub struct QueryVariables {
    entries: Vec<(String, Value)>,
}

impl QueryVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` under a fresh random name and returns the name.
    pub fn add(&mut self, value: Value) -> String {
        let name = loop {
            let candidate = generate_random_variable_name();
            if !self.contains(&candidate) {
                break candidate;
            }
        };
        self.entries.push((name.clone(), value));
        name
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug_assert!(!self.contains(&name), "duplicate variable name {name}");
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type DeferredFn = dyn Fn(&SchemaInfo) -> Result<String, QueryError> + Send + Sync;

/// A sub-expression destined for the `with` prelude.
///
/// `Ready` sub-queries carry their final text. `Deferred` ones need schema
/// facts that only introspection can supply and are materialized right
/// before the query is emitted.
#[derive(Clone)]
pub enum SubQuery {
    Ready(String),
    Deferred(Arc<DeferredFn>),
}

impl SubQuery {
    pub fn deferred(
        build: impl Fn(&SchemaInfo) -> Result<String, QueryError> + Send + Sync + 'static,
    ) -> Self {
        SubQuery::Deferred(Arc::new(build))
    }

    pub fn requires_introspection(&self) -> bool {
        matches!(self, SubQuery::Deferred(_))
    }

    pub fn materialize(&self, schema: Option<&SchemaInfo>) -> Result<String, QueryError> {
        match self {
            SubQuery::Ready(text) => Ok(text.clone()),
            SubQuery::Deferred(build) => {
                let schema = schema.ok_or(QueryError::SchemaRequired)?;
                build(schema)
            }
        }
    }
}

impl fmt::Debug for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubQuery::Ready(text) => f.debug_tuple("Ready").field(text).finish(),
            SubQuery::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub sub_query: SubQuery,
    /// Identity of the object this global stands in for, when there is
    /// one. Globals with equal references collapse into a single entry.
    pub reference: Option<RefId>,
}

/// Insertion-ordered set of globals emitted in the `with` prelude.
#[derive(Debug, Clone, Default)]
pub struct QueryGlobals {
    entries: Vec<Global>,
}

impl QueryGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sub_query` under a fresh name, deduplicating by
    /// `reference`: if a global for the same object already exists, its
    /// name is returned and the new sub-query is dropped. Deduplicated
    /// globals keep the position of their first insertion.
    pub fn get_or_add(&mut self, reference: Option<RefId>, sub_query: SubQuery) -> String {
        if let Some(id) = reference {
            if let Some(existing) = self.entries.iter().find(|g| g.reference == Some(id)) {
                return existing.name.clone();
            }
        }
        let name = generate_random_variable_name();
        self.entries.push(Global {
            name: name.clone(),
            sub_query,
            reference,
        });
        name
    }

    pub fn add_named(
        &mut self,
        name: impl Into<String>,
        sub_query: SubQuery,
        reference: Option<RefId>,
    ) -> String {
        let name = name.into();
        debug_assert!(
            !self.entries.iter().any(|g| g.name == name),
            "duplicate global name {name}"
        );
        self.entries.push(Global {
            name: name.clone(),
            sub_query,
            reference,
        });
        name
    }

    pub fn get(&self, name: &str) -> Option<&Global> {
        self.entries.iter().find(|g| g.name == name)
    }

    pub fn find_reference(&self, reference: RefId) -> Option<&Global> {
        self.entries.iter().find(|g| g.reference == Some(reference))
    }

    pub fn requires_introspection(&self) -> bool {
        self.entries
            .iter()
            .any(|g| g.sub_query.requires_introspection())
    }

    /// Resolves every deferred sub-query against the introspected schema.
    pub fn materialize(&mut self, schema: Option<&SchemaInfo>) -> Result<(), QueryError> {
        for global in &mut self.entries {
            if global.sub_query.requires_introspection() {
                let text = global.sub_query.materialize(schema)?;
                global.sub_query = SubQuery::Ready(text);
            }
        }
        Ok(())
    }

    /// Renders the prelude body: `name := (…), name := (…)`. Every entry
    /// must already be materialized.
    pub fn render_prelude(&self) -> Result<String, QueryError> {
        let mut parts = Vec::with_capacity(self.entries.len());
        for global in &self.entries {
            match &global.sub_query {
                SubQuery::Ready(text) => parts.push(format!("{} := ({})", global.name, text)),
                SubQuery::Deferred(_) => return Err(QueryError::SchemaRequired),
            }
        }
        Ok(parts.join(", "))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Global> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_names_are_unique() {
        let mut vars = QueryVariables::new();
        let a = vars.add(Value::from(1i64));
        let b = vars.add(Value::from(2i64));
        assert_ne!(a, b);
        assert_eq!(vars.get(&a), Some(&Value::Int64(1)));
        assert_eq!(vars.get(&b), Some(&Value::Int64(2)));
    }

    #[test]
    fn test_generated_names_start_with_letter() {
        for _ in 0..64 {
            let name = generate_random_variable_name();
            assert!(name.chars().next().unwrap().is_ascii_lowercase());
            assert_eq!(name.len(), 12);
        }
    }

    #[test]
    fn test_globals_dedup_by_reference() {
        use model::schema::object::{ref_id, SchemaObject};
        use model::schema::descriptor::TypeDescriptor;

        struct Dummy;
        static DUMMY: TypeDescriptor = TypeDescriptor {
            edgedb_name: "Dummy",
            properties: &[],
        };
        impl SchemaObject for Dummy {
            fn descriptor(&self) -> &'static TypeDescriptor {
                &DUMMY
            }
            fn property(
                &self,
                _: &str,
            ) -> Option<model::schema::object::PropertyValue<'_>> {
                None
            }
        }

        let obj = Dummy;
        let id = ref_id(&obj);

        let mut globals = QueryGlobals::new();
        let first = globals.get_or_add(Some(id), SubQuery::Ready("select 1".to_string()));
        let second = globals.get_or_add(Some(id), SubQuery::Ready("select 2".to_string()));
        assert_eq!(first, second);
        assert_eq!(globals.len(), 1);
    }

    #[test]
    fn test_deferred_materialize_requires_schema() {
        let sub = SubQuery::deferred(|_| Ok("insert X".to_string()));
        assert!(sub.requires_introspection());
        assert!(matches!(
            sub.materialize(None),
            Err(QueryError::SchemaRequired)
        ));

        let schema = SchemaInfo::new();
        assert_eq!(sub.materialize(Some(&schema)).unwrap(), "insert X");
    }

    #[test]
    fn test_prelude_rendering() {
        let mut globals = QueryGlobals::new();
        globals.add_named("a", SubQuery::Ready("select 1".to_string()), None);
        globals.add_named("b", SubQuery::Ready("select 2".to_string()), None);
        assert_eq!(
            globals.render_prelude().unwrap(),
            "a := (select 1), b := (select 2)"
        );
    }
}
