//! Static schema descriptors for object types.
//!
//! A [`TypeDescriptor`] is the compile-time image of one object type in the
//! database schema: its EdgeQL name and the properties the query generator
//! may reference. Descriptors are declared as `static` tables, usually one
//! per domain type, and handed around as `&'static` references.

use std::fmt;

/// Identifiers the server reserves on every object type. These are never
/// emitted as user shape keys.
pub const RESERVED_PROPERTY_NAMES: &[&str] = &["id", "__type__"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar,
    Link,
    MultiLink,
}

/// One property of an object type.
///
/// `link_target` is a function pointer rather than a direct reference so
/// self-referential types (a `Person` whose `best_friend` is a `Person`)
/// can still be described with plain statics.
#[derive(Clone, Copy)]
pub struct PropertyDescriptor {
    /// The property name on the source-language type.
    pub source_name: &'static str,
    /// The property name in the database schema.
    pub edgedb_name: &'static str,
    pub kind: PropertyKind,
    pub link_target: Option<fn() -> &'static TypeDescriptor>,
    /// The EdgeQL scalar type of the property, for paths where no concrete
    /// value is available to infer it from (the JSON bulk shape).
    pub scalar_type: Option<&'static str>,
    /// Declared as exclusive in the schema.
    pub exclusive: bool,
    /// The server-assigned `id` property.
    pub id: bool,
    /// Excluded from generated shapes.
    pub ignored: bool,
}

impl PropertyDescriptor {
    pub fn target(&self) -> Option<&'static TypeDescriptor> {
        self.link_target.map(|f| f())
    }

    pub fn is_link(&self) -> bool {
        matches!(self.kind, PropertyKind::Link | PropertyKind::MultiLink)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("source_name", &self.source_name)
            .field("edgedb_name", &self.edgedb_name)
            .field("kind", &self.kind)
            .field("exclusive", &self.exclusive)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    /// The type name in the database schema, e.g. `Person` or
    /// `default::Person`.
    pub edgedb_name: &'static str,
    pub properties: &'static [PropertyDescriptor],
}

impl TypeDescriptor {
    pub fn property(&self, source_name: &str) -> Option<&'static PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.source_name == source_name)
    }

    /// Properties that participate in generated shapes: everything except
    /// the id property, ignored properties, and reserved names.
    pub fn shape_properties(&self) -> impl Iterator<Item = &'static PropertyDescriptor> {
        self.properties.iter().filter(|p| {
            !p.id && !p.ignored && !RESERVED_PROPERTY_NAMES.contains(&p.edgedb_name)
        })
    }

    /// Properties declared exclusive on the type itself.
    pub fn exclusive_properties(&self) -> impl Iterator<Item = &'static PropertyDescriptor> {
        self.properties.iter().filter(|p| p.exclusive && !p.id)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.edgedb_name == other.edgedb_name
    }
}

impl Eq for TypeDescriptor {}

#[cfg(test)]
mod tests {
    use super::*;

    static PERSON: TypeDescriptor = TypeDescriptor {
        edgedb_name: "Person",
        properties: &[
            PropertyDescriptor {
                source_name: "id",
                edgedb_name: "id",
                kind: PropertyKind::Scalar,
                link_target: None,
                scalar_type: Some("uuid"),
                exclusive: true,
                id: true,
                ignored: false,
            },
            PropertyDescriptor {
                source_name: "name",
                edgedb_name: "name",
                kind: PropertyKind::Scalar,
                link_target: None,
                scalar_type: Some("str"),
                exclusive: true,
                id: false,
                ignored: false,
            },
            PropertyDescriptor {
                source_name: "best_friend",
                edgedb_name: "best_friend",
                kind: PropertyKind::Link,
                link_target: Some(|| &PERSON),
                scalar_type: None,
                exclusive: false,
                id: false,
                ignored: false,
            },
        ],
    };

    #[test]
    fn test_shape_properties_skip_id() {
        let names: Vec<_> = PERSON.shape_properties().map(|p| p.edgedb_name).collect();
        assert_eq!(names, vec!["name", "best_friend"]);
    }

    #[test]
    fn test_self_referential_link_target() {
        let link = PERSON.property("best_friend").unwrap();
        assert_eq!(link.target().unwrap().edgedb_name, "Person");
    }

    #[test]
    fn test_exclusive_properties_skip_id() {
        let names: Vec<_> = PERSON
            .exclusive_properties()
            .map(|p| p.edgedb_name)
            .collect();
        assert_eq!(names, vec!["name"]);
    }
}
