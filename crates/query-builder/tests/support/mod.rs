//! Shared test domain: descriptor tables, hand-written reflection impls,
//! and a canned schema provider.

use async_trait::async_trait;
use model::core::value::Value;
use model::schema::descriptor::{PropertyDescriptor, PropertyKind, TypeDescriptor};
use model::schema::info::{ObjectInfo, SchemaInfo};
use model::schema::object::{PropertyValue, SchemaObject};
use query_builder::{QueryError, SchemaProvider};
use uuid::Uuid;

pub static PERSON: TypeDescriptor = TypeDescriptor {
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
            source_name: "age",
            edgedb_name: "age",
            kind: PropertyKind::Scalar,
            link_target: None,
            scalar_type: Some("int64"),
            exclusive: false,
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

#[derive(Debug, Clone, Default)]
pub struct Person {
    pub id: Option<Uuid>,
    pub name: String,
    pub age: Option<i64>,
    pub best_friend: Option<Box<Person>>,
}

impl Person {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl SchemaObject for Person {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &PERSON
    }

    fn property(&self, source_name: &str) -> Option<PropertyValue<'_>> {
        match source_name {
            "name" => Some(PropertyValue::Scalar(Value::from(self.name.clone()))),
            "age" => Some(PropertyValue::Scalar(
                self.age.map(Value::from).unwrap_or(Value::Nothing),
            )),
            "best_friend" => Some(PropertyValue::Link(
                self.best_friend
                    .as_deref()
                    .map(|p| p as &dyn SchemaObject),
            )),
            _ => None,
        }
    }

    fn object_id(&self) -> Option<Uuid> {
        self.id
    }
}

pub static POST: TypeDescriptor = TypeDescriptor {
    edgedb_name: "Post",
    properties: &[
        PropertyDescriptor {
            source_name: "title",
            edgedb_name: "title",
            kind: PropertyKind::Scalar,
            link_target: None,
            scalar_type: Some("str"),
            exclusive: false,
            id: false,
            ignored: false,
        },
        PropertyDescriptor {
            source_name: "author",
            edgedb_name: "author",
            kind: PropertyKind::Link,
            link_target: Some(|| &PERSON),
            scalar_type: None,
            exclusive: false,
            id: false,
            ignored: false,
        },
    ],
};

#[derive(Debug, Clone, Default)]
pub struct Post {
    pub title: String,
    pub author: Option<Person>,
}

impl SchemaObject for Post {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &POST
    }

    fn property(&self, source_name: &str) -> Option<PropertyValue<'_>> {
        match source_name {
            "title" => Some(PropertyValue::Scalar(Value::from(self.title.clone()))),
            "author" => Some(PropertyValue::Link(
                self.author.as_ref().map(|p| p as &dyn SchemaObject),
            )),
            _ => None,
        }
    }
}

pub static TEAM: TypeDescriptor = TypeDescriptor {
    edgedb_name: "Team",
    properties: &[
        PropertyDescriptor {
            source_name: "name",
            edgedb_name: "name",
            kind: PropertyKind::Scalar,
            link_target: None,
            scalar_type: Some("str"),
            exclusive: false,
            id: false,
            ignored: false,
        },
        PropertyDescriptor {
            source_name: "members",
            edgedb_name: "members",
            kind: PropertyKind::MultiLink,
            link_target: Some(|| &PERSON),
            scalar_type: None,
            exclusive: false,
            id: false,
            ignored: false,
        },
    ],
};

pub struct Team<'a> {
    pub name: String,
    pub members: Vec<&'a Person>,
}

impl SchemaObject for Team<'_> {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &TEAM
    }

    fn property(&self, source_name: &str) -> Option<PropertyValue<'_>> {
        match source_name {
            "name" => Some(PropertyValue::Scalar(Value::from(self.name.clone()))),
            "members" => Some(PropertyValue::MultiLink(
                self.members
                    .iter()
                    .map(|p| *p as &dyn SchemaObject)
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// A schema provider that answers every request with one canned
/// `SchemaInfo`.
pub struct StaticSchema(pub SchemaInfo);

#[async_trait]
impl SchemaProvider for StaticSchema {
    async fn describe_schema(
        &self,
        _types: &[&'static TypeDescriptor],
    ) -> Result<SchemaInfo, QueryError> {
        Ok(self.0.clone())
    }
}

/// Person has an exclusive `name`; Post and Team have no exclusives.
pub fn default_schema() -> StaticSchema {
    let mut info = SchemaInfo::new();
    info.insert(
        "Person",
        ObjectInfo {
            exclusives: vec![vec!["name".to_string()]],
        },
    );
    info.insert("Post", ObjectInfo::default());
    info.insert("Team", ObjectInfo::default());
    StaticSchema(info)
}

/// Every `$name` reference in the query body, in order of appearance.
pub fn variable_references(query: &str) -> Vec<String> {
    let bytes = query.as_bytes();
    let mut names = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
                end += 1;
            }
            if end > start {
                names.push(query[start..end].to_string());
            }
            i = end;
        } else {
            i += 1;
        }
    }
    names
}

/// The name of the first global bound in the `with` prelude.
pub fn first_global_name(query: &str) -> Option<String> {
    let rest = query.strip_prefix("with ")?;
    let end = rest.find(" := ")?;
    Some(rest[..end].to_string())
}
