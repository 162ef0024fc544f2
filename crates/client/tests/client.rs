//! Client execution tests against a canned server.

use async_trait::async_trait;
use client::{
    Capabilities, Cardinality, Client, ClientConfig, ClientError, CodecDescriptor, IoFormat,
    ParseResult, Server,
};
use model::core::value::Value;
use model::schema::descriptor::{PropertyDescriptor, PropertyKind, TypeDescriptor};
use model::schema::info::{ObjectInfo, SchemaInfo};
use model::schema::object::{PropertyValue, SchemaObject};
use query_builder::vars::QueryVariables;
use query_builder::QueryBuilder;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

static TAG: TypeDescriptor = TypeDescriptor {
    edgedb_name: "Tag",
    properties: &[PropertyDescriptor {
        source_name: "name",
        edgedb_name: "name",
        kind: PropertyKind::Scalar,
        link_target: None,
        scalar_type: Some("str"),
        exclusive: true,
        id: false,
        ignored: false,
    }],
};

struct Tag {
    name: String,
}

impl SchemaObject for Tag {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &TAG
    }

    fn property(&self, source_name: &str) -> Option<PropertyValue<'_>> {
        match source_name {
            "name" => Some(PropertyValue::Scalar(Value::from(self.name.clone()))),
            _ => None,
        }
    }
}

struct MockServer {
    in_codec: CodecDescriptor,
    schema: SchemaInfo,
    executed: Mutex<Vec<(String, usize)>>,
}

impl MockServer {
    fn new(in_codec: CodecDescriptor) -> Self {
        let mut schema = SchemaInfo::new();
        schema.insert(
            "Tag",
            ObjectInfo {
                exclusives: vec![vec!["name".to_string()]],
            },
        );
        Self {
            in_codec,
            schema,
            executed: Mutex::new(Vec::new()),
        }
    }

    fn executed(&self) -> Vec<(String, usize)> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Server for MockServer {
    async fn parse(
        &self,
        _query: &str,
        cardinality: Cardinality,
        _io_format: IoFormat,
        capabilities: Capabilities,
        _token: CancellationToken,
    ) -> Result<ParseResult, ClientError> {
        Ok(ParseResult {
            in_codec: self.in_codec.clone(),
            out_codec: CodecDescriptor::Null,
            cardinality,
            capabilities,
        })
    }

    async fn execute(
        &self,
        query: &str,
        variables: &QueryVariables,
        _cardinality: Cardinality,
        _io_format: IoFormat,
        _capabilities: Capabilities,
        _token: CancellationToken,
    ) -> Result<Vec<Value>, ClientError> {
        self.executed
            .lock()
            .unwrap()
            .push((query.to_string(), variables.len()));
        Ok(Vec::new())
    }

    async fn describe_schema(
        &self,
        _types: &[&'static TypeDescriptor],
    ) -> Result<SchemaInfo, ClientError> {
        Ok(self.schema.clone())
    }
}

fn object_codec() -> CodecDescriptor {
    CodecDescriptor::Object(vec![(
        "0".to_string(),
        CodecDescriptor::Scalar("str".to_string()),
    )])
}

#[tokio::test]
async fn test_execute_query_with_introspection() {
    let server = Arc::new(MockServer::new(object_codec()));
    let client = Client::new(server.clone(), ClientConfig::default());

    let tag = Tag {
        name: "rust".to_string(),
    };
    let mut builder = QueryBuilder::insert(&tag).unless_conflict().else_default();

    let rows = client
        .execute_query(&mut builder, Cardinality::One, CancellationToken::new())
        .await
        .unwrap();
    assert!(rows.is_empty());

    let executed = server.executed();
    assert_eq!(executed.len(), 1);
    let (query, variables) = &executed[0];
    assert!(query.ends_with("unless conflict on .name else (select Tag)"));
    assert_eq!(*variables, 1);
}

#[tokio::test]
async fn test_malformed_argument_codec_is_rejected() {
    let server = Arc::new(MockServer::new(CodecDescriptor::Scalar("str".to_string())));
    let client = Client::new(server.clone(), ClientConfig::default());

    let tag = Tag {
        name: "rust".to_string(),
    };
    let mut builder = QueryBuilder::insert(&tag);

    let err = client
        .execute_query(&mut builder, Cardinality::One, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedArgumentCodec));
    assert!(server.executed().is_empty());
}

#[tokio::test]
async fn test_null_codec_is_accepted() {
    let server = Arc::new(MockServer::new(CodecDescriptor::Null));
    let client = Client::new(server.clone(), ClientConfig::default());

    let tag = Tag {
        name: "rust".to_string(),
    };
    let mut builder = QueryBuilder::insert(&tag);

    client
        .execute_query(&mut builder, Cardinality::One, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(server.executed().len(), 1);
}

#[tokio::test]
async fn test_cancelled_token_aborts_before_parse() {
    let server = Arc::new(MockServer::new(object_codec()));
    let client = Client::new(server.clone(), ClientConfig::default());

    let tag = Tag {
        name: "rust".to_string(),
    };
    let mut builder = QueryBuilder::insert(&tag);

    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .execute_query(&mut builder, Cardinality::One, token)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::CancelledOrTimedOut));
    assert!(server.executed().is_empty());
}
