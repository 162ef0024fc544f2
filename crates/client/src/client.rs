//! Execution glue between a builder and the server.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::lock::CommandLock;
use crate::server::{Cardinality, CodecDescriptor, Server};
use async_trait::async_trait;
use model::{core::value::Value, schema::descriptor::TypeDescriptor, schema::info::SchemaInfo};
use query_builder::{BuiltQuery, QueryBuilder, QueryError, SchemaProvider};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct Client {
    server: Arc<dyn Server>,
    lock: CommandLock,
    config: ClientConfig,
}

impl Client {
    pub fn new(server: Arc<dyn Server>, config: ClientConfig) -> Self {
        Self {
            server,
            lock: CommandLock::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds the statement (introspecting through this client when the
    /// builder needs schema facts) and runs it.
    pub async fn execute_query(
        &self,
        builder: &mut QueryBuilder<'_>,
        cardinality: Cardinality,
        token: CancellationToken,
    ) -> Result<Vec<Value>, ClientError> {
        let built = builder.build(self).await?;
        self.run(&built, cardinality, token).await
    }

    /// Runs an already-built statement: lock, parse, check the argument
    /// codec, execute.
    pub async fn run(
        &self,
        built: &BuiltQuery,
        cardinality: Cardinality,
        token: CancellationToken,
    ) -> Result<Vec<Value>, ClientError> {
        let _guard = self
            .lock
            .acquire(self.config.command_timeout, &token)
            .await?;

        debug!(query = %built.query, "parsing query");
        let parsed = self
            .server
            .parse(
                &built.query,
                cardinality,
                self.config.io_format,
                self.config.capabilities,
                token.clone(),
            )
            .await?;

        match parsed.in_codec {
            CodecDescriptor::Null | CodecDescriptor::Object(_) => {}
            _ => return Err(ClientError::MalformedArgumentCodec),
        }

        debug!(variables = built.variables.len(), "executing query");
        self.server
            .execute(
                &built.query,
                &built.variables,
                parsed.cardinality,
                self.config.io_format,
                self.config.capabilities,
                token,
            )
            .await
    }
}

#[async_trait]
impl SchemaProvider for Client {
    async fn describe_schema(
        &self,
        types: &[&'static TypeDescriptor],
    ) -> Result<SchemaInfo, QueryError> {
        self.server.describe_schema(types).await.map_err(|err| {
            warn!(error = %err, "schema introspection failed");
            QueryError::SchemaRequired
        })
    }
}
