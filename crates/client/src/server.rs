//! The server capability surface the core consumes.
//!
//! The transport behind it (wire protocol, TLS, authentication, pooling)
//! lives elsewhere; the core only needs `parse`, `execute`, and
//! `describe_schema`, each serialized per connection by the command lock.

use crate::error::ClientError;
use async_trait::async_trait;
use model::{
    core::value::Value,
    schema::descriptor::TypeDescriptor,
    schema::info::SchemaInfo,
};
use query_builder::vars::QueryVariables;
use std::ops::BitOr;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    NoResult,
    AtMostOne,
    One,
    Many,
    AtLeastOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFormat {
    Binary,
    Json,
    JsonElements,
}

/// Capability flags negotiated with the server per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities(u64);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const MODIFICATIONS: Capabilities = Capabilities(1 << 0);
    pub const SESSION_CONFIG: Capabilities = Capabilities(1 << 1);
    pub const TRANSACTION: Capabilities = Capabilities(1 << 2);
    pub const DDL: Capabilities = Capabilities(1 << 3);
    pub const PERSISTENT_CONFIG: Capabilities = Capabilities(1 << 4);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

/// Just enough codec structure to check the argument-codec invariant; the
/// codec subsystem proper handles result decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecDescriptor {
    Null,
    Scalar(String),
    Object(Vec<(String, CodecDescriptor)>),
    Array(Box<CodecDescriptor>),
    Tuple(Vec<CodecDescriptor>),
}

#[derive(Debug, Clone)]
pub struct ParseResult {
    pub in_codec: CodecDescriptor,
    pub out_codec: CodecDescriptor,
    pub cardinality: Cardinality,
    pub capabilities: Capabilities,
}

#[async_trait]
pub trait Server: Send + Sync {
    async fn parse(
        &self,
        query: &str,
        cardinality: Cardinality,
        io_format: IoFormat,
        capabilities: Capabilities,
        token: CancellationToken,
    ) -> Result<ParseResult, ClientError>;

    async fn execute(
        &self,
        query: &str,
        variables: &QueryVariables,
        cardinality: Cardinality,
        io_format: IoFormat,
        capabilities: Capabilities,
        token: CancellationToken,
    ) -> Result<Vec<Value>, ClientError>;

    /// Returns the exclusive constraints of each requested type; each
    /// constraint is the list of property names it covers.
    async fn describe_schema(
        &self,
        types: &[&'static TypeDescriptor],
    ) -> Result<SchemaInfo, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_flags() {
        let caps = Capabilities::MODIFICATIONS | Capabilities::DDL;
        assert!(caps.contains(Capabilities::MODIFICATIONS));
        assert!(caps.contains(Capabilities::DDL));
        assert!(!caps.contains(Capabilities::TRANSACTION));
        assert!(caps.contains(Capabilities::NONE));
    }
}
