use thiserror::Error;

/// All errors surfaced while assembling a query.
///
/// Construction problems are reported at build time: nodes may flag
/// conditions during the visit phase, but every diagnostic is raised before
/// the query text leaves the builder.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A property value has no EdgeQL scalar mapping.
    #[error("no EdgeQL scalar mapping for property '{property}' of type '{type_name}'")]
    UnserializableType {
        type_name: String,
        property: String,
    },

    /// A property is neither a serializable scalar nor a recognized link.
    #[error("property '{property}' of type '{type_name}' cannot be serialized into a shape")]
    UnserializableProperty {
        type_name: String,
        property: String,
    },

    /// An autogenerated conflict target was requested for a type without
    /// exclusive constraints.
    #[error("type '{0}' has no exclusive constraints to use as a conflict target")]
    NoExclusiveConstraints(String),

    /// Schema introspection was needed to finish the query but no schema
    /// was available.
    #[error("schema introspection required but unavailable")]
    SchemaRequired,

    /// The expression tree contains a node or call not present in the
    /// translator registries.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// The JSON bulk-insert input does not form a valid depth map.
    #[error("malformed depth map: {0}")]
    InvalidDepthMap(String),
}
