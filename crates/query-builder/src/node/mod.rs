//! The node graph: one node per query clause, visited twice.
//!
//! A builder appends nodes in statement order. `visit` emits each node's
//! local text from what is known up front; nodes that need schema facts
//! flag `requires_introspection`. `finalize` then rewrites or appends the
//! introspection-dependent clauses. A node's text buffer is append-only
//! between the two phases, and its operating type never changes after
//! construction.

pub mod delete;
pub mod for_union;
pub mod insert;
pub mod insert_json;
pub mod select;
pub(crate) mod shape;
pub mod update;
pub mod with;

use crate::error::QueryError;
use crate::vars::{generate_random_variable_name, QueryGlobals, QueryVariables, SubQuery};
use model::{schema::descriptor::TypeDescriptor, schema::info::SchemaInfo};
use std::collections::HashSet;

pub use delete::DeleteNode;
pub use for_union::{ForNode, ForSource};
pub use insert::{InsertNode, InsertSource};
pub use insert_json::JsonInsert;
pub use select::{LimitNode, OffsetNode, OrderByNode, OrderDirection, SelectNode};
pub use update::{UpdateNode, UpdateSource};
pub use with::{WithNode, WithQueryNode};

/// State every node carries through the visit/finalize pipeline.
#[derive(Debug, Clone, Default)]
pub struct NodeState {
    /// The node's local statement text.
    pub text: String,
    /// Appended by the builder itself rather than the user; filtered out
    /// when a builder is absorbed as an `else` clause.
    pub auto_generated: bool,
    /// Set during visit when finalize will need schema facts.
    pub requires_introspection: bool,
    /// When set, finalize moves the assembled text into the globals under
    /// `global_name` instead of leaving it in the statement body.
    pub set_as_global: bool,
    pub global_name: Option<String>,
    /// Entity types already inlined as sub-queries in this node.
    pub inlined_types: HashSet<&'static str>,
}

impl NodeState {
    /// Clears per-build output so a builder can be re-built; configuration
    /// (`auto_generated`, `set_as_global`, `global_name`) survives.
    pub fn reset(&mut self) {
        self.text.clear();
        self.requires_introspection = false;
        self.inlined_types.clear();
    }
}

/// Shared mutable state for one build pass, owned by the builder and
/// passed by exclusive reference through the pipeline.
#[derive(Debug, Default)]
pub struct BuildContext {
    pub variables: QueryVariables,
    pub globals: QueryGlobals,
    introspect: Vec<&'static TypeDescriptor>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a type whose schema facts the finalize phase will need.
    pub fn request_introspection(&mut self, ty: &'static TypeDescriptor) {
        if !self
            .introspect
            .iter()
            .any(|t| t.edgedb_name == ty.edgedb_name)
        {
            self.introspect.push(ty);
        }
    }

    pub fn introspection_targets(&self) -> &[&'static TypeDescriptor] {
        &self.introspect
    }
}

#[derive(Clone)]
pub enum Node<'a> {
    Insert(InsertNode<'a>),
    Select(SelectNode),
    Update(UpdateNode<'a>),
    Delete(DeleteNode),
    With(WithNode),
    WithQuery(WithQueryNode<'a>),
    For(ForNode<'a>),
    OrderBy(OrderByNode),
    Offset(OffsetNode),
    Limit(LimitNode),
}

impl<'a> Node<'a> {
    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        match self {
            Node::Insert(n) => n.visit(ctx),
            Node::Select(n) => n.visit(ctx),
            Node::Update(n) => n.visit(ctx),
            Node::Delete(n) => n.visit(ctx),
            Node::With(n) => n.visit(ctx),
            Node::WithQuery(n) => n.visit(ctx),
            Node::For(n) => n.visit(ctx),
            Node::OrderBy(n) => n.visit(ctx),
            Node::Offset(n) => n.visit(ctx),
            Node::Limit(n) => n.visit(ctx),
        }
    }

    pub fn finalize(
        &mut self,
        ctx: &mut BuildContext,
        schema: Option<&SchemaInfo>,
    ) -> Result<(), QueryError> {
        match self {
            Node::Insert(n) => n.finalize(ctx, schema),
            Node::Select(n) => n.finalize(ctx, schema),
            Node::Update(n) => n.finalize(ctx, schema),
            Node::Delete(n) => n.finalize(ctx, schema),
            Node::With(n) => n.finalize(ctx, schema),
            Node::WithQuery(n) => n.finalize(ctx, schema),
            Node::For(n) => n.finalize(ctx, schema),
            Node::OrderBy(n) => n.finalize(ctx, schema),
            Node::Offset(n) => n.finalize(ctx, schema),
            Node::Limit(n) => n.finalize(ctx, schema),
        }?;

        // Global promotion is the last finalize step, after conflict and
        // else synthesis.
        let state = self.state_mut();
        if state.set_as_global && !state.text.is_empty() {
            let name = state
                .global_name
                .clone()
                .unwrap_or_else(generate_random_variable_name);
            let text = std::mem::take(&mut state.text);
            ctx.globals.add_named(name, SubQuery::Ready(text), None);
        }

        Ok(())
    }

    pub fn state(&self) -> &NodeState {
        match self {
            Node::Insert(n) => &n.state,
            Node::Select(n) => &n.state,
            Node::Update(n) => &n.state,
            Node::Delete(n) => &n.state,
            Node::With(n) => &n.state,
            Node::WithQuery(n) => &n.state,
            Node::For(n) => &n.state,
            Node::OrderBy(n) => &n.state,
            Node::Offset(n) => &n.state,
            Node::Limit(n) => &n.state,
        }
    }

    pub fn state_mut(&mut self) -> &mut NodeState {
        match self {
            Node::Insert(n) => &mut n.state,
            Node::Select(n) => &mut n.state,
            Node::Update(n) => &mut n.state,
            Node::Delete(n) => &mut n.state,
            Node::With(n) => &mut n.state,
            Node::WithQuery(n) => &mut n.state,
            Node::For(n) => &mut n.state,
            Node::OrderBy(n) => &mut n.state,
            Node::Offset(n) => &mut n.state,
            Node::Limit(n) => &mut n.state,
        }
    }

    pub fn reset(&mut self) {
        self.state_mut().reset();
    }

    pub fn text(&self) -> &str {
        &self.state().text
    }

    pub fn is_auto_generated(&self) -> bool {
        self.state().auto_generated
    }

    /// Whether this node, or any node nested under it, needs schema facts
    /// to finalize.
    pub fn requires_introspection(&self) -> bool {
        if self.state().requires_introspection {
            return true;
        }
        match self {
            Node::Insert(n) => n.else_nodes().iter().any(Node::requires_introspection),
            Node::WithQuery(n) => n.body().iter().any(Node::requires_introspection),
            Node::For(n) => n.body().iter().any(Node::requires_introspection),
            _ => false,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        match self {
            Node::Insert(n) => n.operating_type(),
            Node::Select(n) => n.operating_type(),
            Node::Update(n) => n.operating_type(),
            Node::Delete(n) => n.operating_type(),
            Node::With(n) => n.operating_type(),
            Node::WithQuery(n) => n.operating_type(),
            Node::For(n) => n.operating_type(),
            Node::OrderBy(n) => n.operating_type(),
            Node::Offset(n) => n.operating_type(),
            Node::Limit(n) => n.operating_type(),
        }
    }
}
