//! Builder assembly: chains nodes, runs the visit/finalize pipeline, and
//! emits the final statement.

use crate::ast::expr::Expr;
use crate::error::QueryError;
use crate::node::{
    BuildContext, DeleteNode, ForNode, ForSource, InsertNode, JsonInsert, LimitNode, Node,
    OffsetNode, OrderByNode, OrderDirection, SelectNode, UpdateNode, WithNode, WithQueryNode,
};
use crate::vars::QueryVariables;
use async_trait::async_trait;
use model::{
    schema::descriptor::TypeDescriptor, schema::info::SchemaInfo, schema::object::SchemaObject,
};
use tracing::debug;

/// Supplies schema facts during a build. Implemented by the client over
/// the server's `describe_schema` capability.
#[async_trait]
pub trait SchemaProvider {
    async fn describe_schema(
        &self,
        types: &[&'static TypeDescriptor],
    ) -> Result<SchemaInfo, QueryError>;
}

/// A finished statement: the query text plus the variables it binds.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub query: String,
    pub variables: QueryVariables,
}

/// Assembles one EdgeQL statement from a chain of nodes.
///
/// Each fluent operation appends exactly one node; node order is statement
/// order. A builder is single-threaded and must not be shared across
/// tasks; independent builders may run in parallel. Re-building an
/// unmodified builder is deterministic modulo generated names. A builder
/// whose build was cancelled mid-introspection is left in an unspecified
/// state and must not be reused.
pub struct QueryBuilder<'a> {
    ty: &'static TypeDescriptor,
    nodes: Vec<Node<'a>>,
    ctx: BuildContext,
}

impl<'a> QueryBuilder<'a> {
    fn with_node(ty: &'static TypeDescriptor, node: Node<'a>) -> Self {
        Self {
            ty,
            nodes: vec![node],
            ctx: BuildContext::new(),
        }
    }

    /// `insert Type { … }` from a fully-constructed domain object.
    pub fn insert(value: &'a dyn SchemaObject) -> Self {
        let node = InsertNode::object(value);
        Self::with_node(value.descriptor(), Node::Insert(node))
    }

    /// `insert Type { … }` from a shape literal.
    pub fn insert_shape(ty: &'static TypeDescriptor, shape: Expr) -> Self {
        Self::with_node(ty, Node::Insert(InsertNode::shape(ty, shape)))
    }

    /// Bulk insert from a depth-annotated JSON document.
    pub fn insert_json(ty: &'static TypeDescriptor, depths: Vec<serde_json::Value>) -> Self {
        let node = InsertNode::json(ty, JsonInsert::new(depths));
        Self::with_node(ty, Node::Insert(node))
    }

    pub fn select(ty: &'static TypeDescriptor) -> Self {
        Self::with_node(ty, Node::Select(SelectNode::new(ty)))
    }

    /// `update Type … set { … }` from the object's properties.
    pub fn update(value: &'a dyn SchemaObject) -> Self {
        let node = UpdateNode::object(value);
        Self::with_node(value.descriptor(), Node::Update(node))
    }

    pub fn update_shape(ty: &'static TypeDescriptor, shape: Expr) -> Self {
        Self::with_node(ty, Node::Update(UpdateNode::shape(ty, shape)))
    }

    pub fn delete(ty: &'static TypeDescriptor) -> Self {
        Self::with_node(ty, Node::Delete(DeleteNode::new(ty)))
    }

    /// `for <iterator> in <set> union (<body>)`; the body builder's user
    /// nodes become the union body.
    pub fn for_over(
        ty: &'static TypeDescriptor,
        iterator: &str,
        set: Expr,
        body: QueryBuilder<'a>,
    ) -> Self {
        let node = ForNode::new(ty, iterator, ForSource::Expr(set), body.into_user_nodes());
        Self::with_node(ty, Node::For(node))
    }

    /// A `for` over the unpacked elements of a JSON array.
    pub fn for_over_json(
        ty: &'static TypeDescriptor,
        iterator: &str,
        json: serde_json::Value,
        body: QueryBuilder<'a>,
    ) -> Self {
        let node = ForNode::new(ty, iterator, ForSource::Json(json), body.into_user_nodes());
        Self::with_node(ty, Node::For(node))
    }

    /// Attaches a filter to the most recent select/update/delete node.
    pub fn filter(mut self, expr: Expr) -> Self {
        match self.nodes.last_mut() {
            Some(Node::Select(n)) => n.filter = Some(expr),
            Some(Node::Update(n)) => n.selector = Some(expr),
            Some(Node::Delete(n)) => n.selector = Some(expr),
            _ => debug_assert!(false, "filter requires a select, update, or delete node"),
        }
        self
    }

    pub fn order_by(mut self, key: Expr, direction: OrderDirection) -> Self {
        self.nodes
            .push(Node::OrderBy(OrderByNode::new(self.ty, key, direction)));
        self
    }

    /// Extends the most recent `order by` with a secondary key.
    pub fn then_by(mut self, key: Expr, direction: OrderDirection) -> Self {
        match self.nodes.last_mut() {
            Some(Node::OrderBy(n)) => n.then_by(key, direction),
            _ => {
                self.nodes
                    .push(Node::OrderBy(OrderByNode::new(self.ty, key, direction)));
            }
        }
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.nodes.push(Node::Offset(OffsetNode::new(self.ty, count)));
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.nodes.push(Node::Limit(LimitNode::new(self.ty, count)));
        self
    }

    /// Binds `name := (<expr>)` in the `with` prelude.
    pub fn with(mut self, name: &str, expr: Expr) -> Self {
        match self.nodes.last_mut() {
            Some(Node::With(n)) => n.bind(name, expr),
            _ => {
                self.nodes
                    .push(Node::With(WithNode::new(self.ty, name, expr)));
            }
        }
        self
    }

    /// Publishes another builder's statement as a named global in this
    /// builder's `with` prelude.
    pub fn with_query(mut self, name: &str, child: QueryBuilder<'a>) -> Self {
        let node = WithQueryNode::new(self.ty, name, child.into_user_nodes());
        self.nodes.push(Node::WithQuery(node));
        self
    }

    /// Requests `unless conflict on <exclusives>`, synthesized from the
    /// introspected schema during finalize.
    pub fn unless_conflict(mut self) -> Self {
        if let Some(insert) = self.last_insert_mut() {
            insert.set_autogenerate_conflict();
        }
        self
    }

    /// Appends `unless conflict on <selector>` immediately; no schema
    /// facts are needed.
    pub fn unless_conflict_on(mut self, selector: Expr) -> Self {
        if let Some(insert) = self.last_insert_mut() {
            insert.set_conflict_selector(selector);
        }
        self
    }

    /// Appends `else (select OperatingType)`.
    pub fn else_default(mut self) -> Self {
        if let Some(insert) = self.last_insert_mut() {
            insert.set_else_default();
        }
        self
    }

    /// Appends `else (<child query>)`. The child's user node chain is
    /// taken over, each node stripped of any global promotion; its
    /// variables and globals are created through this builder's context
    /// when the chain is built.
    pub fn else_query(mut self, child: QueryBuilder<'a>) -> Self {
        let mut nodes = child.into_user_nodes();
        for node in &mut nodes {
            node.state_mut().set_as_global = false;
        }
        if let Some(insert) = self.last_insert_mut() {
            insert.set_else_query(nodes);
        }
        self
    }

    /// The user's primary chain: auto-generated nodes are dropped.
    fn into_user_nodes(self) -> Vec<Node<'a>> {
        self.nodes
            .into_iter()
            .filter(|n| !n.is_auto_generated())
            .collect()
    }

    fn last_insert_mut(&mut self) -> Option<&mut InsertNode<'a>> {
        let node = self.nodes.iter_mut().rev().find_map(|n| match n {
            Node::Insert(insert) => Some(insert),
            _ => None,
        });
        debug_assert!(node.is_some(), "no insert node to attach the clause to");
        node
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    /// Builds the statement, asking `provider` for schema facts if any
    /// node or pending sub-query needs them.
    pub async fn build(
        &mut self,
        provider: &(impl SchemaProvider + ?Sized),
    ) -> Result<BuiltQuery, QueryError> {
        self.visit_all()?;

        let schema = if self.requires_introspection() {
            let targets = self.ctx.introspection_targets().to_vec();
            debug!(types = targets.len(), "requesting schema introspection");
            Some(provider.describe_schema(&targets).await?)
        } else {
            None
        };

        self.finish(schema.as_ref())
    }

    /// Builds without a schema source; fails with
    /// [`QueryError::SchemaRequired`] when introspection would be needed.
    pub fn build_offline(&mut self) -> Result<BuiltQuery, QueryError> {
        self.visit_all()?;
        if self.requires_introspection() {
            return Err(QueryError::SchemaRequired);
        }
        self.finish(None)
    }

    fn visit_all(&mut self) -> Result<(), QueryError> {
        self.ctx = BuildContext::new();
        for node in &mut self.nodes {
            node.reset();
            node.visit(&mut self.ctx)?;
        }
        Ok(())
    }

    fn requires_introspection(&self) -> bool {
        self.nodes.iter().any(Node::requires_introspection)
            || self.ctx.globals.requires_introspection()
    }

    fn finish(&mut self, schema: Option<&SchemaInfo>) -> Result<BuiltQuery, QueryError> {
        for node in &mut self.nodes {
            node.finalize(&mut self.ctx, schema)?;
        }
        self.ctx.globals.materialize(schema)?;

        let body = self
            .nodes
            .iter()
            .map(Node::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let query = if self.ctx.globals.is_empty() {
            body
        } else {
            format!("with {} {}", self.ctx.globals.render_prelude()?, body)
        };

        debug!(
            variables = self.ctx.variables.len(),
            globals = self.ctx.globals.len(),
            "assembled query"
        );

        Ok(BuiltQuery {
            query,
            variables: self.ctx.variables.clone(),
        })
    }
}
