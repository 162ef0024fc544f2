//! With-prelude nodes: expression bindings and named sub-query builders.

use crate::ast::expr::Expr;
use crate::error::QueryError;
use crate::node::{BuildContext, Node, NodeState};
use crate::translate::Translator;
use crate::vars::SubQuery;
use model::{schema::descriptor::TypeDescriptor, schema::info::SchemaInfo};

/// Registers user expression bindings as globals. Emits no statement text
/// of its own; the bindings surface in the `with` prelude.
#[derive(Clone)]
pub struct WithNode {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    bindings: Vec<(String, Expr)>,
}

impl WithNode {
    pub fn new(ty: &'static TypeDescriptor, name: impl Into<String>, expr: Expr) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            bindings: vec![(name.into(), expr)],
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, expr: Expr) {
        self.bindings.push((name.into(), expr));
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        let mut translator = Translator::new(self.ty);
        for (name, expr) in &self.bindings {
            let text = translator.translate(expr)?;
            ctx.globals
                .add_named(name.clone(), SubQuery::Ready(text), None);
        }
        Ok(())
    }

    pub fn finalize(
        &mut self,
        _ctx: &mut BuildContext,
        _schema: Option<&SchemaInfo>,
    ) -> Result<(), QueryError> {
        Ok(())
    }
}

/// Wraps another builder's node chain and publishes its assembled statement
/// as a named global. The body is visited and finalized through the parent
/// context, so its variables and globals merge upward.
#[derive(Clone)]
pub struct WithQueryNode<'a> {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    body: Vec<Node<'a>>,
}

impl<'a> WithQueryNode<'a> {
    pub fn new(
        ty: &'static TypeDescriptor,
        name: impl Into<String>,
        body: Vec<Node<'a>>,
    ) -> Self {
        let mut state = NodeState::default();
        state.set_as_global = true;
        state.global_name = Some(name.into());
        Self { state, ty, body }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub(crate) fn body(&self) -> &[Node<'a>] {
        &self.body
    }

    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        for node in self.body.iter_mut() {
            node.reset();
            node.visit(ctx)?;
        }
        Ok(())
    }

    pub fn finalize(
        &mut self,
        ctx: &mut BuildContext,
        schema: Option<&SchemaInfo>,
    ) -> Result<(), QueryError> {
        let mut parts = Vec::new();
        for node in self.body.iter_mut() {
            node.finalize(ctx, schema)?;
            if !node.text().is_empty() {
                parts.push(node.text().to_string());
            }
        }
        // Promotion in Node::finalize moves this text into the globals.
        self.state.text.push_str(&parts.join(" "));
        Ok(())
    }
}
