//! `for <iterator> in <set> union (<body>)`.

use crate::ast::expr::Expr;
use crate::error::QueryError;
use crate::node::{BuildContext, Node, NodeState};
use crate::translate::Translator;
use model::{
    core::value::Value, schema::descriptor::TypeDescriptor, schema::info::SchemaInfo,
};

#[derive(Clone)]
pub enum ForSource {
    /// Any translated set expression.
    Expr(Expr),
    /// A JSON array, bound to a variable and unpacked element-wise.
    Json(serde_json::Value),
}

#[derive(Clone)]
pub struct ForNode<'a> {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    iterator: String,
    source: ForSource,
    rendered_set: Option<String>,
    body: Vec<Node<'a>>,
}

impl<'a> ForNode<'a> {
    pub fn new(
        ty: &'static TypeDescriptor,
        iterator: impl Into<String>,
        source: ForSource,
        body: Vec<Node<'a>>,
    ) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            iterator: iterator.into(),
            source,
            rendered_set: None,
            body,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub(crate) fn body(&self) -> &[Node<'a>] {
        &self.body
    }

    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        let set_text = match &self.source {
            ForSource::Expr(expr) => Translator::new(self.ty).translate(expr)?,
            ForSource::Json(value) => {
                let variable = ctx.variables.add(Value::Json(value.clone()));
                format!("json_array_unpack(<json>${variable})")
            }
        };
        self.rendered_set = Some(set_text);

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

        let set_text = self.rendered_set.take().unwrap_or_default();
        debug_assert!(!set_text.is_empty(), "for node finalized before visit");
        self.state.text.push_str(&format!(
            "for {} in {} union ({})",
            self.iterator,
            set_text,
            parts.join(" ")
        ));
        Ok(())
    }
}
