use crate::ast::expr::Expr;
use crate::error::QueryError;
use crate::node::{BuildContext, NodeState};
use crate::translate::Translator;
use model::{schema::descriptor::TypeDescriptor, schema::info::SchemaInfo};

#[derive(Clone)]
pub struct DeleteNode {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    pub(crate) selector: Option<Expr>,
}

impl DeleteNode {
    pub fn new(ty: &'static TypeDescriptor) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            selector: None,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub fn visit(&mut self, _ctx: &mut BuildContext) -> Result<(), QueryError> {
        let mut text = format!("delete {}", self.ty.edgedb_name);
        if let Some(selector) = &self.selector {
            let selector = Translator::new(self.ty).translate(selector)?;
            text.push_str(&format!(" filter {selector}"));
        }
        self.state.text.push_str(&text);
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
