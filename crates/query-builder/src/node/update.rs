use crate::ast::expr::Expr;
use crate::error::QueryError;
use crate::node::shape::{object_shape, ShapeMode};
use crate::node::{BuildContext, NodeState};
use crate::translate::Translator;
use model::{
    schema::descriptor::TypeDescriptor, schema::info::SchemaInfo, schema::object::SchemaObject,
};

#[derive(Clone)]
pub enum UpdateSource<'a> {
    /// Set-shape derived from the object's non-empty scalar properties and
    /// its links.
    Object(&'a dyn SchemaObject),
    /// An explicit set-shape literal.
    Shape(Expr),
}

#[derive(Clone)]
pub struct UpdateNode<'a> {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    source: UpdateSource<'a>,
    pub(crate) selector: Option<Expr>,
}

impl<'a> UpdateNode<'a> {
    pub fn object(value: &'a dyn SchemaObject) -> Self {
        Self::new(value.descriptor(), UpdateSource::Object(value))
    }

    pub fn shape(ty: &'static TypeDescriptor, shape: Expr) -> Self {
        Self::new(ty, UpdateSource::Shape(shape))
    }

    fn new(ty: &'static TypeDescriptor, source: UpdateSource<'a>) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            source,
            selector: None,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        let mut text = format!("update {}", self.ty.edgedb_name);

        if let Some(selector) = &self.selector {
            let selector = Translator::new(self.ty).translate(selector)?;
            text.push_str(&format!(" filter {selector}"));
        }

        match &self.source {
            UpdateSource::Object(obj) => {
                let shape = object_shape(ctx, &mut self.state, self.ty, *obj, ShapeMode::Update)?;
                text.push_str(&format!(" set {{ {shape} }}"));
            }
            UpdateSource::Shape(expr) => {
                let shape = Translator::new(self.ty).translate(expr)?;
                text.push_str(&format!(" set {shape}"));
            }
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
