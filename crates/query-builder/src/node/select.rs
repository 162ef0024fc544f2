//! Select and the paging nodes (order by / offset / limit).

use crate::ast::expr::Expr;
use crate::error::QueryError;
use crate::node::{BuildContext, NodeState};
use crate::translate::Translator;
use model::{core::value::Value, schema::descriptor::TypeDescriptor, schema::info::SchemaInfo};

#[derive(Clone)]
pub struct SelectNode {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    pub(crate) filter: Option<Expr>,
}

impl SelectNode {
    pub fn new(ty: &'static TypeDescriptor) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            filter: None,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub fn visit(&mut self, _ctx: &mut BuildContext) -> Result<(), QueryError> {
        let mut text = format!("select {}", self.ty.edgedb_name);
        if let Some(filter) = &self.filter {
            let filter = Translator::new(self.ty).translate(filter)?;
            text.push_str(&format!(" filter {filter}"));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

#[derive(Clone)]
pub struct OrderByNode {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    orderings: Vec<(Expr, OrderDirection)>,
}

impl OrderByNode {
    pub fn new(ty: &'static TypeDescriptor, key: Expr, direction: OrderDirection) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            orderings: vec![(key, direction)],
        }
    }

    pub fn then_by(&mut self, key: Expr, direction: OrderDirection) {
        self.orderings.push((key, direction));
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub fn visit(&mut self, _ctx: &mut BuildContext) -> Result<(), QueryError> {
        let mut translator = Translator::new(self.ty);
        let keys = self
            .orderings
            .iter()
            .map(|(key, direction)| {
                let key = translator.translate(key)?;
                Ok(format!("{} {}", key, direction.as_str()))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        self.state
            .text
            .push_str(&format!("order by {}", keys.join(" then ")));
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

#[derive(Clone)]
pub struct OffsetNode {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    count: i64,
}

impl OffsetNode {
    pub fn new(ty: &'static TypeDescriptor, count: i64) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            count,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        let name = ctx.variables.add(Value::Int64(self.count));
        self.state.text.push_str(&format!("offset <int64>${name}"));
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

#[derive(Clone)]
pub struct LimitNode {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    count: i64,
}

impl LimitNode {
    pub fn new(ty: &'static TypeDescriptor, count: i64) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            count,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        let name = ctx.variables.add(Value::Int64(self.count));
        self.state.text.push_str(&format!("limit <int64>${name}"));
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
