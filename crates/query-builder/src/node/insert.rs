//! The insert node: typed-object, shape-literal, and JSON bulk inserts
//! with conflict and else-clause synthesis.

use crate::ast::expr::Expr;
use crate::error::QueryError;
use crate::node::insert_json::{build_json_statement, JsonInsert};
use crate::node::shape::{conflict_target, object_shape, ShapeMode};
use crate::node::{BuildContext, Node, NodeState};
use crate::translate::Translator;
use model::{
    schema::descriptor::TypeDescriptor,
    schema::info::SchemaInfo,
    schema::object::SchemaObject,
};

#[derive(Clone)]
pub enum InsertSource<'a> {
    /// A fully-constructed domain object.
    Object(&'a dyn SchemaObject),
    /// A shape literal, translated by the expression translator.
    Shape(Expr),
    /// A pre-serialized JSON document annotated as a depth map.
    Json(JsonInsert),
}

#[derive(Clone)]
pub(crate) enum ElseClause<'a> {
    /// `else (select OperatingType)`.
    Default,
    /// `else (<child query>)`, built from another builder's node chain.
    Query(Vec<Node<'a>>),
}

#[derive(Clone)]
pub struct InsertNode<'a> {
    pub(crate) state: NodeState,
    ty: &'static TypeDescriptor,
    source: InsertSource<'a>,
    autogenerate_conflict: bool,
    conflict_selector: Option<Expr>,
    else_clause: Option<ElseClause<'a>>,
}

impl<'a> InsertNode<'a> {
    pub fn object(value: &'a dyn SchemaObject) -> Self {
        Self::new(value.descriptor(), InsertSource::Object(value))
    }

    pub fn shape(ty: &'static TypeDescriptor, shape: Expr) -> Self {
        Self::new(ty, InsertSource::Shape(shape))
    }

    pub fn json(ty: &'static TypeDescriptor, json: JsonInsert) -> Self {
        Self::new(ty, InsertSource::Json(json))
    }

    fn new(ty: &'static TypeDescriptor, source: InsertSource<'a>) -> Self {
        Self {
            state: NodeState::default(),
            ty,
            source,
            autogenerate_conflict: false,
            conflict_selector: None,
            else_clause: None,
        }
    }

    pub fn operating_type(&self) -> &'static TypeDescriptor {
        self.ty
    }

    /// Requests `unless conflict on <exclusives>` synthesized from the
    /// introspected schema during finalize.
    pub fn set_autogenerate_conflict(&mut self) {
        self.autogenerate_conflict = true;
    }

    pub fn set_conflict_selector(&mut self, selector: Expr) {
        self.conflict_selector = Some(selector);
    }

    pub fn set_else_default(&mut self) {
        self.else_clause = Some(ElseClause::Default);
    }

    pub fn set_else_query(&mut self, nodes: Vec<Node<'a>>) {
        self.else_clause = Some(ElseClause::Query(nodes));
    }

    pub(crate) fn else_nodes(&self) -> &[Node<'a>] {
        match &self.else_clause {
            Some(ElseClause::Query(nodes)) => nodes,
            _ => &[],
        }
    }

    pub fn visit(&mut self, ctx: &mut BuildContext) -> Result<(), QueryError> {
        let type_name = self.ty.edgedb_name;

        let text = match &self.source {
            InsertSource::Object(obj) => {
                let shape = object_shape(ctx, &mut self.state, self.ty, *obj, ShapeMode::Insert)?;
                if shape.is_empty() {
                    format!("insert {type_name}")
                } else {
                    format!("insert {type_name} {{ {shape} }}")
                }
            }
            InsertSource::Shape(expr) => {
                let shape = Translator::new(self.ty).translate(expr)?;
                format!("insert {type_name} {shape}")
            }
            InsertSource::Json(json) => {
                build_json_statement(ctx, &mut self.state, self.ty, json)?
            }
        };
        self.state.text.push_str(&text);

        // An explicit conflict selector needs no schema facts and is
        // appended right away; the autogenerated form waits for finalize.
        if let Some(selector) = &self.conflict_selector {
            let selector = Translator::new(self.ty).translate(selector)?;
            self.state
                .text
                .push_str(&format!(" unless conflict on {selector}"));
        }
        if self.autogenerate_conflict {
            self.state.requires_introspection = true;
            ctx.request_introspection(self.ty);
        }

        if let Some(ElseClause::Query(nodes)) = &mut self.else_clause {
            for node in nodes.iter_mut() {
                node.reset();
                node.visit(ctx)?;
            }
        }

        Ok(())
    }

    /// Finalize order is fixed: conflict synthesis, then the else clause.
    /// Global promotion runs after both, in [`Node::finalize`].
    pub fn finalize(
        &mut self,
        ctx: &mut BuildContext,
        schema: Option<&SchemaInfo>,
    ) -> Result<(), QueryError> {
        if self.autogenerate_conflict {
            let schema = schema.ok_or(QueryError::SchemaRequired)?;
            let names: Vec<String> = schema
                .object(self.ty)
                .map(|info| {
                    info.exclusive_property_names()
                        .into_iter()
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            if names.is_empty() {
                return Err(QueryError::NoExclusiveConstraints(
                    self.ty.edgedb_name.to_string(),
                ));
            }
            self.state
                .text
                .push_str(&format!(" unless conflict on {}", conflict_target(&names)));
        }

        match &mut self.else_clause {
            None => {}
            Some(ElseClause::Default) => {
                let clause = format!(" else (select {})", self.ty.edgedb_name);
                self.state.text.push_str(&clause);
            }
            Some(ElseClause::Query(nodes)) => {
                let mut parts = Vec::new();
                for node in nodes.iter_mut() {
                    node.finalize(ctx, schema)?;
                    if !node.text().is_empty() {
                        parts.push(node.text().to_string());
                    }
                }
                self.state
                    .text
                    .push_str(&format!(" else ({})", parts.join(" ")));
            }
        }

        Ok(())
    }
}
