//! Depth-indexed JSON bulk insert.
//!
//! The caller supplies one JSON array per depth level, depth 1 being the
//! roots. Objects at depth `d` reference their children in depth `d + 1`
//! through annotations injected at each link site: `{"depth_index": i}`
//! for a single link, `{"depth_from": a, "depth_to": b}` for a multi link.
//! Keys are the schema property names.

use crate::error::QueryError;
use crate::node::shape::conflict_suffix;
use crate::node::{BuildContext, NodeState};
use crate::vars::SubQuery;
use model::{
    core::value::Value,
    schema::descriptor::{PropertyKind, TypeDescriptor},
};

#[derive(Debug, Clone)]
pub struct JsonInsert {
    depths: Vec<serde_json::Value>,
}

impl JsonInsert {
    /// `depths[0]` is depth 1 (the roots); every entry must be a JSON
    /// array. Validation happens when the statement is built.
    pub fn new(depths: Vec<serde_json::Value>) -> Self {
        Self { depths }
    }

    pub fn depth(&self) -> usize {
        self.depths.len()
    }
}

/// Emits one variable and one deferred global per depth level, deepest
/// first, and returns the node's own statement text.
///
/// Each depth global aggregates the inserted rows of that level:
///
/// ```text
/// T_d2 := (array_agg((for iter in json_array_unpack(<json>$a) union
///     (insert T { … } unless conflict on (…) else (select T)))))
/// ```
///
/// Links at depth `d` index into `T_d{d+1}`; at the deepest level every
/// link is the empty set. The statement itself reads the aggregated roots
/// from `T_d1`.
pub(crate) fn build_json_statement(
    ctx: &mut BuildContext,
    state: &mut NodeState,
    ty: &'static TypeDescriptor,
    json: &JsonInsert,
) -> Result<String, QueryError> {
    let depth_count = json.depths.len();
    if depth_count == 0 {
        return Err(QueryError::InvalidDepthMap(
            "depth map has no levels".to_string(),
        ));
    }

    let type_name = ty.edgedb_name;

    for (index, level) in json.depths.iter().enumerate().rev() {
        let depth = index + 1;
        if !level.is_array() {
            return Err(QueryError::InvalidDepthMap(format!(
                "depth {depth} is not a JSON array"
            )));
        }

        let variable = ctx.variables.add(Value::Json(level.clone()));
        let shape = json_shape(ty, depth, depth_count)?;

        state.requires_introspection = true;
        ctx.request_introspection(ty);

        let sub_query = SubQuery::deferred(move |schema| {
            Ok(format!(
                "array_agg((for iter in json_array_unpack(<json>${variable}) union \
                 (insert {type_name} {{ {shape} }}{})))",
                conflict_suffix(ty, schema)
            ))
        });
        ctx.globals
            .add_named(format!("{type_name}_d{depth}"), sub_query, None);
    }

    Ok(format!("select array_unpack({type_name}_d1)"))
}

/// The shape body for one depth level.
fn json_shape(
    ty: &'static TypeDescriptor,
    depth: usize,
    max_depth: usize,
) -> Result<String, QueryError> {
    let mut parts = Vec::new();

    for prop in ty.shape_properties() {
        let name = prop.edgedb_name;
        match prop.kind {
            PropertyKind::Scalar => {
                let scalar =
                    prop.scalar_type
                        .ok_or_else(|| QueryError::UnserializableType {
                            type_name: ty.edgedb_name.to_string(),
                            property: prop.source_name.to_string(),
                        })?;
                parts.push(format!("{name} := <{scalar}>json_get(iter, '{name}')"));
            }
            // Terminal invariant: the deepest level links to nothing.
            PropertyKind::Link | PropertyKind::MultiLink if depth == max_depth => {
                parts.push(format!("{name} := {{}}"));
            }
            PropertyKind::Link => {
                let target = json_link_target(ty, prop.source_name)?;
                let next = depth + 1;
                parts.push(format!(
                    "{name} := {target}_d{next}[<int64>json_get(iter, '{name}', 'depth_index')] \
                     if json_typeof(json_get(iter, '{name}')) != 'null' else <{target}>{{}}"
                ));
            }
            PropertyKind::MultiLink => {
                let target = json_link_target(ty, prop.source_name)?;
                let next = depth + 1;
                parts.push(format!(
                    "{name} := distinct array_unpack({target}_d{next}[\
                     <int64>json_get(iter, '{name}', 'depth_from') ?? 0 : \
                     <int64>json_get(iter, '{name}', 'depth_to') ?? 0])"
                ));
            }
        }
    }

    Ok(parts.join(", "))
}

/// Depth levels hold rows of one type, so every link must target the bulk
/// insert's own type.
fn json_link_target(
    ty: &'static TypeDescriptor,
    source_name: &str,
) -> Result<&'static str, QueryError> {
    let target = ty
        .property(source_name)
        .and_then(|p| p.target())
        .ok_or_else(|| QueryError::UnserializableProperty {
            type_name: ty.edgedb_name.to_string(),
            property: source_name.to_string(),
        })?;
    if target.edgedb_name != ty.edgedb_name {
        return Err(QueryError::InvalidDepthMap(format!(
            "link '{}' targets '{}', but depth levels hold '{}' rows",
            source_name, target.edgedb_name, ty.edgedb_name
        )));
    }
    Ok(target.edgedb_name)
}
