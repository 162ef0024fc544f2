//! Shape construction shared by the insert and update nodes: scalar
//! serialization, link resolution, and the inline-or-globalize rule.

use crate::error::QueryError;
use crate::node::{BuildContext, NodeState};
use crate::vars::SubQuery;
use model::{
    core::value::Value,
    schema::descriptor::{PropertyKind, TypeDescriptor},
    schema::info::SchemaInfo,
    schema::object::{ref_id, PropertyValue, SchemaObject},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShapeMode {
    Insert,
    Update,
}

/// Serializes the shape body (without braces) for a typed object.
///
/// Scalars become bound variables, links go through [`resolve_link`]. In
/// update mode, `Nothing`-valued scalars are omitted so partial updates
/// stay expressible; in insert mode they render the empty set.
pub(crate) fn object_shape(
    ctx: &mut BuildContext,
    state: &mut NodeState,
    ty: &'static TypeDescriptor,
    obj: &dyn SchemaObject,
    mode: ShapeMode,
) -> Result<String, QueryError> {
    let mut parts = Vec::new();

    for prop in ty.shape_properties() {
        let value = obj.property(prop.source_name).ok_or_else(|| {
            QueryError::UnserializableProperty {
                type_name: ty.edgedb_name.to_string(),
                property: prop.source_name.to_string(),
            }
        })?;

        match (prop.kind, value) {
            (PropertyKind::Scalar, PropertyValue::Scalar(v)) => {
                if v.is_nothing() {
                    if mode == ShapeMode::Insert {
                        parts.push(format!("{} := {{}}", prop.edgedb_name));
                    }
                    continue;
                }
                let scalar = v.edgeql_type().ok_or_else(|| QueryError::UnserializableType {
                    type_name: ty.edgedb_name.to_string(),
                    property: prop.source_name.to_string(),
                })?;
                let name = ctx.variables.add(v);
                parts.push(format!("{} := <{}>${}", prop.edgedb_name, scalar, name));
            }
            (PropertyKind::Link, PropertyValue::Link(None)) => {
                parts.push(format!("{} := {{}}", prop.edgedb_name));
            }
            (PropertyKind::Link, PropertyValue::Link(Some(child))) => {
                let target = link_target(ty, prop.source_name)?;
                let resolved = resolve_link(ctx, state, target, child)?;
                parts.push(format!("{} := {}", prop.edgedb_name, resolved));
            }
            (PropertyKind::MultiLink, PropertyValue::MultiLink(children)) => {
                if children.is_empty() {
                    parts.push(format!("{} := {{}}", prop.edgedb_name));
                    continue;
                }
                let target = link_target(ty, prop.source_name)?;
                let mut resolved = Vec::with_capacity(children.len());
                for child in children {
                    resolved.push(resolve_link(ctx, state, target, child)?);
                }
                parts.push(format!("{} := {{ {} }}", prop.edgedb_name, resolved.join(", ")));
            }
            _ => {
                return Err(QueryError::UnserializableProperty {
                    type_name: ty.edgedb_name.to_string(),
                    property: prop.source_name.to_string(),
                })
            }
        }
    }

    Ok(parts.join(", "))
}

fn link_target(
    ty: &'static TypeDescriptor,
    source_name: &str,
) -> Result<&'static TypeDescriptor, QueryError> {
    ty.property(source_name)
        .and_then(|p| p.target())
        .ok_or_else(|| QueryError::UnserializableProperty {
            type_name: ty.edgedb_name.to_string(),
            property: source_name.to_string(),
        })
}

/// Resolves one link value to query text: either a reference to the
/// already-stored object by id, or a deferred insert-or-select of a new
/// object. The result is an inlined sub-query or a global name, per
/// [`inline_or_global`].
pub(crate) fn resolve_link(
    ctx: &mut BuildContext,
    state: &mut NodeState,
    target: &'static TypeDescriptor,
    child: &dyn SchemaObject,
) -> Result<String, QueryError> {
    let reference = ref_id(child);

    // A second resolver for the same object reuses its global outright,
    // before any new variables are allocated for a duplicate shape.
    if let Some(existing) = ctx.globals.find_reference(reference) {
        return Ok(existing.name.clone());
    }

    if let Some(id) = child.object_id() {
        let text = format!(
            "select {} filter .id = {}",
            target.edgedb_name,
            Value::Uuid(id)
        );
        return Ok(inline_or_global(
            ctx,
            state,
            target,
            SubQuery::Ready(text),
            Some(reference),
        ));
    }

    state.requires_introspection = true;
    ctx.request_introspection(target);

    let shape = object_shape(ctx, state, target, child, ShapeMode::Insert)?;
    let sub_query = deferred_insert(target, shape);
    Ok(inline_or_global(
        ctx,
        state,
        target,
        sub_query,
        Some(reference),
    ))
}

/// An insert-or-select of `target` whose conflict clause is synthesized
/// once schema facts are known.
fn deferred_insert(target: &'static TypeDescriptor, shape: String) -> SubQuery {
    SubQuery::deferred(move |schema| {
        let type_name = target.edgedb_name;
        let body = if shape.is_empty() {
            format!("insert {type_name}")
        } else {
            format!("insert {type_name} {{ {shape} }}")
        };
        Ok(format!("{}{}", body, conflict_suffix(target, schema)))
    })
}

/// Decides whether a sub-query is inlined at its use site or promoted to a
/// deduplicated global.
///
/// Promotion happens when the node already inlined a sub-query for the same
/// type (one statement must not inline two inserts of one type), or when
/// the sub-query needs introspection and therefore cannot be rendered yet.
pub(crate) fn inline_or_global(
    ctx: &mut BuildContext,
    state: &mut NodeState,
    ty: &'static TypeDescriptor,
    sub_query: SubQuery,
    reference: Option<model::schema::object::RefId>,
) -> String {
    let can_inline = !state.inlined_types.contains(ty.edgedb_name)
        && !sub_query.requires_introspection();

    if can_inline {
        if let SubQuery::Ready(text) = &sub_query {
            state.inlined_types.insert(ty.edgedb_name);
            return format!("({text})");
        }
    }

    ctx.globals.get_or_add(reference, sub_query)
}

/// All exclusive property names for `ty`: the introspected constraints
/// when the schema knows the type, the descriptor's declarations otherwise.
pub(crate) fn exclusive_names(ty: &'static TypeDescriptor, schema: &SchemaInfo) -> Vec<String> {
    match schema.object(ty) {
        Some(info) if !info.exclusives.is_empty() => info
            .exclusive_property_names()
            .into_iter()
            .map(String::from)
            .collect(),
        _ => ty
            .exclusive_properties()
            .map(|p| p.edgedb_name.to_string())
            .collect(),
    }
}

/// `.prop` for one exclusive property, `(.a, .b, …)` for several.
pub(crate) fn conflict_target(names: &[String]) -> String {
    if names.len() == 1 {
        format!(".{}", names[0])
    } else {
        let dotted: Vec<String> = names.iter().map(|n| format!(".{n}")).collect();
        format!("({})", dotted.join(", "))
    }
}

/// ` unless conflict on … else (select T)`, or nothing when the type has
/// no exclusive constraints to conflict on.
pub(crate) fn conflict_suffix(ty: &'static TypeDescriptor, schema: &SchemaInfo) -> String {
    let names = exclusive_names(ty, schema);
    if names.is_empty() {
        return String::new();
    }
    format!(
        " unless conflict on {} else (select {})",
        conflict_target(&names),
        ty.edgedb_name
    )
}
