//! The operator registry: EdgeQL rendering templates for expression kinds
//! and function calls.

use crate::ast::expr::{BinaryOperator, UnaryOperator};
use crate::error::QueryError;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// The expression kind an operator is attached to, when it is not a plain
/// function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    Binary(BinaryOperator),
    Unary(UnaryOperator),
}

/// One renderable EdgeQL operator.
///
/// `template` positions arguments as `{0}`, `{1}`, …; a trailing `?` marks
/// the parameter optional, e.g. `to_bigint({0}, {1?})`.
#[derive(Debug, Clone, Copy)]
pub struct EdgeQLOperator {
    pub expression: Option<ExpressionKind>,
    pub function: Option<&'static str>,
    pub template: &'static str,
}

const fn binary(op: BinaryOperator, template: &'static str) -> EdgeQLOperator {
    EdgeQLOperator {
        expression: Some(ExpressionKind::Binary(op)),
        function: None,
        template,
    }
}

const fn unary(op: UnaryOperator, template: &'static str) -> EdgeQLOperator {
    EdgeQLOperator {
        expression: Some(ExpressionKind::Unary(op)),
        function: None,
        template,
    }
}

const fn function(name: &'static str, template: &'static str) -> EdgeQLOperator {
    EdgeQLOperator {
        expression: None,
        function: Some(name),
        template,
    }
}

/// The flat operator table, populated once at startup.
pub static OPERATORS: &[EdgeQLOperator] = &[
    binary(BinaryOperator::Eq, "{0} = {1}"),
    binary(BinaryOperator::NotEq, "{0} != {1}"),
    binary(BinaryOperator::Lt, "{0} < {1}"),
    binary(BinaryOperator::LtEq, "{0} <= {1}"),
    binary(BinaryOperator::Gt, "{0} > {1}"),
    binary(BinaryOperator::GtEq, "{0} >= {1}"),
    binary(BinaryOperator::And, "{0} and {1}"),
    binary(BinaryOperator::Or, "{0} or {1}"),
    binary(BinaryOperator::Add, "{0} + {1}"),
    binary(BinaryOperator::Subtract, "{0} - {1}"),
    binary(BinaryOperator::Multiply, "{0} * {1}"),
    binary(BinaryOperator::Divide, "{0} / {1}"),
    binary(BinaryOperator::Modulo, "{0} % {1}"),
    binary(BinaryOperator::Concat, "{0} ++ {1}"),
    binary(BinaryOperator::Coalesce, "{0} ?? {1}"),
    binary(BinaryOperator::In, "{0} in {1}"),
    binary(BinaryOperator::Like, "{0} like {1}"),
    binary(BinaryOperator::ILike, "{0} ilike {1}"),
    unary(UnaryOperator::Not, "not {0}"),
    unary(UnaryOperator::Negate, "-{0}"),
    unary(UnaryOperator::Exists, "exists {0}"),
    function("len", "len({0})"),
    function("count", "count({0})"),
    function("sum", "sum({0})"),
    function("min", "min({0})"),
    function("max", "max({0})"),
    function("mean", "math::mean({0})"),
    function("contains", "contains({0}, {1})"),
    function("find", "find({0}, {1})"),
    function("str_lower", "str_lower({0})"),
    function("str_upper", "str_upper({0})"),
    function("str_trim", "str_trim({0}, {1?})"),
    function("str_split", "str_split({0}, {1})"),
    function("to_str", "to_str({0}, {1?})"),
    function("to_int16", "to_int16({0}, {1?})"),
    function("to_int32", "to_int32({0}, {1?})"),
    function("to_int64", "to_int64({0}, {1?})"),
    function("to_bigint", "to_bigint({0}, {1?})"),
    function("to_decimal", "to_decimal({0}, {1?})"),
    function("to_float32", "to_float32({0}, {1?})"),
    function("to_float64", "to_float64({0}, {1?})"),
    function("round", "round({0}, {1?})"),
    function("random", "random()"),
    function("datetime_current", "datetime_current()"),
    function("datetime_of_statement", "datetime_of_statement()"),
    function("uuid_generate_v1mc", "uuid_generate_v1mc()"),
    function("json_get", "json_get({0}, {1}, {2?})"),
    function("json_typeof", "json_typeof({0})"),
    function("json_array_unpack", "json_array_unpack({0})"),
    function("array_agg", "array_agg({0})"),
    function("array_unpack", "array_unpack({0})"),
    function("array_join", "array_join({0}, {1})"),
    function("distinct", "distinct {0}"),
    function("assert_single", "assert_single({0})"),
];

lazy_static! {
    static ref BINARY_TEMPLATES: HashMap<BinaryOperator, &'static str> = OPERATORS
        .iter()
        .filter_map(|op| match op.expression {
            Some(ExpressionKind::Binary(kind)) => Some((kind, op.template)),
            _ => None,
        })
        .collect();
    static ref UNARY_TEMPLATES: HashMap<UnaryOperator, &'static str> = OPERATORS
        .iter()
        .filter_map(|op| match op.expression {
            Some(ExpressionKind::Unary(kind)) => Some((kind, op.template)),
            _ => None,
        })
        .collect();
    static ref FUNCTION_TEMPLATES: HashMap<&'static str, &'static str> = OPERATORS
        .iter()
        .filter_map(|op| op.function.map(|name| (name, op.template)))
        .collect();
}

pub fn binary_template(op: BinaryOperator) -> Option<&'static str> {
    BINARY_TEMPLATES.get(&op).copied()
}

pub fn unary_template(op: UnaryOperator) -> Option<&'static str> {
    UNARY_TEMPLATES.get(&op).copied()
}

pub fn function_template(name: &str) -> Option<&'static str> {
    FUNCTION_TEMPLATES.get(name).copied()
}

/// Substitutes `args` into a template. A missing optional argument is
/// omitted together with the separator preceding it.
pub fn render_template(
    template: &'static str,
    args: &[Option<String>],
) -> Result<String, QueryError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }

        let mut index = 0usize;
        let mut digits = 0usize;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            index = index * 10 + d as usize;
            digits += 1;
            chars.next();
        }
        let optional = if chars.peek() == Some(&'?') {
            chars.next();
            true
        } else {
            false
        };
        if digits == 0 || chars.next() != Some('}') {
            return Err(QueryError::UnsupportedExpression(format!(
                "malformed operator template '{template}'"
            )));
        }

        match args.get(index).and_then(|a| a.as_ref()) {
            Some(text) => out.push_str(text),
            None if optional => {
                let trimmed = out.trim_end_matches(' ');
                let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
                out.truncate(trimmed.len());
            }
            None => {
                return Err(QueryError::UnsupportedExpression(format!(
                    "missing argument {index} for template '{template}'"
                )))
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_binary_operators_registered() {
        use BinaryOperator::*;
        for op in [
            Eq, NotEq, Lt, LtEq, Gt, GtEq, And, Or, Add, Subtract, Multiply, Divide, Modulo,
            Concat, Coalesce, In, Like, ILike,
        ] {
            assert!(binary_template(op).is_some(), "missing template for {op:?}");
        }
    }

    #[test]
    fn test_render_all_arguments() {
        let out = render_template(
            "contains({0}, {1})",
            &[Some(".tags".to_string()), Some("\"a\"".to_string())],
        )
        .unwrap();
        assert_eq!(out, "contains(.tags, \"a\")");
    }

    #[test]
    fn test_render_omits_missing_optional() {
        let out = render_template("to_bigint({0}, {1?})", &[Some("\"10\"".to_string())]).unwrap();
        assert_eq!(out, "to_bigint(\"10\")");

        let out = render_template(
            "to_bigint({0}, {1?})",
            &[Some("\"10\"".to_string()), Some("\"fmt\"".to_string())],
        )
        .unwrap();
        assert_eq!(out, "to_bigint(\"10\", \"fmt\")");
    }

    #[test]
    fn test_render_missing_required_fails() {
        let err = render_template("contains({0}, {1})", &[Some(".tags".to_string())]).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedExpression(_)));
    }
}
