use crate::ast::expr::{Expr, FunctionCall, Member, Scope, UnaryExpr, UnaryOperator};
use model::core::value::Value;

pub mod ast;
pub mod builder;
pub mod error;
pub mod macros;
pub mod node;
pub mod translate;
pub mod vars;

pub use builder::{BuiltQuery, QueryBuilder, SchemaProvider};
pub use error::QueryError;

/// A member path in the implicit scope: `prop("age")` renders `.age`,
/// `prop("friend.name")` renders `.friend.name`.
pub fn prop(path: &str) -> Expr {
    Expr::Member(Member {
        scope: Scope::It,
        path: path.split('.').map(str::to_string).collect(),
    })
}

/// A member path rooted in a named iterator: `iter_prop("x", "name")`
/// renders `x.name`.
pub fn iter_prop(iterator: &str, path: &str) -> Expr {
    Expr::Member(Member {
        scope: Scope::Iterator(iterator.to_string()),
        path: path.split('.').map(str::to_string).collect(),
    })
}

/// A constant expression.
pub fn val(value: impl Into<Value>) -> Expr {
    Expr::Value(value.into())
}

pub fn not(operand: impl Into<Expr>) -> Expr {
    Expr::Unary(Box::new(UnaryExpr {
        op: UnaryOperator::Not,
        operand: operand.into(),
    }))
}

pub fn exists(operand: impl Into<Expr>) -> Expr {
    Expr::Unary(Box::new(UnaryExpr {
        op: UnaryOperator::Exists,
        operand: operand.into(),
    }))
}

/// A call to a registered EdgeQL function.
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(FunctionCall {
        name: name.to_string(),
        args,
    })
}
