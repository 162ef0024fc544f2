//! Translates abstract expression trees into EdgeQL fragments.

pub mod operators;

use crate::ast::expr::{Conditional, Expr, Member, Scope};
use crate::error::QueryError;
use model::schema::descriptor::{PropertyKind, TypeDescriptor};

/// A single-pass expression translator.
///
/// One instance translates expressions against one operating type; member
/// paths rooted in the implicit scope are resolved through that type's
/// descriptor. Nested lambdas push their parameter onto the scope stack so
/// inner iterators shadow outer ones.
pub struct Translator {
    ty: &'static TypeDescriptor,
    scopes: Vec<String>,
}

impl Translator {
    pub fn new(ty: &'static TypeDescriptor) -> Self {
        Self {
            ty,
            scopes: Vec::new(),
        }
    }

    pub fn translate(&mut self, expr: &Expr) -> Result<String, QueryError> {
        match expr {
            Expr::Value(value) => Ok(value.to_string()),
            Expr::Raw(text) => Ok(text.clone()),
            Expr::Member(member) => self.member(member),
            Expr::Binary(binary) => {
                let left = self.translate(&binary.left)?;
                let right = self.translate(&binary.right)?;
                let template = operators::binary_template(binary.op).ok_or_else(|| {
                    QueryError::UnsupportedExpression(format!(
                        "binary operator {:?} has no registered template",
                        binary.op
                    ))
                })?;
                operators::render_template(template, &[Some(left), Some(right)])
            }
            Expr::Unary(unary) => {
                let operand = self.translate(&unary.operand)?;
                let template = operators::unary_template(unary.op).ok_or_else(|| {
                    QueryError::UnsupportedExpression(format!(
                        "unary operator {:?} has no registered template",
                        unary.op
                    ))
                })?;
                operators::render_template(template, &[Some(operand)])
            }
            Expr::Call(call) => {
                let template = operators::function_template(&call.name).ok_or_else(|| {
                    QueryError::UnsupportedExpression(format!(
                        "call to unregistered function '{}'",
                        call.name
                    ))
                })?;
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.translate(arg).map(Some))
                    .collect::<Result<Vec<_>, _>>()?;
                operators::render_template(template, &args)
            }
            Expr::Conditional(conditional) => self.conditional(conditional),
            Expr::Shape(fields) => {
                let parts = fields
                    .iter()
                    .map(|(name, value)| {
                        let mapped = self.map_shape_name(name);
                        let value = self.translate(value)?;
                        Ok(format!("{mapped} := {value}"))
                    })
                    .collect::<Result<Vec<_>, QueryError>>()?;
                Ok(format!("{{ {} }}", parts.join(", ")))
            }
            Expr::Lambda(lambda) => {
                self.scopes.push(lambda.parameter.clone());
                let body = self.translate(&lambda.body);
                self.scopes.pop();
                body
            }
        }
    }

    fn conditional(&mut self, conditional: &Conditional) -> Result<String, QueryError> {
        let when_true = self.translate(&conditional.when_true)?;
        let condition = self.translate(&conditional.condition)?;
        let when_false = self.translate(&conditional.when_false)?;
        Ok(format!("{when_true} if {condition} else {when_false}"))
    }

    /// Maps a member path through the operating type's descriptors,
    /// following link targets segment by segment.
    fn member(&self, member: &Member) -> Result<String, QueryError> {
        if member.path.is_empty() {
            return Err(QueryError::UnsupportedExpression(
                "member access with an empty path".to_string(),
            ));
        }

        let strict = matches!(member.scope, Scope::It);
        let mut segments = Vec::with_capacity(member.path.len());
        let mut descriptor = Some(self.ty);

        for segment in &member.path {
            let property = descriptor.and_then(|d| d.property(segment));
            match property {
                Some(p) => {
                    segments.push(p.edgedb_name.to_string());
                    descriptor = match p.kind {
                        PropertyKind::Link | PropertyKind::MultiLink => p.target(),
                        PropertyKind::Scalar => None,
                    };
                }
                None if strict => {
                    return Err(QueryError::UnsupportedExpression(format!(
                        "unknown member '{}' on type '{}'",
                        segment, self.ty.edgedb_name
                    )))
                }
                // Iterator scopes may range over values the descriptor
                // table knows nothing about; keep the segment verbatim.
                None => {
                    segments.push(segment.clone());
                    descriptor = None;
                }
            }
        }

        let path = segments.join(".");
        match &member.scope {
            // Inside a lambda the implicit scope is the lambda's own
            // parameter; at the top level it is the leading-dot path.
            Scope::It => match self.scopes.last() {
                Some(parameter) => Ok(format!("{parameter}.{path}")),
                None => Ok(format!(".{path}")),
            },
            Scope::Iterator(name) => Ok(format!("{name}.{path}")),
        }
    }

    fn map_shape_name(&self, source_name: &str) -> String {
        self.ty
            .property(source_name)
            .map(|p| p.edgedb_name.to_string())
            .unwrap_or_else(|| source_name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::{FunctionCall, Lambda};
    use crate::{prop, val};
    use model::schema::descriptor::PropertyDescriptor;

    static PERSON: TypeDescriptor = TypeDescriptor {
        edgedb_name: "Person",
        properties: &[
            PropertyDescriptor {
                source_name: "name",
                edgedb_name: "name",
                kind: PropertyKind::Scalar,
                link_target: None,
                scalar_type: Some("str"),
                exclusive: true,
                id: false,
                ignored: false,
            },
            PropertyDescriptor {
                source_name: "age",
                edgedb_name: "age",
                kind: PropertyKind::Scalar,
                link_target: None,
                scalar_type: Some("int64"),
                exclusive: false,
                id: false,
                ignored: false,
            },
            PropertyDescriptor {
                source_name: "best_friend",
                edgedb_name: "best_friend",
                kind: PropertyKind::Link,
                link_target: Some(|| &PERSON),
                scalar_type: None,
                exclusive: false,
                id: false,
                ignored: false,
            },
        ],
    };

    #[test]
    fn test_filter_translation() {
        let expr = prop("age").gt(18i64).and(prop("name").eq("Alice"));
        let text = Translator::new(&PERSON).translate(&expr).unwrap();
        assert_eq!(text, ".age > 18 and .name = \"Alice\"");
    }

    #[test]
    fn test_member_path_follows_links() {
        let expr = prop("best_friend.name").eq("Bob");
        let text = Translator::new(&PERSON).translate(&expr).unwrap();
        assert_eq!(text, ".best_friend.name = \"Bob\"");
    }

    #[test]
    fn test_unknown_member_fails() {
        let expr = prop("nickname").eq("Al");
        let err = Translator::new(&PERSON).translate(&expr).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedExpression(_)));
    }

    #[test]
    fn test_unregistered_call_fails() {
        let expr = Expr::Call(FunctionCall {
            name: "frobnicate".to_string(),
            args: vec![val(1i64)],
        });
        let err = Translator::new(&PERSON).translate(&expr).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedExpression(_)));
    }

    #[test]
    fn test_registered_call_renders_template() {
        let expr = prop("name").call("str_upper", vec![]);
        let text = Translator::new(&PERSON).translate(&expr).unwrap();
        assert_eq!(text, "str_upper(.name)");
    }

    #[test]
    fn test_conditional() {
        let expr = val("adult").if_else(prop("age").gt_eq(18i64), val("minor"));
        let text = Translator::new(&PERSON).translate(&expr).unwrap();
        assert_eq!(text, "\"adult\" if .age >= 18 else \"minor\"");
    }

    #[test]
    fn test_shape_maps_names() {
        let expr = Expr::Shape(vec![
            ("name".to_string(), val("Alice")),
            ("age".to_string(), val(30i64)),
        ]);
        let text = Translator::new(&PERSON).translate(&expr).unwrap();
        assert_eq!(text, "{ name := \"Alice\", age := 30 }");
    }

    #[test]
    fn test_lambda_parameter_becomes_the_implicit_scope() {
        let expr = Expr::Lambda(Box::new(Lambda {
            parameter: "friend".to_string(),
            body: prop("name").eq("Bob"),
        }));
        let text = Translator::new(&PERSON).translate(&expr).unwrap();
        assert_eq!(text, "friend.name = \"Bob\"");
    }

    #[test]
    fn test_lambda_scope_renders_iterator_member() {
        let body = Expr::Member(Member {
            scope: Scope::Iterator("friend".to_string()),
            path: vec!["name".to_string()],
        });
        let expr = Expr::Lambda(Box::new(Lambda {
            parameter: "friend".to_string(),
            body: body.eq("Bob"),
        }));
        let text = Translator::new(&PERSON).translate(&expr).unwrap();
        assert_eq!(text, "friend.name = \"Bob\"");
    }
}
