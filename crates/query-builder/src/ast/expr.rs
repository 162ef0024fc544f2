//! The abstract expression tree handed to the translator.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A property path rooted in a scope, e.g. `.age` or `item.name`.
    Member(Member),

    /// A constant, rendered in its EdgeQL literal form.
    Value(Value),

    /// A binary operation, e.g. `.age > 18`.
    Binary(Box<BinaryExpr>),

    /// A unary operation, e.g. `not .active` or `exists .friends`.
    Unary(Box<UnaryExpr>),

    /// A call to a registered EdgeQL function, e.g. `len(.name)`.
    Call(FunctionCall),

    /// `A if Cond else B`.
    Conditional(Box<Conditional>),

    /// A shape literal, `{ name := …, age := … }`. Field names are source
    /// names and are mapped to schema names during translation.
    Shape(Vec<(String, Expr)>),

    /// A nested scope introducing a named parameter, used by sub-queries
    /// inside filters and for-bodies.
    Lambda(Box<Lambda>),

    /// Verbatim EdgeQL text, e.g. a reference to a known global.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub scope: Scope,
    pub path: Vec<String>,
}

/// The root a member path is resolved against.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// The implicit scope of the enclosing clause; renders a leading dot.
    It,
    /// A named iterator introduced by a `for` clause or a nested lambda.
    Iterator(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Coalesce,
    In,
    Like,
    ILike,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOperator,
    pub operand: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
    Exists,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expr,
    pub when_true: Expr,
    pub when_false: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub parameter: String,
    pub body: Expr,
}

impl Expr {
    fn binary(self, op: BinaryOperator, right: impl Into<Expr>) -> Expr {
        Expr::Binary(Box::new(BinaryExpr {
            left: self,
            op,
            right: right.into(),
        }))
    }

    pub fn eq(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Eq, right)
    }

    pub fn not_eq(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::NotEq, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Lt, right)
    }

    pub fn lt_eq(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::LtEq, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Gt, right)
    }

    pub fn gt_eq(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::GtEq, right)
    }

    pub fn and(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::And, right)
    }

    pub fn or(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Or, right)
    }

    pub fn add(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Add, right)
    }

    pub fn subtract(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Subtract, right)
    }

    pub fn multiply(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Multiply, right)
    }

    pub fn divide(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Divide, right)
    }

    pub fn modulo(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Modulo, right)
    }

    pub fn concat(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Concat, right)
    }

    pub fn coalesce(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Coalesce, right)
    }

    pub fn in_set(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::In, right)
    }

    pub fn like(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Like, right)
    }

    pub fn ilike(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::ILike, right)
    }

    pub fn negate(self) -> Expr {
        Expr::Unary(Box::new(UnaryExpr {
            op: UnaryOperator::Negate,
            operand: self,
        }))
    }

    /// Calls a registered EdgeQL function with `self` as first argument.
    pub fn call(self, name: impl Into<String>, mut args: Vec<Expr>) -> Expr {
        let mut all = vec![self];
        all.append(&mut args);
        Expr::Call(FunctionCall {
            name: name.into(),
            args: all,
        })
    }

    pub fn if_else(self, condition: impl Into<Expr>, when_false: impl Into<Expr>) -> Expr {
        Expr::Conditional(Box::new(Conditional {
            condition: condition.into(),
            when_true: self,
            when_false: when_false.into(),
        }))
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Value(v)
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Expr::Value(Value::from(v))
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        Expr::Value(Value::from(v))
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Expr::Value(Value::from(v))
    }
}

impl From<i16> for Expr {
    fn from(v: i16) -> Self {
        Expr::Value(Value::from(v))
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Expr::Value(Value::from(v))
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::Value(Value::from(v))
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Value(Value::from(v))
    }
}
