#[macro_export]
macro_rules! value {
    ($val:expr) => {
        $crate::ast::expr::Expr::Value($val.into())
    };
}

/// Creates a member-path expression rooted in the implicit scope.
#[macro_export]
macro_rules! path {
    ($($seg:expr),+ $(,)?) => {
        $crate::ast::expr::Expr::Member($crate::ast::expr::Member {
            scope: $crate::ast::expr::Scope::It,
            path: vec![$($seg.to_string()),+],
        })
    };
}

/// Creates a member-path expression rooted in a named iterator.
#[macro_export]
macro_rules! iter_path {
    ($iter:expr, $($seg:expr),+ $(,)?) => {
        $crate::ast::expr::Expr::Member($crate::ast::expr::Member {
            scope: $crate::ast::expr::Scope::Iterator($iter.to_string()),
            path: vec![$($seg.to_string()),+],
        })
    };
}
