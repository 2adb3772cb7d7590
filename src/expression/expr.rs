use crate::{AsValue, BinaryOpType, UnaryOpType, Value};

/// Tagged predicate/arithmetic expression tree.
///
/// Built through [`col`] / [`lit`] and the combinator methods; never
/// evaluated, only rendered to script text by a
/// [`ScriptWriter`](crate::ScriptWriter). Column access is a first-class
/// node, so `col("Age")` renders as the bare identifier `Age` with no
/// side-table lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Unary {
        op: UnaryOpType,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOpType,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Field access on the queried table.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Literal operand.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Anything usable as an expression operand: an [`Expr`] as-is, or any value
/// convertible through [`AsValue`], wrapped as a literal.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Literal(self)
    }
}

impl<T: AsValue> IntoExpr for T {
    fn into_expr(self) -> Expr {
        Expr::Literal(self.as_value())
    }
}

macro_rules! binary {
    ($name:ident, $op:ident) => {
        pub fn $name(self, rhs: impl IntoExpr) -> Expr {
            Expr::Binary {
                op: BinaryOpType::$op,
                lhs: Box::new(self),
                rhs: Box::new(rhs.into_expr()),
            }
        }
    };
}

impl Expr {
    binary!(eq, Equal);
    binary!(ne, NotEqual);
    binary!(lt, Less);
    binary!(gt, Greater);
    binary!(le, LessEqual);
    binary!(ge, GreaterEqual);
    binary!(add, Addition);
    binary!(sub, Subtraction);
    binary!(mul, Multiplication);
    binary!(div, Division);
    binary!(rem, Remainder);
    binary!(and, And);
    binary!(or, Or);

    pub fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOpType::Not,
            arg: Box::new(self),
        }
    }

    pub fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOpType::Negative,
            arg: Box::new(self),
        }
    }

    pub fn is_null(self) -> Expr {
        Expr::Unary {
            op: UnaryOpType::IsNull,
            arg: Box::new(self),
        }
    }
}

/// Zero-data stand-in for the record being queried. Field access yields an
/// [`Expr::Column`] node instead of reading a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholder;

impl Placeholder {
    pub fn field(&self, name: &str) -> Expr {
        col(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_tagged_nodes() {
        let expr = col("Age").gt(30).and(col("Name").eq("Ada"));
        let Expr::Binary { op, lhs, rhs } = expr else {
            panic!("expected a binary node");
        };
        assert_eq!(op, BinaryOpType::And);
        assert_eq!(
            *lhs,
            Expr::Binary {
                op: BinaryOpType::Greater,
                lhs: Box::new(Expr::Column("Age".into())),
                rhs: Box::new(Expr::Literal(Value::Int64(Some(30)))),
            }
        );
        assert_eq!(
            *rhs,
            Expr::Binary {
                op: BinaryOpType::Equal,
                lhs: Box::new(Expr::Column("Name".into())),
                rhs: Box::new(Expr::Literal(Value::Varchar(Some("Ada".into())))),
            }
        );
    }

    #[test]
    fn placeholder_field_access_is_a_column_node() {
        let row = Placeholder;
        assert_eq!(row.field("Id"), Expr::Column("Id".into()));
    }
}
