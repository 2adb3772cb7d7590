mod binary_op;
mod expr;
mod unary_op;

pub use binary_op::*;
pub use expr::*;
pub use unary_op::*;
