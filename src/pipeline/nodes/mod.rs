//! Built-in filters.

pub mod copy_through;
pub mod double_to_integer;
pub mod expression;

pub use copy_through::CopyThroughFilter;
pub use double_to_integer::DoubleToIntegerFilter;
pub use expression::ExpressionFilter;
