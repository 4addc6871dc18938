//! Declarative filtering: per-field operators, synthesized query-argument
//! schemas, and their translation onto storage queries.

mod constraints;
mod operators;
mod schema;
mod search;

pub use constraints::apply_constraints;
pub(crate) use constraints::{column_expr, operand, order_with_tie_break};
pub use operators::{FieldType, Operator, OperatorSet, ScalarType, operators_for};
pub use schema::{
    ArgField, ArgValue, Constraint, Direction, EntitySchema, OrderToken, QueryArgSchema, QueryArgs,
};
pub use search::{SearchFilter, TokenSearch};
