//! Field types and the comparison operators each of them admits.

use std::{fmt, str::FromStr};

use crate::EngineError;

/// Semantic type of an entity field, as declared in an [`EntitySchema`].
///
/// [`EntitySchema`]: super::EntitySchema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Float,
    Decimal,
    Date,
    DateTime,
    Text,
    Boolean,
    /// A closed set of literal values. Never expanded into operators.
    Literal(&'static [&'static str]),
    /// Any of the listed types. `Union(&[T, Null])` is an optional `T`.
    Union(&'static [FieldType]),
    Null,
}

/// A concrete type operators can be generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Integer,
    Float,
    Decimal,
    Date,
    DateTime,
    Text,
    Boolean,
}

impl FieldType {
    /// Strip an optional wrapper and return the scalar underneath.
    ///
    /// Literals, bare `Null` and unions with more than one non-null member
    /// resolve to `None`.
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            FieldType::Integer => Some(ScalarType::Integer),
            FieldType::Float => Some(ScalarType::Float),
            FieldType::Decimal => Some(ScalarType::Decimal),
            FieldType::Date => Some(ScalarType::Date),
            FieldType::DateTime => Some(ScalarType::DateTime),
            FieldType::Text => Some(ScalarType::Text),
            FieldType::Boolean => Some(ScalarType::Boolean),
            FieldType::Literal(_) | FieldType::Null => None,
            FieldType::Union(members) => {
                let mut non_null = members.iter().filter(|m| **m != FieldType::Null);
                match (non_null.next(), non_null.next()) {
                    // Nested unions are not unwrapped twice.
                    (Some(FieldType::Union(_)), None) => None,
                    (Some(inner), None) => inner.scalar(),
                    _ => None,
                }
            }
        }
    }
}

impl ScalarType {
    /// Numeric and temporal types: fully ordered, orderable in `order_by`.
    pub const fn is_ordered(self) -> bool {
        matches!(
            self,
            ScalarType::Integer
                | ScalarType::Float
                | ScalarType::Decimal
                | ScalarType::Date
                | ScalarType::DateTime
        )
    }

    /// Whether `abs(field)` is meaningful for the type.
    pub const fn supports_abs(self) -> bool {
        matches!(
            self,
            ScalarType::Integer | ScalarType::Float | ScalarType::Decimal
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Decimal => "decimal",
            ScalarType::Date => "date",
            ScalarType::DateTime => "datetime",
            ScalarType::Text => "text",
            ScalarType::Boolean => "boolean",
        }
    }
}

/// Comparison operator, spelled as the `__<op>` suffix on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Le,
    Lt,
}

impl Operator {
    /// Operators of fully ordered types, in generation order.
    pub const ORDERED: &'static [Operator] = &[
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Le,
        Operator::Lt,
    ];

    /// Operators of types that only support equality.
    pub const EQUALITY: &'static [Operator] = &[Operator::Eq, Operator::Ne];

    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Le => "le",
            Operator::Lt => "lt",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ORDERED
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| EngineError::Validation(format!("unknown operator: {s}")))
    }
}

/// Legal operators of a field, and whether each has an `__abs` twin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperatorSet {
    pub scalar: ScalarType,
    pub operators: &'static [Operator],
    pub abs: bool,
}

/// Look up the operators a field of type `ty` exposes.
///
/// Returns `None` for fields excluded from expansion (literals, ambiguous
/// unions, bare null).
pub fn operators_for(ty: FieldType) -> Option<OperatorSet> {
    let scalar = ty.scalar()?;
    let operators = if scalar.is_ordered() {
        Operator::ORDERED
    } else {
        Operator::EQUALITY
    };
    Some(OperatorSet {
        scalar,
        operators,
        abs: scalar.supports_abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_types_get_all_operators_and_abs() {
        for ty in [FieldType::Integer, FieldType::Float, FieldType::Decimal] {
            let set = operators_for(ty).unwrap();
            assert_eq!(set.operators, Operator::ORDERED);
            assert!(set.abs);
        }
    }

    #[test]
    fn temporal_types_get_all_operators_without_abs() {
        for ty in [FieldType::Date, FieldType::DateTime] {
            let set = operators_for(ty).unwrap();
            assert_eq!(set.operators, Operator::ORDERED);
            assert!(!set.abs);
        }
    }

    #[test]
    fn text_and_boolean_get_equality_only() {
        for ty in [FieldType::Text, FieldType::Boolean] {
            let set = operators_for(ty).unwrap();
            assert_eq!(set.operators, &[Operator::Eq, Operator::Ne]);
            assert!(!set.abs);
        }
    }

    #[test]
    fn literals_and_ambiguous_unions_are_skipped() {
        assert_eq!(operators_for(FieldType::Literal(&["a", "b"])), None);
        assert_eq!(
            operators_for(FieldType::Union(&[FieldType::Integer, FieldType::Text])),
            None
        );
        assert_eq!(
            operators_for(FieldType::Union(&[
                FieldType::Integer,
                FieldType::Text,
                FieldType::Null
            ])),
            None
        );
        assert_eq!(operators_for(FieldType::Null), None);
    }

    #[test]
    fn optional_unwraps_to_inner_type() {
        let set = operators_for(FieldType::Union(&[FieldType::Date, FieldType::Null])).unwrap();
        assert_eq!(set.scalar, ScalarType::Date);
        let set = operators_for(FieldType::Union(&[FieldType::Null, FieldType::Boolean])).unwrap();
        assert_eq!(set.operators, Operator::EQUALITY);
        assert_eq!(
            operators_for(FieldType::Union(&[
                FieldType::Literal(&["x"]),
                FieldType::Null
            ])),
            None
        );
    }

    #[test]
    fn operator_round_trips_through_suffix() {
        for op in Operator::ORDERED {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), *op);
        }
        assert!("between".parse::<Operator>().is_err());
    }
}
