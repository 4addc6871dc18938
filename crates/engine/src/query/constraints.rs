use std::str::FromStr;

use sea_orm::{
    EntityName, EntityTrait, QueryFilter, QueryOrder, Value,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};

use crate::{EngineError, ResultEngine};

use super::{ArgValue, Constraint, Operator};

impl From<ArgValue> for Value {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Integer(v) => v.into(),
            ArgValue::Float(v) => v.into(),
            ArgValue::Decimal(v) => v.into(),
            ArgValue::Date(v) => v.into(),
            ArgValue::DateTime(v) => v.into(),
            ArgValue::Text(v) => v.into(),
            ArgValue::Boolean(v) => v.into(),
        }
    }
}

/// Fully qualified column of `E` named `field`.
pub(crate) fn column_expr<E>(field: &str) -> ResultEngine<Expr>
where
    E: EntityTrait,
{
    let column = E::Column::from_str(field).map_err(|_| {
        EngineError::Validation(format!("{field} is not a column of {}", E::default().table_name()))
    })?;
    Ok(Expr::col((E::default(), column)))
}

/// Bindable operand for a comparison.
///
/// Decimals reach SQLite as text. A bare column still coerces them through its
/// affinity, but an expression such as `ABS(col)` has none, so they are cast
/// to REAL explicitly.
pub(crate) fn operand(value: Value) -> SimpleExpr {
    match value {
        Value::Decimal(_) => Expr::val(value).cast_as(Alias::new("REAL")),
        other => Expr::val(other).into(),
    }
}

/// Reject opposing bounds on the same target that leave nothing to match,
/// e.g. `amount__ge=100` together with `amount__le=1`.
pub(crate) fn check_ranges(constraints: &[Constraint]) -> ResultEngine<()> {
    let lower = constraints
        .iter()
        .filter(|c| matches!(c.operator, Operator::Gt | Operator::Ge));
    for low in lower {
        let inverted = constraints.iter().find(|high| {
            matches!(high.operator, Operator::Lt | Operator::Le)
                && high.field == low.field
                && high.abs == low.abs
                && exceeds(&low.value, &high.value)
        });
        if let Some(high) = inverted {
            return Err(EngineError::Validation(format!(
                "invalid range: {}__{} must be <= {}__{}",
                low.field,
                low.operator.as_str(),
                high.field,
                high.operator.as_str()
            )));
        }
    }
    Ok(())
}

/// `true` when `low` is strictly above `high`. Values of different kinds
/// never compare.
fn exceeds(low: &ArgValue, high: &ArgValue) -> bool {
    match (low, high) {
        (ArgValue::Integer(l), ArgValue::Integer(h)) => l > h,
        (ArgValue::Float(l), ArgValue::Float(h)) => l > h,
        (ArgValue::Decimal(l), ArgValue::Decimal(h)) => l > h,
        (ArgValue::Date(l), ArgValue::Date(h)) => l > h,
        (ArgValue::DateTime(l), ArgValue::DateTime(h)) => l > h,
        (ArgValue::Text(l), ArgValue::Text(h)) => l > h,
        _ => false,
    }
}

/// AND every constraint onto `query`, each against the column of `E` it names.
///
/// Inverted ranges between constraints are a [`EngineError::Validation`].
pub fn apply_constraints<E, Q>(mut query: Q, constraints: &[Constraint]) -> ResultEngine<Q>
where
    E: EntityTrait,
    Q: QueryFilter,
{
    check_ranges(constraints)?;
    for constraint in constraints {
        let column = column_expr::<E>(constraint.field)?;
        let target = if constraint.abs {
            Expr::expr(Func::abs(column))
        } else {
            column
        };
        let value = operand(Value::from(constraint.value.clone()));
        let predicate: SimpleExpr = match constraint.operator {
            Operator::Eq => target.eq(value),
            Operator::Ne => target.ne(value),
            Operator::Gt => target.gt(value),
            Operator::Ge => target.gte(value),
            Operator::Le => target.lte(value),
            Operator::Lt => target.lt(value),
        };
        query = query.filter(predicate);
    }
    Ok(query)
}

/// Order by `primary`, then by `tie_break` in the same direction.
///
/// The tie-break must be unique so the resulting order is total, which keeps
/// offset pagination stable across equal primary keys.
pub(crate) fn order_with_tie_break<Q>(
    query: Q,
    primary: SimpleExpr,
    tie_break: SimpleExpr,
    descending: bool,
) -> Q
where
    Q: QueryOrder,
{
    let order = if descending {
        sea_orm::Order::Desc
    } else {
        sea_orm::Order::Asc
    };
    query
        .order_by(primary, order.clone())
        .order_by(tie_break, order)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;
    use crate::transactions;

    fn constraint(field: &'static str, operator: Operator, abs: bool, value: ArgValue) -> Constraint {
        Constraint {
            field,
            operator,
            abs,
            value,
        }
    }

    fn sql(constraints: &[Constraint]) -> String {
        apply_constraints::<transactions::Entity, _>(transactions::Entity::find(), constraints)
            .unwrap()
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn decimal_operands_are_compared_as_real() {
        let sql = sql(&[constraint(
            "amount",
            Operator::Ge,
            true,
            ArgValue::Decimal(dec!(50)),
        )]);
        assert!(
            sql.contains(r#"ABS("transactions"."amount") >= CAST("#),
            "{sql}"
        );
        assert!(sql.contains("AS REAL)"), "{sql}");
    }

    #[test]
    fn integer_operands_are_bound_as_is() {
        let sql = sql(&[constraint("id", Operator::Eq, false, ArgValue::Integer(3))]);
        assert!(sql.contains(r#""transactions"."id" = 3"#), "{sql}");
    }

    #[test]
    fn inverted_constraint_ranges_are_rejected() {
        let inverted = [
            constraint("amount", Operator::Ge, false, ArgValue::Decimal(dec!(100))),
            constraint("amount", Operator::Le, false, ArgValue::Decimal(dec!(1))),
        ];
        assert!(matches!(
            check_ranges(&inverted),
            Err(EngineError::Validation(_))
        ));

        let day = |d| ArgValue::Date(NaiveDate::from_ymd_opt(2024, 3, d).unwrap());
        let dates = [
            constraint("timestamp", Operator::Gt, false, day(9)),
            constraint("timestamp", Operator::Lt, false, day(2)),
        ];
        assert!(check_ranges(&dates).is_err());
    }

    #[test]
    fn bounds_on_different_targets_are_independent() {
        let constraints = [
            constraint("amount", Operator::Ge, true, ArgValue::Decimal(dec!(100))),
            constraint("amount", Operator::Le, false, ArgValue::Decimal(dec!(1))),
            constraint("account_balance", Operator::Le, true, ArgValue::Decimal(dec!(5))),
            constraint("id", Operator::Ge, false, ArgValue::Integer(2)),
            constraint("id", Operator::Le, false, ArgValue::Integer(2)),
        ];
        assert!(check_ranges(&constraints).is_ok());
    }
}
