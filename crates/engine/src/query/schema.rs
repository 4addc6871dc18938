//! Query-argument schemas synthesized from entity schemas.
//!
//! An [`EntitySchema`] is a static, ordered table of `(field, type)` pairs.
//! [`QueryArgSchema::synthesize`] expands it into the parameters a client may
//! send:
//!
//! - `<field>__<op>` for every legal operator of the field,
//! - `<field>__<op>__abs` for types supporting `abs()`,
//! - `page` and `per_page` (both `>= 0`, `per_page = 0` meaning unbounded),
//! - `order_by`, restricted to `<field>__asc` / `<field>__desc` tokens of the
//!   ordered fields.
//!
//! Every generated parameter is optional. [`QueryArgSchema::parse`] is the
//! boundary validation: values that do not fit the declared type are rejected,
//! nothing is coerced.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::{EngineError, ResultEngine};

use super::operators::{FieldType, Operator, ScalarType, operators_for};

const ABS_SUFFIX: &str = "abs";

/// Declarative description of an entity's filterable fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySchema {
    name: &'static str,
    fields: &'static [(&'static str, FieldType)],
}

impl EntitySchema {
    pub const fn new(name: &'static str, fields: &'static [(&'static str, FieldType)]) -> Self {
        Self { name, fields }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn fields(&self) -> &'static [(&'static str, FieldType)] {
        self.fields
    }
}

/// A generated `<field>__<op>[__abs]` parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgField {
    pub name: String,
    pub field: &'static str,
    pub operator: Operator,
    pub abs: bool,
    pub scalar: ScalarType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    pub const fn is_descending(self) -> bool {
        matches!(self, Direction::Desc)
    }
}

/// One value of the `order_by` enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OrderToken {
    pub field: &'static str,
    pub direction: Direction,
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}", self.field, self.direction.as_str())
    }
}

/// A validated parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
    Boolean(bool),
}

impl ArgValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ArgValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ArgValue::Decimal(value) => Some(*value),
            ArgValue::Integer(value) => Some(Decimal::from(*value)),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ArgValue::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

/// A single `field <op> value` constraint, possibly on `abs(field)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub field: &'static str,
    pub operator: Operator,
    pub abs: bool,
    pub value: ArgValue,
}

/// Parameters accepted by a [`QueryArgSchema`], after validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryArgs {
    pub page: u64,
    pub per_page: u64,
    pub order_by: Option<OrderToken>,
    pub constraints: Vec<Constraint>,
    pub extras: BTreeMap<&'static str, ArgValue>,
}

impl QueryArgs {
    /// The constraint on `field` with `operator`, if supplied.
    pub fn constraint(&self, field: &str, operator: Operator) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|c| c.field == field && c.operator == operator)
    }

    pub fn extra(&self, name: &str) -> Option<&ArgValue> {
        self.extras.get(name)
    }
}

/// The synthesized companion schema of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryArgSchema {
    entity: &'static str,
    fields: Vec<ArgField>,
    order_tokens: Vec<OrderToken>,
    extras: Vec<(&'static str, FieldType)>,
}

impl QueryArgSchema {
    /// Expand `schema` into its query-argument schema.
    ///
    /// Pure: the same input always yields an equal schema.
    pub fn synthesize(schema: &EntitySchema) -> Self {
        let mut fields = Vec::new();
        let mut order_tokens = Vec::new();

        for &(field, ty) in schema.fields() {
            let Some(set) = operators_for(ty) else {
                continue;
            };

            if set.scalar.is_ordered() {
                order_tokens.push(OrderToken {
                    field,
                    direction: Direction::Asc,
                });
                order_tokens.push(OrderToken {
                    field,
                    direction: Direction::Desc,
                });
            }

            for &operator in set.operators {
                fields.push(ArgField {
                    name: format!("{field}__{operator}"),
                    field,
                    operator,
                    abs: false,
                    scalar: set.scalar,
                });
                if set.abs {
                    fields.push(ArgField {
                        name: format!("{field}__{operator}__{ABS_SUFFIX}"),
                        field,
                        operator,
                        abs: true,
                        scalar: set.scalar,
                    });
                }
            }
        }

        Self {
            entity: schema.name(),
            fields,
            order_tokens,
            extras: Vec::new(),
        }
    }

    /// Declare an additional plain parameter (e.g. `search`).
    pub fn with_extra(mut self, name: &'static str, ty: FieldType) -> Self {
        self.extras.push((name, ty));
        self
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn fields(&self) -> &[ArgField] {
        &self.fields
    }

    pub fn order_tokens(&self) -> &[OrderToken] {
        &self.order_tokens
    }

    /// Every parameter name the schema accepts.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.iter().map(|f| f.name.clone()).collect();
        names.extend(self.extras.iter().map(|(name, _)| (*name).to_string()));
        names.extend(["page", "per_page", "order_by"].map(String::from));
        names
    }

    /// Validate raw `(name, value)` pairs against the schema.
    pub fn parse<I, K, V>(&self, pairs: I) -> ResultEngine<QueryArgs>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut args = QueryArgs::default();
        let mut seen: Vec<String> = Vec::new();
        let mut abs_flags: Vec<(&ArgField, bool)> = Vec::new();

        for (key, raw) in pairs {
            let (key, raw) = (key.as_ref(), raw.as_ref());
            if seen.iter().any(|s| s == key) {
                return Err(EngineError::Validation(format!(
                    "duplicate parameter: {key}"
                )));
            }
            seen.push(key.to_string());

            match key {
                "page" => args.page = parse_count(key, raw)?,
                "per_page" => args.per_page = parse_count(key, raw)?,
                "order_by" => {
                    let token = self
                        .order_tokens
                        .iter()
                        .find(|t| t.to_string() == raw)
                        .ok_or_else(|| {
                            EngineError::Validation(format!("invalid order_by: {raw}"))
                        })?;
                    args.order_by = Some(*token);
                }
                _ => {
                    if let Some((name, ty)) = self.extras.iter().find(|(name, _)| *name == key) {
                        args.extras.insert(*name, parse_field_value(key, *ty, raw)?);
                        continue;
                    }

                    let field = self
                        .fields
                        .iter()
                        .find(|f| f.name == key)
                        .ok_or_else(|| {
                            EngineError::Validation(format!(
                                "unknown parameter for {}: {key}",
                                self.entity
                            ))
                        })?;

                    match parse_scalar(key, field.scalar, raw) {
                        Ok(value) => args.constraints.push(Constraint {
                            field: field.field,
                            operator: field.operator,
                            abs: field.abs,
                            value,
                        }),
                        // `<field>__<op>__abs=true` marks the sibling
                        // constraint as an absolute-value one.
                        Err(err) if field.abs => match raw {
                            "true" => abs_flags.push((field, true)),
                            "false" => abs_flags.push((field, false)),
                            _ => return Err(err),
                        },
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        for (field, enabled) in abs_flags {
            let sibling = args
                .constraints
                .iter_mut()
                .find(|c| c.field == field.field && c.operator == field.operator && !c.abs)
                .ok_or_else(|| {
                    EngineError::Validation(format!(
                        "{} requires {}__{}",
                        field.name, field.field, field.operator
                    ))
                })?;
            sibling.abs = enabled;
        }

        Ok(args)
    }
}

fn parse_count(key: &str, raw: &str) -> ResultEngine<u64> {
    raw.parse::<u64>().map_err(|_| {
        EngineError::Validation(format!("{key} must be an integer >= 0, got {raw:?}"))
    })
}

fn parse_field_value(key: &str, ty: FieldType, raw: &str) -> ResultEngine<ArgValue> {
    if let FieldType::Literal(values) = ty {
        return if values.contains(&raw) {
            Ok(ArgValue::Text(raw.to_string()))
        } else {
            Err(EngineError::Validation(format!(
                "{key} must be one of {values:?}, got {raw:?}"
            )))
        };
    }
    let scalar = ty.scalar().ok_or_else(|| {
        EngineError::Validation(format!("{key} has no usable type"))
    })?;
    parse_scalar(key, scalar, raw)
}

fn parse_scalar(key: &str, scalar: ScalarType, raw: &str) -> ResultEngine<ArgValue> {
    let invalid = || {
        EngineError::Validation(format!(
            "{key} expects a {} value, got {raw:?}",
            scalar.as_str()
        ))
    };
    let value = match scalar {
        ScalarType::Integer => ArgValue::Integer(raw.parse().map_err(|_| invalid())?),
        ScalarType::Float => {
            let value: f64 = raw.parse().map_err(|_| invalid())?;
            if !value.is_finite() {
                return Err(invalid());
            }
            ArgValue::Float(value)
        }
        ScalarType::Decimal => {
            ArgValue::Decimal(Decimal::from_str(raw.trim()).map_err(|_| invalid())?)
        }
        ScalarType::Date => ArgValue::Date(raw.parse().map_err(|_| invalid())?),
        ScalarType::DateTime => ArgValue::DateTime(raw.parse().map_err(|_| invalid())?),
        ScalarType::Text => ArgValue::Text(raw.to_string()),
        ScalarType::Boolean => match raw {
            "true" => ArgValue::Boolean(true),
            "false" => ArgValue::Boolean(false),
            _ => return Err(invalid()),
        },
    };
    Ok(value)
}
