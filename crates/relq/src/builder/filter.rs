//! WHERE and HAVING predicates.
//!
//! Plain methods append with `AND`, `or_*` methods with `OR`. The joiner of
//! the first node in a list is never rendered.

use super::QueryBuilder;
use crate::clause::{DatePart, Fragment, Joiner, Predicate, Subquery, WhereNode};
use crate::error::{RelqError, RelqResult};
use crate::value::Value;
use chrono::Datelike;

impl QueryBuilder {
    fn push_where(&mut self, joiner: Joiner, predicate: Predicate) -> &mut Self {
        self.tree.wheres.push(WhereNode { joiner, predicate });
        self
    }

    fn push_having(&mut self, joiner: Joiner, predicate: Predicate) -> &mut Self {
        self.tree.havings.push(WhereNode { joiner, predicate });
        self
    }

    // ==================== Comparison ====================

    /// `field = value`
    pub fn where_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.where_op(field, "=", value)
    }

    /// `field op value`
    pub fn where_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push_where(Joiner::And, compare(field, op, value))
    }

    pub fn or_where_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.or_where_op(field, "=", value)
    }

    pub fn or_where_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push_where(Joiner::Or, compare(field, op, value))
    }

    /// Raw predicate with `{n}` markers.
    pub fn where_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push_where(Joiner::And, Predicate::Raw(Fragment::new(signature, values)))
    }

    pub fn or_where_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push_where(Joiner::Or, Predicate::Raw(Fragment::new(signature, values)))
    }

    // ==================== IN ====================

    /// `field IN (...)`; an empty list compiles to `field IS NULL`.
    pub fn where_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(Joiner::And, in_list(field, values, false))
    }

    /// `field NOT IN (...)`; an empty list compiles to `field IS NOT NULL`.
    pub fn where_not_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(Joiner::And, in_list(field, values, true))
    }

    pub fn or_where_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(Joiner::Or, in_list(field, values, false))
    }

    pub fn or_where_not_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(Joiner::Or, in_list(field, values, true))
    }

    /// `where_in` for a dynamically typed list. Fails unless `values` is a
    /// [`Value::Array`].
    pub fn where_in_values(
        &mut self,
        field: impl Into<String>,
        values: Value,
    ) -> RelqResult<&mut Self> {
        let list = array_items(values)?;
        Ok(self.push_where(Joiner::And, in_list(field, list, false)))
    }

    pub fn where_not_in_values(
        &mut self,
        field: impl Into<String>,
        values: Value,
    ) -> RelqResult<&mut Self> {
        let list = array_items(values)?;
        Ok(self.push_where(Joiner::And, in_list(field, list, true)))
    }

    // ==================== BETWEEN ====================

    /// `field >= low AND field <= high`, or strict bounds when `inclusive` is
    /// false. Bounds are used exactly as given.
    pub fn where_between(
        &mut self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
        inclusive: bool,
    ) -> &mut Self {
        self.push_where(Joiner::And, between(field, low, high, inclusive, false))
    }

    /// `(field < low OR field > high)`, or `<=`/`>=` when `inclusive` is false.
    pub fn where_not_between(
        &mut self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
        inclusive: bool,
    ) -> &mut Self {
        self.push_where(Joiner::And, between(field, low, high, inclusive, true))
    }

    pub fn or_where_between(
        &mut self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
        inclusive: bool,
    ) -> &mut Self {
        self.push_where(Joiner::Or, between(field, low, high, inclusive, false))
    }

    pub fn or_where_not_between(
        &mut self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
        inclusive: bool,
    ) -> &mut Self {
        self.push_where(Joiner::Or, between(field, low, high, inclusive, true))
    }

    // ==================== Columns and NULL ====================

    /// `first = second`
    pub fn where_column(
        &mut self,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> &mut Self {
        self.where_column_op(first, "=", second)
    }

    pub fn where_column_op(
        &mut self,
        first: impl Into<String>,
        op: impl Into<String>,
        second: impl Into<String>,
    ) -> &mut Self {
        self.push_where(Joiner::And, column(first, op, second))
    }

    pub fn or_where_column(
        &mut self,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> &mut Self {
        self.or_where_column_op(first, "=", second)
    }

    pub fn or_where_column_op(
        &mut self,
        first: impl Into<String>,
        op: impl Into<String>,
        second: impl Into<String>,
    ) -> &mut Self {
        self.push_where(Joiner::Or, column(first, op, second))
    }

    pub fn where_null(&mut self, field: impl Into<String>) -> &mut Self {
        self.push_where(Joiner::And, null(field, false))
    }

    pub fn where_not_null(&mut self, field: impl Into<String>) -> &mut Self {
        self.push_where(Joiner::And, null(field, true))
    }

    pub fn or_where_null(&mut self, field: impl Into<String>) -> &mut Self {
        self.push_where(Joiner::Or, null(field, false))
    }

    pub fn or_where_not_null(&mut self, field: impl Into<String>) -> &mut Self {
        self.push_where(Joiner::Or, null(field, true))
    }

    // ==================== Date parts ====================

    /// Compare the date portion of `field`. `value` must be date-like.
    pub fn where_date(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        self.where_date_op(field, "=", value)
    }

    pub fn where_date_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Date, field, op, value.into())?;
        Ok(self.push_where(Joiner::And, predicate))
    }

    pub fn or_where_date(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Date, field, "=", value.into())?;
        Ok(self.push_where(Joiner::Or, predicate))
    }

    /// Day of month, 1-31, or a date-like value whose day is used.
    pub fn where_day(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        self.where_day_op(field, "=", value)
    }

    pub fn where_day_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Day, field, op, value.into())?;
        Ok(self.push_where(Joiner::And, predicate))
    }

    pub fn or_where_day(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Day, field, "=", value.into())?;
        Ok(self.push_where(Joiner::Or, predicate))
    }

    /// Month, 1-12, or a date-like value whose month is used.
    pub fn where_month(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        self.where_month_op(field, "=", value)
    }

    pub fn where_month_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Month, field, op, value.into())?;
        Ok(self.push_where(Joiner::And, predicate))
    }

    pub fn or_where_month(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Month, field, "=", value.into())?;
        Ok(self.push_where(Joiner::Or, predicate))
    }

    /// Year, or a date-like value whose year is used.
    pub fn where_year(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        self.where_year_op(field, "=", value)
    }

    pub fn where_year_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Year, field, op, value.into())?;
        Ok(self.push_where(Joiner::And, predicate))
    }

    pub fn or_where_year(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> RelqResult<&mut Self> {
        let predicate = date_part(DatePart::Year, field, "=", value.into())?;
        Ok(self.push_where(Joiner::Or, predicate))
    }

    // ==================== EXISTS ====================

    /// `EXISTS (<sub>)`. The subquery is compiled with this builder's dialect
    /// into the same bound sequence, so its placeholders continue the outer
    /// numbering.
    pub fn where_exists(&mut self, sub: &QueryBuilder) -> &mut Self {
        self.push_where(Joiner::And, exists(sub, false))
    }

    pub fn where_not_exists(&mut self, sub: &QueryBuilder) -> &mut Self {
        self.push_where(Joiner::And, exists(sub, true))
    }

    pub fn or_where_exists(&mut self, sub: &QueryBuilder) -> &mut Self {
        self.push_where(Joiner::Or, exists(sub, false))
    }

    pub fn or_where_not_exists(&mut self, sub: &QueryBuilder) -> &mut Self {
        self.push_where(Joiner::Or, exists(sub, true))
    }

    /// `EXISTS (<signature>)`
    pub fn where_exists_raw(
        &mut self,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.push_where(Joiner::And, exists_raw(signature, values, false))
    }

    pub fn where_not_exists_raw(
        &mut self,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.push_where(Joiner::And, exists_raw(signature, values, true))
    }

    pub fn or_where_exists_raw(
        &mut self,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.push_where(Joiner::Or, exists_raw(signature, values, false))
    }

    pub fn or_where_not_exists_raw(
        &mut self,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.push_where(Joiner::Or, exists_raw(signature, values, true))
    }

    // ==================== HAVING ====================
    //
    // HAVING nodes are only rendered once at least one GROUP BY entry exists.

    pub fn having_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.having_op(field, "=", value)
    }

    pub fn having_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push_having(Joiner::And, compare(field, op, value))
    }

    pub fn or_having_eq(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.or_having_op(field, "=", value)
    }

    pub fn or_having_op(
        &mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push_having(Joiner::Or, compare(field, op, value))
    }

    pub fn having_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push_having(Joiner::And, Predicate::Raw(Fragment::new(signature, values)))
    }

    pub fn or_having_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push_having(Joiner::Or, Predicate::Raw(Fragment::new(signature, values)))
    }
}

fn compare(field: impl Into<String>, op: impl Into<String>, value: impl Into<Value>) -> Predicate {
    Predicate::Compare {
        field: field.into(),
        op: op.into(),
        value: value.into(),
    }
}

fn in_list<I, V>(field: impl Into<String>, values: I, negate: bool) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Predicate::In {
        field: field.into(),
        values: values.into_iter().map(Into::into).collect(),
        negate,
    }
}

fn array_items(values: Value) -> RelqResult<Vec<Value>> {
    match values {
        Value::Array(items) => Ok(items),
        other => Err(RelqError::validation(format!(
            "IN list must be an array, got {}",
            other.type_name()
        ))),
    }
}

fn between(
    field: impl Into<String>,
    low: impl Into<Value>,
    high: impl Into<Value>,
    inclusive: bool,
    negate: bool,
) -> Predicate {
    Predicate::Between {
        field: field.into(),
        low: low.into(),
        high: high.into(),
        inclusive,
        negate,
    }
}

fn column(first: impl Into<String>, op: impl Into<String>, second: impl Into<String>) -> Predicate {
    Predicate::Column {
        first: first.into(),
        op: op.into(),
        second: second.into(),
    }
}

fn null(field: impl Into<String>, negate: bool) -> Predicate {
    Predicate::Null {
        field: field.into(),
        negate,
    }
}

fn exists(sub: &QueryBuilder, negate: bool) -> Predicate {
    Predicate::Exists {
        source: Subquery::Tree(Box::new(sub.tree.clone())),
        negate,
    }
}

fn exists_raw(signature: impl Into<String>, values: Vec<Value>, negate: bool) -> Predicate {
    Predicate::Exists {
        source: Subquery::Raw(Fragment::new(signature, values)),
        negate,
    }
}

/// Validate `value` for `part` and reduce it to the value that is bound.
fn date_part(
    part: DatePart,
    field: impl Into<String>,
    op: impl Into<String>,
    value: Value,
) -> RelqResult<Predicate> {
    let bound = match part {
        DatePart::Date => match value.to_date() {
            Some(date) => Value::Date(date),
            None => {
                return Err(RelqError::validation(format!(
                    "date comparison expects a date, got {}",
                    value.type_name()
                )));
            }
        },
        DatePart::Day => Value::Int(component(&value, "day", 1..=31, |d| i64::from(d.day()))?),
        DatePart::Month => {
            Value::Int(component(&value, "month", 1..=12, |d| i64::from(d.month()))?)
        }
        DatePart::Year => Value::Int(component(&value, "year", i64::MIN..=i64::MAX, |d| {
            i64::from(d.year())
        })?),
    };
    Ok(Predicate::DatePart {
        part,
        field: field.into(),
        op: op.into(),
        value: bound,
    })
}

fn component(
    value: &Value,
    name: &str,
    range: std::ops::RangeInclusive<i64>,
    extract: impl Fn(chrono::NaiveDate) -> i64,
) -> RelqResult<i64> {
    if let Value::Int(n) = value {
        return if range.contains(n) {
            Ok(*n)
        } else {
            Err(RelqError::validation(format!(
                "{name} must be between {} and {}, got {n}",
                range.start(),
                range.end()
            )))
        };
    }
    value.to_date().map(extract).ok_or_else(|| {
        RelqError::validation(format!(
            "{name} expects an integer or a date, got {}",
            value.type_name()
        ))
    })
}
