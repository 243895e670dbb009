use super::{QueryBuilder, collect_fields};
use crate::clause::{Assignment, Fragment, InsertBody, Statement, UpdateBody};
use crate::error::{RelqError, RelqResult};
use crate::value::Value;

impl QueryBuilder {
    // ==================== INSERT ====================

    /// Turn the statement into a multi-row INSERT.
    ///
    /// Every row must carry the same set of fields as the first row ever
    /// inserted through this builder; values are reordered to that row's
    /// field order. Repeated calls append rows to the same statement.
    pub fn insert<R, K, V>(&mut self, rows: impl IntoIterator<Item = R>) -> RelqResult<&mut Self>
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (mut fields, existing) = match &self.tree.statement {
            Statement::Insert(InsertBody::Rows { fields, rows }) => {
                (Some(fields.clone()), rows.len())
            }
            _ => (None, 0),
        };

        let mut staged: Vec<Vec<Value>> = Vec::new();
        for row in rows {
            let row = collect_fields(row)?;
            if row.is_empty() {
                return Err(RelqError::validation("insert row has no fields"));
            }
            let order =
                fields.get_or_insert_with(|| row.iter().map(|(k, _)| k.clone()).collect());
            staged.push(align_row(order, row)?);
        }
        if staged.is_empty() && existing == 0 {
            return Err(RelqError::validation("insert requires at least one row"));
        }

        let fields = fields.unwrap_or_default();
        match &mut self.tree.statement {
            Statement::Insert(InsertBody::Rows { rows, .. }) => rows.extend(staged),
            statement => {
                *statement = Statement::Insert(InsertBody::Rows {
                    fields,
                    rows: staged,
                });
            }
        }
        Ok(self)
    }

    /// `INSERT INTO table <signature>`
    pub fn insert_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.tree.statement = Statement::Insert(InsertBody::Raw(Fragment::new(signature, values)));
        self
    }

    // ==================== UPDATE ====================

    /// `UPDATE table SET a = .., b = ..` in the given field order.
    pub fn update<K, V>(
        &mut self,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> RelqResult<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = collect_fields(fields)?;
        if fields.is_empty() {
            return Err(RelqError::validation("update requires at least one field"));
        }
        let assignments = fields
            .into_iter()
            .map(|(field, value)| Assignment::Set { field, value })
            .collect();
        self.tree.statement = Statement::Update(UpdateBody::Assignments(assignments));
        Ok(self)
    }

    /// `UPDATE table SET <signature>`
    pub fn update_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.tree.statement = Statement::Update(UpdateBody::Raw(Fragment::new(signature, values)));
        self
    }

    /// `SET field = field + amount`
    pub fn increment(&mut self, field: impl Into<String>, amount: impl Into<Value>) -> &mut Self {
        let assignments = vec![Assignment::Step {
            field: field.into(),
            negative: false,
            amount: amount.into(),
        }];
        self.tree.statement = Statement::Update(UpdateBody::Assignments(assignments));
        self
    }

    /// `SET field = field - amount`
    pub fn decrement(&mut self, field: impl Into<String>, amount: impl Into<Value>) -> &mut Self {
        let assignments = vec![Assignment::Step {
            field: field.into(),
            negative: true,
            amount: amount.into(),
        }];
        self.tree.statement = Statement::Update(UpdateBody::Assignments(assignments));
        self
    }

    /// Increment several fields and set others in the same statement.
    ///
    /// A field present in `overwrite` is set to its overwrite value and not
    /// incremented. Overwrites render after the increments.
    pub fn increment_with<K, A, OK, OV>(
        &mut self,
        steps: impl IntoIterator<Item = (K, A)>,
        overwrite: impl IntoIterator<Item = (OK, OV)>,
    ) -> RelqResult<&mut Self>
    where
        K: Into<String>,
        A: Into<Value>,
        OK: Into<String>,
        OV: Into<Value>,
    {
        self.step_with(false, steps, overwrite)
    }

    /// Decrement counterpart of [`increment_with`](Self::increment_with).
    pub fn decrement_with<K, A, OK, OV>(
        &mut self,
        steps: impl IntoIterator<Item = (K, A)>,
        overwrite: impl IntoIterator<Item = (OK, OV)>,
    ) -> RelqResult<&mut Self>
    where
        K: Into<String>,
        A: Into<Value>,
        OK: Into<String>,
        OV: Into<Value>,
    {
        self.step_with(true, steps, overwrite)
    }

    fn step_with<K, A, OK, OV>(
        &mut self,
        negative: bool,
        steps: impl IntoIterator<Item = (K, A)>,
        overwrite: impl IntoIterator<Item = (OK, OV)>,
    ) -> RelqResult<&mut Self>
    where
        K: Into<String>,
        A: Into<Value>,
        OK: Into<String>,
        OV: Into<Value>,
    {
        let steps = collect_fields(steps)?;
        let overwrite = collect_fields(overwrite)?;
        if steps.is_empty() && overwrite.is_empty() {
            return Err(RelqError::validation("update requires at least one field"));
        }

        let mut assignments: Vec<Assignment> = steps
            .into_iter()
            .filter(|(field, _)| !overwrite.iter().any(|(o, _)| o == field))
            .map(|(field, amount)| Assignment::Step {
                field,
                negative,
                amount,
            })
            .collect();
        assignments.extend(
            overwrite
                .into_iter()
                .map(|(field, value)| Assignment::Set { field, value }),
        );

        self.tree.statement = Statement::Update(UpdateBody::Assignments(assignments));
        Ok(self)
    }

    // ==================== DELETE / TRUNCATE ====================

    /// `DELETE FROM table [WHERE ..]`
    pub fn delete(&mut self) -> &mut Self {
        self.tree.statement = Statement::Delete;
        self
    }

    /// `TRUNCATE TABLE table [CASCADE]`
    pub fn truncate(&mut self, cascade: bool) -> &mut Self {
        self.tree.statement = Statement::Truncate { cascade };
        self
    }

    /// Switch back to a SELECT, keeping every clause.
    pub fn to_select(&mut self) -> &mut Self {
        self.tree.statement = Statement::Select;
        self
    }
}

/// Reorder `row` to follow `order`, failing if the field sets differ.
fn align_row(order: &[String], row: Vec<(String, Value)>) -> RelqResult<Vec<Value>> {
    if row.len() != order.len() {
        return Err(mismatch(order, &row));
    }
    let mut slots: Vec<Option<Value>> = vec![None; order.len()];
    for (field, value) in &row {
        match order.iter().position(|f| f == field) {
            Some(idx) => slots[idx] = Some(value.clone()),
            None => return Err(mismatch(order, &row)),
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

fn mismatch(order: &[String], row: &[(String, Value)]) -> RelqError {
    let got: Vec<&str> = row.iter().map(|(f, _)| f.as_str()).collect();
    RelqError::validation(format!(
        "insert fields [{}] do not match [{}]",
        got.join(", "),
        order.join(", ")
    ))
}
