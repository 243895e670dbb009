use super::QueryBuilder;
use crate::clause::{
    Column, Fragment, Group, Join, JoinKind, JoinOn, JoinTarget, Lock, Order, Subquery, TableRef,
    Union,
};
use crate::value::Value;

impl QueryBuilder {
    // ==================== SELECT columns ====================

    /// Append plain columns.
    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tree.columns.extend(fields.into_iter().map(|name| Column::Simple {
            name: name.into(),
            alias: None,
        }));
        self
    }

    /// Append `field AS alias` columns from `(alias, field)` pairs.
    pub fn select_as<I, A, F>(&mut self, aliased: I) -> &mut Self
    where
        I: IntoIterator<Item = (A, F)>,
        A: Into<String>,
        F: Into<String>,
    {
        self.tree
            .columns
            .extend(aliased.into_iter().map(|(alias, field)| Column::Simple {
                name: field.into(),
                alias: Some(alias.into()),
            }));
        self
    }

    /// Append a column expression verbatim.
    pub fn select_raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.tree.columns.push(Column::Raw(text.into()));
        self
    }

    fn aggregate(&mut self, function: &'static str, field: &str, alias: Option<&str>) -> &mut Self {
        self.tree.columns.push(Column::Aggregate {
            function,
            field: field.to_string(),
            alias: alias.map(str::to_string),
        });
        self
    }

    pub fn avg(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.aggregate("AVG", field, alias)
    }

    pub fn count_of(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.aggregate("COUNT", field, alias)
    }

    pub fn min(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.aggregate("MIN", field, alias)
    }

    pub fn max(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.aggregate("MAX", field, alias)
    }

    pub fn sum(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.aggregate("SUM", field, alias)
    }

    pub fn distinct(&mut self, enable: bool) -> &mut Self {
        self.tree.distinct = enable;
        self
    }

    // ==================== JOIN ====================

    fn push_join(&mut self, kind: JoinKind, target: JoinTarget, on: Option<JoinOn>) -> &mut Self {
        self.tree.joins.push(Join { kind, target, on });
        self
    }

    /// `INNER JOIN table ON ...`
    pub fn join(&mut self, table: impl Into<TableRef>, on: JoinOn) -> &mut Self {
        self.push_join(JoinKind::Inner, JoinTarget::Table(table.into()), Some(on))
    }

    pub fn left_join(&mut self, table: impl Into<TableRef>, on: JoinOn) -> &mut Self {
        self.push_join(JoinKind::Left, JoinTarget::Table(table.into()), Some(on))
    }

    pub fn right_join(&mut self, table: impl Into<TableRef>, on: JoinOn) -> &mut Self {
        self.push_join(JoinKind::Right, JoinTarget::Table(table.into()), Some(on))
    }

    pub fn cross_join(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.push_join(JoinKind::Cross, JoinTarget::Table(table.into()), None)
    }

    /// `CROSS JOIN <signature>`, e.g. a `LATERAL` subquery. The target is
    /// emitted verbatim apart from its markers, which are numbered in JOIN
    /// position.
    pub fn cross_join_raw(
        &mut self,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        let target = JoinTarget::Raw(Fragment::new(signature, values));
        self.push_join(JoinKind::Cross, target, None)
    }

    /// `INNER JOIN table ON <signature>`
    pub fn join_raw(
        &mut self,
        table: impl Into<TableRef>,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.join(table, JoinOn::raw(signature, values))
    }

    pub fn left_join_raw(
        &mut self,
        table: impl Into<TableRef>,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.left_join(table, JoinOn::raw(signature, values))
    }

    pub fn right_join_raw(
        &mut self,
        table: impl Into<TableRef>,
        signature: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.right_join(table, JoinOn::raw(signature, values))
    }

    // ==================== GROUP BY / ORDER BY ====================

    pub fn group_by<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tree
            .groups
            .extend(fields.into_iter().map(|f| Group::Field(f.into())));
        self
    }

    pub fn group_by_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.tree
            .groups
            .push(Group::Raw(Fragment::new(signature, values)));
        self
    }

    /// `ORDER BY field ASC`
    pub fn order_by(&mut self, field: impl Into<String>) -> &mut Self {
        self.order_by_dir(field, true)
    }

    /// `ORDER BY field DESC`
    pub fn order_by_desc(&mut self, field: impl Into<String>) -> &mut Self {
        self.order_by_dir(field, false)
    }

    pub fn order_by_dir(&mut self, field: impl Into<String>, ascending: bool) -> &mut Self {
        self.tree.orders.push(Order::Field {
            field: field.into(),
            ascending,
        });
        self
    }

    pub fn order_by_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.tree
            .orders
            .push(Order::Raw(Fragment::new(signature, values)));
        self
    }

    pub fn in_random_order(&mut self) -> &mut Self {
        self.tree.orders.push(Order::Random);
        self
    }

    // ==================== UNION ====================

    fn push_union(&mut self, all: bool, source: Subquery) -> &mut Self {
        self.tree.unions.push(Union { all, source });
        self
    }

    /// `UNION <other>`; `other` is compiled with this builder's dialect.
    pub fn union(&mut self, other: &QueryBuilder) -> &mut Self {
        self.push_union(false, Subquery::Tree(Box::new(other.tree.clone())))
    }

    pub fn union_all(&mut self, other: &QueryBuilder) -> &mut Self {
        self.push_union(true, Subquery::Tree(Box::new(other.tree.clone())))
    }

    pub fn union_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push_union(false, Subquery::Raw(Fragment::new(signature, values)))
    }

    pub fn union_all_raw(&mut self, signature: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.push_union(true, Subquery::Raw(Fragment::new(signature, values)))
    }

    // ==================== Pagination ====================

    /// Set LIMIT. Values `<= 0` suppress the clause.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.tree.limit = Some(n);
        self
    }

    /// Alias for [`limit`](Self::limit).
    pub fn take(&mut self, n: i64) -> &mut Self {
        self.limit(n)
    }

    /// Set OFFSET. Values `<= 0` suppress the clause.
    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.tree.offset = Some(n);
        self
    }

    /// Alias for [`offset`](Self::offset).
    pub fn skip(&mut self, n: i64) -> &mut Self {
        self.offset(n)
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    /// The offset saturates instead of overflowing.
    pub fn paginate(&mut self, page: i64, per_page: i64) -> &mut Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.tree.limit = Some(size);
        self.tree.offset = Some((p - 1).saturating_mul(size));
        self
    }

    // ==================== Locking ====================

    /// `FOR UPDATE`; `false` clears any lock.
    pub fn lock_for_update(&mut self, enable: bool) -> &mut Self {
        self.tree.lock = enable.then_some(Lock::ForUpdate);
        self
    }

    /// Shared row lock; `false` clears any lock.
    pub fn shared_lock(&mut self, enable: bool) -> &mut Self {
        self.tree.lock = enable.then_some(Lock::ForShare);
        self
    }

    pub fn lock_raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.tree.lock = Some(Lock::Raw(text.into()));
        self
    }
}
