//! SQL dialects.
//!
//! A [`Dialect`] renders a [`ClauseTree`] into SQL text, appending every bound
//! value to a [`Bound`] as it goes. Concrete dialects only supply tokens
//! (placeholder syntax, identifier quoting, function spelling); clause order
//! and statement assembly live in the provided methods of the trait and are
//! shared by every implementation.
//!
//! # Clause order
//!
//! `SELECT` compiles as
//! `SELECT [DISTINCT] cols FROM source JOIN.. WHERE.. GROUP BY.. HAVING..
//! ORDER BY.. LIMIT OFFSET UNION.. lock`. Placeholders are allocated in that
//! order, so the numbering never depends on the order builder calls were made.

mod ident;
mod mysql;
mod postgres;
mod scope;

#[cfg(test)]
mod tests;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use crate::bound::Bound;
use crate::clause::{
    Assignment, ClauseTree, Column, DatePart, Fragment, Group, InsertBody, Join, JoinOn, JoinTarget,
    Lock,
    Order, Predicate, Source, Statement, Subquery, TableRef, UpdateBody, WhereNode,
};
use crate::signature;
use crate::value::Value;
use std::fmt;

/// Token rendering plus the shared statement assembler.
///
/// The trait is object safe; builders hold an `Arc<dyn Dialect>`.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Short dialect name (`"postgres"`, `"mysql"`).
    fn name(&self) -> &'static str;

    /// Placeholder token for the 1-based bound position `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Character used to quote identifiers.
    fn quote_char(&self) -> char;

    /// Prefix prepended to every table name.
    fn table_prefix(&self) -> &str {
        ""
    }

    /// ORDER BY term for random ordering.
    fn random_order(&self) -> &'static str;

    /// Trailing locking clause.
    fn lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::ForUpdate => "FOR UPDATE".to_string(),
            Lock::ForShare => "FOR SHARE".to_string(),
            Lock::Raw(text) => text.clone(),
        }
    }

    // ==================== Tokens ====================

    fn quote_identifier(&self, part: &str) -> String {
        let mut out = String::with_capacity(part.len() + 2);
        ident::write_quoted(&mut out, part, self.quote_char());
        out
    }

    /// Render an identifier path, quoting only the parts that need it.
    /// Expressions are returned verbatim.
    fn identifier(&self, text: &str) -> String {
        let text = text.trim();
        let Some(parts) = ident::split_path(text) else {
            return text.to_string();
        };
        let mut out = String::with_capacity(text.len() + 4);
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            if ident::needs_quoting(part) {
                ident::write_quoted(&mut out, part, self.quote_char());
            } else {
                out.push_str(part);
            }
        }
        out
    }

    /// `name [AS alias]`
    fn field(&self, name: &str, alias: Option<&str>) -> String {
        let field = self.identifier(name);
        match alias {
            Some(alias) => format!("{field} AS {}", self.alias(alias)),
            None => field,
        }
    }

    /// `prefix+name [AS alias]`; the prefix applies to the last path part.
    fn table(&self, name: &str, alias: Option<&str>) -> String {
        let name = name.trim();
        let prefix = self.table_prefix();
        let prefixed = match name.rsplit_once('.') {
            Some((schema, table)) => format!("{schema}.{prefix}{table}"),
            None => format!("{prefix}{name}"),
        };
        let table = self.identifier(&prefixed);
        match alias {
            Some(alias) => format!("{table} AS {}", self.alias(alias)),
            None => table,
        }
    }

    fn alias(&self, alias: &str) -> String {
        self.identifier(alias)
    }

    /// Comparison operator spelling.
    fn operator(&self, op: &str) -> String {
        op.trim().to_string()
    }

    /// Allocate the next placeholder for `value`.
    fn value(&self, bound: &mut Bound, value: &Value) -> String {
        let index = bound.push(value.clone());
        self.placeholder(index)
    }

    /// Fill a fragment's markers with placeholders.
    fn fill(&self, bound: &mut Bound, fragment: &Fragment) -> String {
        signature::fill(self, bound, &fragment.signature, &fragment.values)
    }

    /// `FN(field)`
    fn function(&self, name: &str, field: &str) -> String {
        format!("{name}({})", self.identifier(field))
    }

    fn date_date(&self, field: &str) -> String {
        format!("CAST({field} AS DATE)")
    }

    // EXTRACT yields numeric; the cast lets integer binds compare against it.
    fn date_day(&self, field: &str) -> String {
        format!("CAST(EXTRACT(DAY FROM {field}) AS INTEGER)")
    }

    fn date_month(&self, field: &str) -> String {
        format!("CAST(EXTRACT(MONTH FROM {field}) AS INTEGER)")
    }

    fn date_year(&self, field: &str) -> String {
        format!("CAST(EXTRACT(YEAR FROM {field}) AS INTEGER)")
    }

    fn date_part(&self, part: DatePart, field: &str) -> String {
        let field = self.identifier(field);
        match part {
            DatePart::Date => self.date_date(&field),
            DatePart::Day => self.date_day(&field),
            DatePart::Month => self.date_month(&field),
            DatePart::Year => self.date_year(&field),
        }
    }

    // ==================== Clause fragments ====================

    /// The name ON clauses use for `table`: its alias, or the prefixed name.
    fn table_reference(&self, table: &TableRef) -> String {
        match &table.alias {
            Some(alias) => self.alias(alias),
            None => self.table(&table.name, None),
        }
    }

    fn source(&self, source: &Source) -> String {
        match source {
            Source::Table(table) => self.table(&table.name, table.alias.as_deref()),
            Source::Raw(text) => text.clone(),
        }
    }

    /// `reference.column`; already qualified columns are kept as they are.
    fn qualify(&self, reference: &str, column: &str) -> String {
        if column.contains('.') {
            self.identifier(column)
        } else {
            format!("{reference}.{}", self.identifier(column))
        }
    }

    fn columns(&self, columns: &[Column]) -> String {
        if columns.is_empty() {
            return "*".to_string();
        }
        columns
            .iter()
            .map(|column| match column {
                Column::Simple { name, alias } => self.field(name, alias.as_deref()),
                Column::Raw(text) => text.clone(),
                Column::Aggregate {
                    function,
                    field,
                    alias,
                } => {
                    let call = self.function(function, field);
                    match alias {
                        Some(alias) => format!("{call} AS {}", self.alias(alias)),
                        None => call,
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn join(&self, bound: &mut Bound, this: &str, join: &Join) -> String {
        let keyword = join.kind.keyword();
        // Raw targets fill first: their markers precede any in the ON clause.
        let (target, joined) = match &join.target {
            JoinTarget::Table(table) => (
                self.table(&table.name, table.alias.as_deref()),
                Some(self.table_reference(table)),
            ),
            JoinTarget::Raw(fragment) => (self.fill(bound, fragment), None),
        };
        let remote = |column: &str| match &joined {
            Some(joined) => self.qualify(joined, column),
            None => self.identifier(column),
        };
        match &join.on {
            None => format!("{keyword} {target}"),
            Some(JoinOn::Key(key)) => format!(
                "{keyword} {target} ON {} = {}",
                remote(key),
                self.qualify(this, key)
            ),
            Some(JoinOn::Columns {
                local,
                op,
                remote: column,
            }) => format!(
                "{keyword} {target} ON {} {} {}",
                remote(column),
                self.operator(op),
                self.qualify(this, local)
            ),
            Some(JoinOn::Raw(fragment)) => {
                format!("{keyword} {target} ON {}", self.fill(bound, fragment))
            }
        }
    }

    fn subquery(&self, bound: &mut Bound, subquery: &Subquery) -> String {
        match subquery {
            Subquery::Tree(tree) => self.assemble(tree, bound),
            Subquery::Raw(fragment) => self.fill(bound, fragment),
        }
    }

    fn predicate(&self, bound: &mut Bound, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Compare { field, op, value } => format!(
                "{} {} {}",
                self.identifier(field),
                self.operator(op),
                self.value(bound, value)
            ),
            Predicate::Raw(fragment) => self.fill(bound, fragment),
            Predicate::Exists { source, negate } => {
                let keyword = if *negate { "NOT EXISTS" } else { "EXISTS" };
                format!("{keyword} ({})", self.subquery(bound, source))
            }
            Predicate::In {
                field,
                values,
                negate,
            } => {
                let field = self.identifier(field);
                if values.is_empty() {
                    let null = if *negate { "IS NOT NULL" } else { "IS NULL" };
                    return format!("{field} {null}");
                }
                let keyword = if *negate { "NOT IN" } else { "IN" };
                let list = values
                    .iter()
                    .map(|v| self.value(bound, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{field} {keyword} ({list})")
            }
            Predicate::Null { field, negate } => {
                let null = if *negate { "IS NOT NULL" } else { "IS NULL" };
                format!("{} {null}", self.identifier(field))
            }
            Predicate::Between {
                field,
                low,
                high,
                inclusive,
                negate,
            } => {
                let field = self.identifier(field);
                let low = self.value(bound, low);
                let high = self.value(bound, high);
                match (*negate, *inclusive) {
                    (false, true) => format!("{field} >= {low} AND {field} <= {high}"),
                    (false, false) => format!("{field} > {low} AND {field} < {high}"),
                    (true, true) => format!("({field} < {low} OR {field} > {high})"),
                    (true, false) => format!("({field} <= {low} OR {field} >= {high})"),
                }
            }
            Predicate::Column { first, op, second } => format!(
                "{} {} {}",
                self.identifier(first),
                self.operator(op),
                self.identifier(second)
            ),
            Predicate::DatePart {
                part,
                field,
                op,
                value,
            } => format!(
                "{} {} {}",
                self.date_part(*part, field),
                self.operator(op),
                self.value(bound, value)
            ),
        }
    }

    /// Joiner-delimited predicate list. The first node's joiner is dropped.
    fn where_clause(&self, bound: &mut Bound, nodes: &[WhereNode]) -> String {
        let mut sql = String::new();
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(node.joiner.keyword());
                sql.push(' ');
            }
            sql.push_str(&self.predicate(bound, &node.predicate));
        }
        sql
    }

    fn push_where(&self, sql: &mut String, bound: &mut Bound, nodes: &[WhereNode]) {
        if !nodes.is_empty() {
            sql.push_str(" WHERE ");
            let clause = self.where_clause(bound, nodes);
            sql.push_str(&clause);
        }
    }

    fn order(&self, bound: &mut Bound, order: &Order) -> String {
        match order {
            Order::Field { field, ascending } => {
                let dir = if *ascending { "ASC" } else { "DESC" };
                format!("{} {dir}", self.identifier(field))
            }
            Order::Raw(fragment) => self.fill(bound, fragment),
            Order::Random => self.random_order().to_string(),
        }
    }

    // ==================== Statements ====================

    fn sql_select(&self, tree: &ClauseTree, bound: &mut Bound) -> String {
        let mut sql = String::from("SELECT ");
        if tree.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.columns(&tree.columns));
        sql.push_str(" FROM ");
        sql.push_str(&self.source(&tree.source));

        // JOINs
        let this = match &tree.source {
            Source::Table(table) => self.table_reference(table),
            Source::Raw(text) => text.trim().to_string(),
        };
        for join in &tree.joins {
            sql.push(' ');
            let clause = self.join(bound, &this, join);
            sql.push_str(&clause);
        }

        self.push_where(&mut sql, bound, &tree.wheres);

        // GROUP BY / HAVING
        if tree.is_grouped() {
            let groups = tree
                .groups
                .iter()
                .map(|group| match group {
                    Group::Field(field) => self.identifier(field),
                    Group::Raw(fragment) => self.fill(bound, fragment),
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups);

            if !tree.havings.is_empty() {
                sql.push_str(" HAVING ");
                let clause = self.where_clause(bound, &tree.havings);
                sql.push_str(&clause);
            }
        }

        if !tree.orders.is_empty() {
            let orders = tree
                .orders
                .iter()
                .map(|order| self.order(bound, order))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders);
        }

        if let Some(limit) = tree.limit.filter(|n| *n > 0) {
            sql.push_str(" LIMIT ");
            sql.push_str(&self.value(bound, &Value::Int(limit)));
        }
        if let Some(offset) = tree.offset.filter(|n| *n > 0) {
            sql.push_str(" OFFSET ");
            sql.push_str(&self.value(bound, &Value::Int(offset)));
        }

        for union in &tree.unions {
            sql.push_str(if union.all { " UNION ALL " } else { " UNION " });
            let clause = self.subquery(bound, &union.source);
            sql.push_str(&clause);
        }

        if let Some(lock) = &tree.lock {
            sql.push(' ');
            sql.push_str(&self.lock(lock));
        }

        sql
    }

    fn sql_insert(&self, tree: &ClauseTree, body: &InsertBody, bound: &mut Bound) -> String {
        let table = match &tree.source {
            Source::Table(table) => self.table(&table.name, None),
            Source::Raw(text) => text.clone(),
        };
        match body {
            InsertBody::Rows { fields, rows } => {
                let fields = fields
                    .iter()
                    .map(|f| self.identifier(f))
                    .collect::<Vec<_>>()
                    .join(", ");
                let tuples = rows
                    .iter()
                    .map(|row| {
                        let values = row
                            .iter()
                            .map(|v| self.value(bound, v))
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("({values})")
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("INSERT INTO {table} ({fields}) VALUES {tuples}")
            }
            InsertBody::Raw(fragment) => {
                format!("INSERT INTO {table} {}", self.fill(bound, fragment))
            }
        }
    }

    fn sql_update(&self, tree: &ClauseTree, body: &UpdateBody, bound: &mut Bound) -> String {
        let set = match body {
            UpdateBody::Assignments(assignments) => assignments
                .iter()
                .map(|assignment| match assignment {
                    Assignment::Set { field, value } => {
                        format!("{} = {}", self.identifier(field), self.value(bound, value))
                    }
                    Assignment::Step {
                        field,
                        negative,
                        amount,
                    } => {
                        let field = self.identifier(field);
                        let sign = if *negative { '-' } else { '+' };
                        format!("{field} = {field} {sign} {}", self.value(bound, amount))
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
            UpdateBody::Raw(fragment) => self.fill(bound, fragment),
        };
        let mut sql = format!("UPDATE {} SET {set}", self.source(&tree.source));
        self.push_where(&mut sql, bound, &tree.wheres);
        sql
    }

    fn sql_delete(&self, tree: &ClauseTree, bound: &mut Bound) -> String {
        let mut sql = format!("DELETE FROM {}", self.source(&tree.source));
        self.push_where(&mut sql, bound, &tree.wheres);
        sql
    }

    fn sql_truncate(&self, tree: &ClauseTree, cascade: bool) -> String {
        let table = match &tree.source {
            Source::Table(table) => self.table(&table.name, None),
            Source::Raw(text) => text.clone(),
        };
        if cascade {
            format!("TRUNCATE TABLE {table} CASCADE")
        } else {
            format!("TRUNCATE TABLE {table}")
        }
    }

    /// Compile `tree` into SQL text, appending bound values to `bound`.
    ///
    /// Pure with respect to `tree`: the same tree compiled into an empty bound
    /// always produces the same text and values. With a table prefix set,
    /// column qualifiers naming an unaliased table of the statement are
    /// prefixed along with the table itself.
    fn compile(&self, tree: &ClauseTree, bound: &mut Bound) -> String {
        let prefix = self.table_prefix();
        if prefix.is_empty() {
            return self.assemble(tree, bound);
        }
        let scoped = scope::prefix_qualifiers(tree, prefix);
        self.assemble(&scoped, bound)
    }

    /// Statement dispatch for a tree whose qualifiers are already final.
    fn assemble(&self, tree: &ClauseTree, bound: &mut Bound) -> String {
        match &tree.statement {
            Statement::Select => self.sql_select(tree, bound),
            Statement::Insert(body) => self.sql_insert(tree, body, bound),
            Statement::Update(body) => self.sql_update(tree, body, bound),
            Statement::Delete => self.sql_delete(tree, bound),
            Statement::Truncate { cascade } => self.sql_truncate(tree, *cascade),
        }
    }
}
