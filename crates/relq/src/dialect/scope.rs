//! Table-prefix rewriting for caller-qualified columns.
//!
//! A prefixed dialect renders `FROM posts` as `FROM wp_posts`, so a column the
//! caller wrote as `posts.id` has to become `wp_posts.id` as well. Only
//! qualifiers naming an unaliased table of the statement (or of an enclosing
//! statement, for correlated subqueries) are touched. Aliases, unknown
//! qualifiers, expressions and raw fragments are left as written.

use super::ident;
use crate::clause::{
    Assignment, ClauseTree, Column, Group, JoinOn, JoinTarget, Order, Predicate, Source,
    Statement, Subquery, TableRef, UpdateBody, WhereNode,
};

/// Table names and aliases visible to one statement.
#[derive(Default)]
struct Scope<'a> {
    prefix: &'a str,
    tables: Vec<String>,
    aliases: Vec<String>,
}

impl<'a> Scope<'a> {
    /// `outer` extended with the tables `tree` brings into scope.
    fn enter(outer: &Scope<'a>, tree: &ClauseTree) -> Self {
        let mut scope = Scope {
            prefix: outer.prefix,
            tables: outer.tables.clone(),
            aliases: outer.aliases.clone(),
        };
        if let Source::Table(table) = &tree.source {
            scope.add(table);
        }
        for join in &tree.joins {
            if let JoinTarget::Table(table) = &join.target {
                scope.add(table);
            }
        }
        scope
    }

    fn add(&mut self, table: &TableRef) {
        match &table.alias {
            Some(alias) => self.aliases.push(alias.trim().to_string()),
            None => self.tables.push(table.name.trim().to_string()),
        }
    }

    /// Whether `qualifier` names one of the unaliased tables, either in full
    /// or by its last path part.
    fn names_table(&self, qualifier: &str) -> bool {
        if self.aliases.iter().any(|alias| alias == qualifier) {
            return false;
        }
        self.tables.iter().any(|table| {
            table == qualifier || table.rsplit('.').next() == Some(qualifier)
        })
    }

    fn column(&self, path: &str) -> String {
        let text = path.trim();
        if ident::split_path(text).is_none() {
            return path.to_string();
        }
        match text.rsplit_once('.') {
            Some((qualifier, column)) if self.names_table(qualifier) => {
                let qualifier = match qualifier.rsplit_once('.') {
                    Some((schema, table)) => format!("{schema}.{}{table}", self.prefix),
                    None => format!("{}{qualifier}", self.prefix),
                };
                format!("{qualifier}.{column}")
            }
            _ => path.to_string(),
        }
    }

    fn rename(&self, field: &mut String) {
        *field = self.column(field);
    }
}

/// A copy of `tree` with every qualifier that names an unaliased table of
/// the statement given `prefix`.
pub(crate) fn prefix_qualifiers(tree: &ClauseTree, prefix: &str) -> ClauseTree {
    let root = Scope {
        prefix,
        ..Scope::default()
    };
    rewrite(tree, &root)
}

fn rewrite(tree: &ClauseTree, outer: &Scope<'_>) -> ClauseTree {
    let scope = Scope::enter(outer, tree);
    let mut tree = tree.clone();

    for column in &mut tree.columns {
        match column {
            Column::Simple { name, .. } => scope.rename(name),
            Column::Aggregate { field, .. } => scope.rename(field),
            Column::Raw(_) => {}
        }
    }
    for join in &mut tree.joins {
        match &mut join.on {
            Some(JoinOn::Key(key)) => scope.rename(key),
            Some(JoinOn::Columns { local, remote, .. }) => {
                scope.rename(local);
                scope.rename(remote);
            }
            Some(JoinOn::Raw(_)) | None => {}
        }
    }
    rewrite_nodes(&mut tree.wheres, &scope);
    for group in &mut tree.groups {
        if let Group::Field(field) = group {
            scope.rename(field);
        }
    }
    rewrite_nodes(&mut tree.havings, &scope);
    for order in &mut tree.orders {
        if let Order::Field { field, .. } = order {
            scope.rename(field);
        }
    }
    // A union member is its own statement and does not see our tables.
    let fresh = Scope {
        prefix: scope.prefix,
        ..Scope::default()
    };
    for union in &mut tree.unions {
        if let Subquery::Tree(member) = &mut union.source {
            **member = rewrite(member, &fresh);
        }
    }
    if let Statement::Update(UpdateBody::Assignments(assignments)) = &mut tree.statement {
        for assignment in assignments {
            match assignment {
                Assignment::Set { field, .. } | Assignment::Step { field, .. } => {
                    scope.rename(field)
                }
            }
        }
    }
    tree
}

fn rewrite_nodes(nodes: &mut [WhereNode], scope: &Scope<'_>) {
    for node in nodes {
        match &mut node.predicate {
            Predicate::Compare { field, .. }
            | Predicate::In { field, .. }
            | Predicate::Null { field, .. }
            | Predicate::Between { field, .. }
            | Predicate::DatePart { field, .. } => scope.rename(field),
            Predicate::Column { first, second, .. } => {
                scope.rename(first);
                scope.rename(second);
            }
            Predicate::Exists {
                source: Subquery::Tree(inner),
                ..
            } => **inner = rewrite(inner, scope),
            Predicate::Exists { .. } | Predicate::Raw(_) => {}
        }
    }
}
