use super::*;
use crate::clause::{JoinKind, Joiner};

fn compile(dialect: &dyn Dialect, tree: &ClauseTree) -> (String, Vec<Value>) {
    let mut bound = Bound::new();
    let sql = dialect.compile(tree, &mut bound);
    (sql, bound.into_values())
}

fn users() -> ClauseTree {
    ClauseTree::new(Source::Table(TableRef::new("users")))
}

fn and(predicate: Predicate) -> WhereNode {
    WhereNode {
        joiner: Joiner::And,
        predicate,
    }
}

#[test]
fn empty_tree_selects_everything() {
    let (sql, bound) = compile(&PostgresDialect::new(), &users());
    assert_eq!(sql, "SELECT * FROM users");
    assert!(bound.is_empty());
}

#[test]
fn placeholder_tokens_differ_by_dialect() {
    let mut tree = users();
    tree.wheres.push(and(Predicate::Compare {
        field: "age".into(),
        op: ">".into(),
        value: Value::Int(18),
    }));
    tree.limit = Some(10);

    let (pg, _) = compile(&PostgresDialect::new(), &tree);
    let (my, bound) = compile(&MySqlDialect::new(), &tree);
    assert_eq!(pg, "SELECT * FROM users WHERE age > $1 LIMIT $2");
    assert_eq!(my, "SELECT * FROM users WHERE age > ? LIMIT ?");
    assert_eq!(bound, vec![Value::Int(18), Value::Int(10)]);
}

#[test]
fn identifiers_are_quoted_only_when_needed() {
    let pg = PostgresDialect::new();
    let my = MySqlDialect::new();
    assert_eq!(pg.field("name", None), "name");
    assert_eq!(pg.field("createdAt", Some("created")), "\"createdAt\" AS created");
    assert_eq!(my.field("u.order", None), "u.`order`");
    assert_eq!(pg.field("COUNT(id)", None), "COUNT(id)");
    assert_eq!(pg.field("u.*", None), "u.*");
}

#[test]
fn table_prefix_applies_to_last_part() {
    let pg = PostgresDialect::with_prefix("app_");
    assert_eq!(pg.table("users", None), "app_users");
    assert_eq!(pg.table("public.users", Some("u")), "public.app_users AS u");
    assert_eq!(MySqlDialect::with_prefix("wp_").table("Posts", None), "`wp_Posts`");
}

#[test]
fn joins_reference_alias_or_prefixed_table() {
    let mut tree = ClauseTree::new(Source::Table(TableRef::aliased("users", "u")));
    tree.joins.push(Join {
        kind: JoinKind::Left,
        target: TableRef::new("posts").into(),
        on: Some(JoinOn::columns("id", "user_id")),
    });
    tree.joins.push(Join {
        kind: JoinKind::Inner,
        target: TableRef::aliased("teams", "t").into(),
        on: Some(JoinOn::key("team_id")),
    });
    tree.joins.push(Join {
        kind: JoinKind::Cross,
        target: TableRef::new("flags").into(),
        on: None,
    });

    let (sql, _) = compile(&PostgresDialect::with_prefix("p_"), &tree);
    assert_eq!(
        sql,
        "SELECT * FROM p_users AS u \
         LEFT JOIN p_posts ON p_posts.user_id = u.id \
         INNER JOIN p_teams AS t ON t.team_id = u.team_id \
         CROSS JOIN p_flags"
    );
}

#[test]
fn raw_join_condition_is_filled() {
    let mut tree = users();
    tree.joins.push(Join {
        kind: JoinKind::Right,
        target: TableRef::new("orders").into(),
        on: Some(JoinOn::raw(
            "orders.user_id = users.id AND orders.total > {0}",
            vec![Value::Int(100)],
        )),
    });
    tree.wheres.push(and(Predicate::Null {
        field: "deleted_at".into(),
        negate: false,
    }));
    let (sql, bound) = compile(&PostgresDialect::new(), &tree);
    assert_eq!(
        sql,
        "SELECT * FROM users RIGHT JOIN orders ON orders.user_id = users.id AND orders.total > $1 \
         WHERE deleted_at IS NULL"
    );
    assert_eq!(bound, vec![Value::Int(100)]);
}

#[test]
fn between_keeps_bounds_as_given() {
    let mut tree = users();
    tree.wheres.push(and(Predicate::Between {
        field: "age".into(),
        low: Value::Int(65),
        high: Value::Int(18),
        inclusive: true,
        negate: false,
    }));
    tree.wheres.push(WhereNode {
        joiner: Joiner::Or,
        predicate: Predicate::Between {
            field: "score".into(),
            low: Value::Int(1),
            high: Value::Int(5),
            inclusive: false,
            negate: true,
        },
    });
    let (sql, bound) = compile(&PostgresDialect::new(), &tree);
    assert_eq!(
        sql,
        "SELECT * FROM users WHERE age >= $1 AND age <= $2 OR (score <= $3 OR score >= $4)"
    );
    assert_eq!(
        bound,
        vec![Value::Int(65), Value::Int(18), Value::Int(1), Value::Int(5)]
    );
}

#[test]
fn date_parts_use_dialect_functions() {
    let mut tree = users();
    tree.wheres.push(and(Predicate::DatePart {
        part: DatePart::Month,
        field: "created_at".into(),
        op: "=".into(),
        value: Value::Int(3),
    }));
    tree.wheres.push(and(Predicate::DatePart {
        part: DatePart::Date,
        field: "created_at".into(),
        op: "<".into(),
        value: Value::from("2024-01-01"),
    }));

    let (pg, _) = compile(&PostgresDialect::new(), &tree);
    let (my, _) = compile(&MySqlDialect::new(), &tree);
    assert_eq!(
        pg,
        "SELECT * FROM users WHERE CAST(EXTRACT(MONTH FROM created_at) AS INTEGER) = $1 \
         AND CAST(created_at AS DATE) < $2"
    );
    assert_eq!(
        my,
        "SELECT * FROM users WHERE MONTH(created_at) = ? AND DATE(created_at) < ?"
    );
}

#[test]
fn having_requires_group() {
    let mut tree = users();
    tree.havings.push(and(Predicate::Compare {
        field: "total".into(),
        op: ">".into(),
        value: Value::Int(1),
    }));
    let (sql, bound) = compile(&PostgresDialect::new(), &tree);
    assert_eq!(sql, "SELECT * FROM users");
    assert!(bound.is_empty());

    tree.groups.push(Group::Field("total".into()));
    let (sql, bound) = compile(&PostgresDialect::new(), &tree);
    assert_eq!(sql, "SELECT * FROM users GROUP BY total HAVING total > $1");
    assert_eq!(bound, vec![Value::Int(1)]);
}

#[test]
fn locks_and_random_order() {
    let mut tree = users();
    tree.orders.push(Order::Random);
    tree.lock = Some(Lock::ForShare);
    assert_eq!(
        compile(&PostgresDialect::new(), &tree).0,
        "SELECT * FROM users ORDER BY RANDOM() FOR SHARE"
    );
    assert_eq!(
        compile(&MySqlDialect::new(), &tree).0,
        "SELECT * FROM users ORDER BY RAND() LOCK IN SHARE MODE"
    );
}

#[test]
fn update_and_delete_number_set_before_where() {
    let mut tree = users();
    tree.wheres.push(and(Predicate::Compare {
        field: "id".into(),
        op: "=".into(),
        value: Value::Int(7),
    }));
    tree.statement = Statement::Update(UpdateBody::Assignments(vec![
        Assignment::Step {
            field: "visits".into(),
            negative: false,
            amount: Value::Int(1),
        },
        Assignment::Set {
            field: "name".into(),
            value: Value::from("neo"),
        },
    ]));
    let (sql, bound) = compile(&PostgresDialect::new(), &tree);
    assert_eq!(
        sql,
        "UPDATE users SET visits = visits + $1, name = $2 WHERE id = $3"
    );
    assert_eq!(bound, vec![Value::Int(1), Value::from("neo"), Value::Int(7)]);

    tree.statement = Statement::Delete;
    let (sql, bound) = compile(&MySqlDialect::new(), &tree);
    assert_eq!(sql, "DELETE FROM users WHERE id = ?");
    assert_eq!(bound, vec![Value::Int(7)]);
}

#[test]
fn truncate_ignores_clauses() {
    let mut tree = users();
    tree.limit = Some(3);
    tree.statement = Statement::Truncate { cascade: true };
    let (sql, bound) = compile(&PostgresDialect::with_prefix("t_"), &tree);
    assert_eq!(sql, "TRUNCATE TABLE t_users CASCADE");
    assert!(bound.is_empty());
}

#[test]
fn postgres_date_parts_compare_as_integers() {
    let pg = PostgresDialect::new();
    assert_eq!(
        pg.date_part(DatePart::Day, "created_at"),
        "CAST(EXTRACT(DAY FROM created_at) AS INTEGER)"
    );
    assert_eq!(
        pg.date_part(DatePart::Month, "created_at"),
        "CAST(EXTRACT(MONTH FROM created_at) AS INTEGER)"
    );
    assert_eq!(
        pg.date_part(DatePart::Year, "\"Posts\".created_at"),
        "CAST(EXTRACT(YEAR FROM \"Posts\".created_at) AS INTEGER)"
    );
    assert_eq!(
        MySqlDialect::new().date_part(DatePart::Year, "created_at"),
        "YEAR(created_at)"
    );
}

#[test]
fn raw_join_target_fills_before_its_condition() {
    let mut tree = users();
    tree.joins.push(Join {
        kind: JoinKind::Left,
        target: JoinTarget::Raw(Fragment::new(
            "(SELECT user_id FROM orders WHERE total > {0}) AS big",
            vec![Value::Int(500)],
        )),
        on: Some(JoinOn::raw("big.user_id = users.id AND big.user_id <> {0}", vec![
            Value::Int(7),
        ])),
    });
    tree.joins.push(Join {
        kind: JoinKind::Inner,
        target: JoinTarget::Raw(Fragment::text("teams")),
        on: Some(JoinOn::columns("team_id", "id")),
    });
    tree.wheres.push(and(Predicate::Compare {
        field: "active".into(),
        op: "=".into(),
        value: Value::Bool(true),
    }));

    let (sql, bound) = compile(&PostgresDialect::with_prefix("p_"), &tree);
    assert_eq!(
        sql,
        "SELECT * FROM p_users \
         LEFT JOIN (SELECT user_id FROM orders WHERE total > $1) AS big \
         ON big.user_id = users.id AND big.user_id <> $2 \
         INNER JOIN teams ON id = p_users.team_id \
         WHERE active = $3"
    );
    assert_eq!(bound, vec![Value::Int(500), Value::Int(7), Value::Bool(true)]);
}

#[test]
fn prefix_applies_to_qualified_columns_of_unaliased_tables() {
    let mut tree = ClauseTree::new(Source::Table(TableRef::new("posts")));
    tree.columns.push(Column::Simple {
        name: "posts.title".into(),
        alias: None,
    });
    tree.joins.push(Join {
        kind: JoinKind::Inner,
        target: TableRef::new("comments").into(),
        on: Some(JoinOn::columns("posts.id", "comments.post_id")),
    });
    tree.wheres.push(and(Predicate::Compare {
        field: "posts.id".into(),
        op: "=".into(),
        value: Value::Int(1),
    }));
    tree.orders.push(Order::Field {
        field: "comments.created_at".into(),
        ascending: false,
    });

    let (sql, bound) = compile(&PostgresDialect::with_prefix("wp_"), &tree);
    assert_eq!(
        sql,
        "SELECT wp_posts.title FROM wp_posts \
         INNER JOIN wp_comments ON wp_comments.post_id = wp_posts.id \
         WHERE wp_posts.id = $1 ORDER BY wp_comments.created_at DESC"
    );
    assert_eq!(bound, vec![Value::Int(1)]);
}

#[test]
fn prefixed_exists_subquery_is_prefixed_once() {
    let mut inner = ClauseTree::new(Source::Table(TableRef::new("comments")));
    inner.wheres.push(and(Predicate::Column {
        first: "comments.post_id".into(),
        op: "=".into(),
        second: "posts.id".into(),
    }));
    let mut tree = ClauseTree::new(Source::Table(TableRef::new("posts")));
    tree.wheres.push(and(Predicate::Exists {
        source: Subquery::Tree(Box::new(inner)),
        negate: false,
    }));

    let (sql, _) = compile(&MySqlDialect::with_prefix("wp_"), &tree);
    assert_eq!(
        sql,
        "SELECT * FROM wp_posts WHERE EXISTS (SELECT * FROM wp_comments \
         WHERE wp_comments.post_id = wp_posts.id)"
    );
}
