//! Compilation properties that hold for every dialect.

use relq::{DialectKind, JoinOn, QueryBuilder, RelqConfig, TableRef, Value, fields};

/// Every `$n` in `sql`, in order of appearance.
fn dollar_placeholders(sql: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        let digits: String = rest[pos + 1..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if let Ok(n) = digits.parse() {
            found.push(n);
        }
        rest = &rest[pos + 1..];
    }
    found
}

fn busy_query(mut qb: QueryBuilder) -> QueryBuilder {
    let mut banned = QueryBuilder::postgres("bans");
    banned
        .select_raw("1")
        .where_column("bans.user_id", "u.id")
        .where_eq("bans.active", true);

    let mut archived = QueryBuilder::postgres("archived_users");
    archived.where_op("age", ">=", 18);

    qb.select(["u.id", "u.name"])
        .left_join("teams", JoinOn::raw("teams.id = u.team_id AND teams.tier = {0}", vec![
            Value::from("gold"),
        ]))
        .where_eq("u.status", "active")
        .where_in("u.role", ["admin", "editor"])
        .or_where_between("u.age", 18, 65, true)
        .where_not_exists(&banned)
        .where_raw("u.score > {1} - {0}", vec![Value::Int(5), Value::Int(100)])
        .group_by(["u.id", "u.name"])
        .having_op("COUNT(u.id)", ">", 1)
        .order_by_raw("FIELD(u.role, {0})", vec![Value::from("admin")])
        .paginate(3, 10)
        .union(&archived);
    qb
}

#[test]
fn placeholders_are_numbered_left_to_right() {
    let compiled = busy_query(QueryBuilder::postgres(TableRef::aliased("users", "u"))).compile();
    let numbers = dollar_placeholders(&compiled.query);
    let expected: Vec<usize> = (1..=compiled.bound.len()).collect();
    assert_eq!(numbers, expected);
}

#[test]
fn dialects_bind_the_same_values() {
    let pg = busy_query(QueryBuilder::postgres(TableRef::aliased("users", "u"))).compile();
    let my = busy_query(QueryBuilder::mysql(TableRef::aliased("users", "u"))).compile();

    assert_eq!(pg.bound, my.bound);
    assert_eq!(my.query.matches('?').count(), my.bound.len());
    assert!(!my.query.contains('$'));
    assert_eq!(
        pg.bound,
        vec![
            Value::from("gold"),
            Value::from("active"),
            Value::from("admin"),
            Value::from("editor"),
            Value::Int(18),
            Value::Int(65),
            Value::Bool(true),
            Value::Int(100),
            Value::Int(5),
            Value::Int(1),
            Value::from("admin"),
            Value::Int(10),
            Value::Int(20),
            Value::Int(18),
        ]
    );
}

#[test]
fn full_select_renders_in_fixed_clause_order() {
    let sql = busy_query(QueryBuilder::postgres(TableRef::aliased("users", "u"))).to_sql();
    assert_eq!(
        sql,
        "SELECT u.id, u.name FROM users AS u \
         LEFT JOIN teams ON teams.id = u.team_id AND teams.tier = $1 \
         WHERE u.status = $2 AND u.role IN ($3, $4) OR u.age >= $5 AND u.age <= $6 \
         AND NOT EXISTS (SELECT 1 FROM bans WHERE bans.user_id = u.id AND bans.active = $7) \
         AND u.score > $8 - $9 \
         GROUP BY u.id, u.name HAVING COUNT(u.id) > $10 \
         ORDER BY FIELD(u.role, $11) LIMIT $12 OFFSET $13 \
         UNION SELECT * FROM archived_users WHERE age >= $14"
    );
}

#[test]
fn reserved_and_mixed_case_identifiers_are_quoted() {
    let mut pg = QueryBuilder::postgres("user");
    pg.select(["order", "firstName", "plain"]).where_eq("group", 1);
    assert_eq!(
        pg.to_sql(),
        "SELECT \"order\", \"firstName\", plain FROM \"user\" WHERE \"group\" = $1"
    );

    let mut my = QueryBuilder::mysql("user");
    my.select(["order", "firstName", "plain"]).where_eq("group", 1);
    assert_eq!(
        my.to_sql(),
        "SELECT `order`, `firstName`, plain FROM `user` WHERE `group` = ?"
    );
}

#[test]
fn unmatched_markers_stay_verbatim() {
    let mut qb = QueryBuilder::postgres("docs");
    qb.where_raw("body @> '{\"a\": 1}' AND id = {0} AND x = {3}", vec![Value::Int(7)]);
    let compiled = qb.compile();
    assert_eq!(
        compiled.query,
        "SELECT * FROM docs WHERE body @> '{\"a\": 1}' AND id = $1 AND x = {3}"
    );
    assert_eq!(compiled.bound, vec![Value::Int(7)]);
}

#[test]
fn config_builds_prefixed_builders() {
    let config: RelqConfig =
        serde_json::from_str(r#"{"dialect":"mysql","table_prefix":"wp_"}"#).unwrap();
    assert_eq!(config.dialect, DialectKind::Mysql);
    assert_eq!(config.primary_key, "id");

    let mut posts = config.table(TableRef::aliased("posts", "p"));
    posts
        .join("postmeta", JoinOn::columns("ID", "post_id"))
        .where_eq("p.post_status", "publish");
    assert_eq!(
        posts.to_sql(),
        "SELECT * FROM wp_posts AS p INNER JOIN wp_postmeta ON wp_postmeta.post_id = p.`ID` \
         WHERE p.post_status = ?"
    );
}

#[test]
fn writes_share_where_numbering() {
    let mut qb = QueryBuilder::mysql("accounts");
    qb.where_eq("id", 4)
        .where_not_null("verified_at")
        .increment_with([("balance", 25)], fields! { "updated_by" => "system" })
        .unwrap();
    let compiled = qb.compile();
    assert_eq!(
        compiled.query,
        "UPDATE accounts SET balance = balance + ?, updated_by = ? WHERE id = ? AND verified_at IS NOT NULL"
    );
    assert_eq!(
        compiled.bound,
        vec![Value::Int(25), Value::from("system"), Value::Int(4)]
    );
}

#[test]
fn overwrite_suppresses_the_step_for_the_same_field() {
    let mut qb = QueryBuilder::postgres("t");
    qb.increment_with([("f", 1)], [("f", "v")]).unwrap();
    let compiled = qb.compile();
    assert_eq!(compiled.query, "UPDATE t SET f = $1");
    assert_eq!(compiled.bound, vec![Value::from("v")]);
}

#[test]
fn prefixed_tables_carry_into_qualified_columns() {
    let config: RelqConfig = serde_json::from_str(r#"{"table_prefix":"wp_"}"#).unwrap();
    let mut posts = config.table("posts");
    posts
        .select(["posts.title"])
        .join("comments", JoinOn::columns("posts.id", "comments.post_id"))
        .where_eq("posts.id", 1);
    assert_eq!(
        posts.to_sql(),
        "SELECT wp_posts.title FROM wp_posts \
         INNER JOIN wp_comments ON wp_comments.post_id = wp_posts.id WHERE wp_posts.id = $1"
    );

    let mut aliased = config.table(TableRef::aliased("posts", "p"));
    aliased.where_eq("p.id", 1).where_raw("posts.id > {0}", vec![Value::Int(0)]);
    assert_eq!(
        aliased.to_sql(),
        "SELECT * FROM wp_posts AS p WHERE p.id = $1 AND posts.id > $2"
    );
}
