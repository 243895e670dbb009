//! Print the SQL the builder produces for both dialects.
//!
//! Run: cargo run -p relq --example compile

use relq::{JoinOn, QueryBuilder, RelqResult, TableRef, fields};

fn show(label: &str, qb: &QueryBuilder) {
    let compiled = qb.compile();
    println!("-- {label}");
    println!("{}", compiled.query);
    println!("   bound: {:?}\n", compiled.bound);
}

fn main() -> RelqResult<()> {
    for mut qb in [
        QueryBuilder::postgres(TableRef::aliased("users", "u")),
        QueryBuilder::mysql(TableRef::aliased("users", "u")),
    ] {
        let name = qb.dialect().name();

        qb.select(["u.id", "u.name"])
            .left_join("posts", JoinOn::columns("id", "user_id"))
            .where_eq("u.status", "active")
            .where_in("u.role", ["admin", "editor"])
            .where_month("u.created_at", 3)?
            .group_by(["u.id", "u.name"])
            .having_op("COUNT(posts.id)", ">", 5)
            .order_by_desc("u.id")
            .paginate(2, 20);
        show(&format!("{name}: select"), &qb);

        qb.update(fields! { "status" => "inactive", "note" => None::<String> })?;
        show(&format!("{name}: update"), &qb);

        let mut insert = QueryBuilder::new(qb.dialect().clone(), "users");
        insert.insert([
            fields! { "name" => "alice", "age" => 31 },
            fields! { "age" => 27, "name" => "bob" },
        ])?;
        show(&format!("{name}: insert"), &insert);
    }
    Ok(())
}
