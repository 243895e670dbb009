//! The clause tree: the structured representation of one statement under
//! construction.
//!
//! A [`QueryBuilder`](crate::QueryBuilder) owns exactly one tree and mutates
//! it in place. Dialects only ever see it through `&ClauseTree`, so compiling
//! never changes it.

use crate::value::Value;

/// A raw SQL fragment with positional markers (`{0}`, `{1}`, ...) and the
/// values that fill them.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub signature: String,
    pub values: Vec<Value>,
}

impl Fragment {
    pub fn new(signature: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            signature: signature.into(),
            values,
        }
    }

    /// A fragment without markers.
    pub fn text(signature: impl Into<String>) -> Self {
        Self::new(signature, Vec::new())
    }
}

/// A table reference with an optional alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// `name AS alias`; the alias is what ON clauses refer to.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::new(name)
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::new(name)
    }
}

/// The FROM target of a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Table(TableRef),
    /// Verbatim FROM text; no prefixing, quoting or marker substitution.
    Raw(String),
}

/// One entry of the SELECT list.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Simple { name: String, alias: Option<String> },
    /// Verbatim column text.
    Raw(String),
    /// `FN(field)`, rendered with the dialect's field formatting.
    Aggregate {
        function: &'static str,
        field: String,
        alias: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Cross,
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// How a joined table is matched against the statement's own table.
#[derive(Clone, Debug, PartialEq)]
pub enum JoinOn {
    /// `ON joined.key = this.key`
    Key(String),
    /// `ON joined.remote <op> this.local`
    Columns {
        local: String,
        op: String,
        remote: String,
    },
    Raw(Fragment),
}

impl JoinOn {
    /// Same column name on both sides.
    pub fn key(key: impl Into<String>) -> Self {
        JoinOn::Key(key.into())
    }

    /// `joined.remote = this.local`
    pub fn columns(local: impl Into<String>, remote: impl Into<String>) -> Self {
        JoinOn::Columns {
            local: local.into(),
            op: "=".to_string(),
            remote: remote.into(),
        }
    }

    /// `joined.remote <op> this.local`
    pub fn op(local: impl Into<String>, op: impl Into<String>, remote: impl Into<String>) -> Self {
        JoinOn::Columns {
            local: local.into(),
            op: op.into(),
            remote: remote.into(),
        }
    }

    /// Raw ON condition with positional markers.
    pub fn raw(signature: impl Into<String>, values: Vec<Value>) -> Self {
        JoinOn::Raw(Fragment::new(signature, values))
    }
}

/// What a JOIN brings into the statement.
#[derive(Clone, Debug, PartialEq)]
pub enum JoinTarget {
    Table(TableRef),
    /// Verbatim target text with positional markers, e.g. a lateral subquery.
    Raw(Fragment),
}

impl From<TableRef> for JoinTarget {
    fn from(table: TableRef) -> Self {
        JoinTarget::Table(table)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub target: JoinTarget,
    /// `None` only for cross joins.
    pub on: Option<JoinOn>,
}

/// Combinator attached to every predicate node. Ignored on the first node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub fn keyword(self) -> &'static str {
        match self {
            Joiner::And => "AND",
            Joiner::Or => "OR",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePart {
    Date,
    Day,
    Month,
    Year,
}

/// A nested statement: another tree compiled into the same bound sequence,
/// or a raw fragment.
#[derive(Clone, Debug, PartialEq)]
pub enum Subquery {
    Tree(Box<ClauseTree>),
    Raw(Fragment),
}

/// The predicate carried by a WHERE/HAVING node.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `field op value`
    Compare {
        field: String,
        op: String,
        value: Value,
    },
    Raw(Fragment),
    /// `[NOT] EXISTS (subquery)`
    Exists { source: Subquery, negate: bool },
    /// `field [NOT] IN (...)`; an empty list renders `field IS [NOT] NULL`.
    In {
        field: String,
        values: Vec<Value>,
        negate: bool,
    },
    /// `field IS [NOT] NULL`
    Null { field: String, negate: bool },
    /// Bounds are rendered exactly as given; `low > high` is not reordered.
    Between {
        field: String,
        low: Value,
        high: Value,
        inclusive: bool,
        negate: bool,
    },
    /// `first op second`, both sides are fields.
    Column {
        first: String,
        op: String,
        second: String,
    },
    /// `PART(field) op value`
    DatePart {
        part: DatePart,
        field: String,
        op: String,
        value: Value,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhereNode {
    pub joiner: Joiner,
    pub predicate: Predicate,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Group {
    Field(String),
    Raw(Fragment),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Order {
    Field { field: String, ascending: bool },
    Raw(Fragment),
    /// Dialect-specific random ordering.
    Random,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Union {
    pub all: bool,
    pub source: Subquery,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lock {
    ForUpdate,
    ForShare,
    Raw(String),
}

/// One SET item of an UPDATE.
#[derive(Clone, Debug, PartialEq)]
pub enum Assignment {
    /// `field = value`
    Set { field: String, value: Value },
    /// `field = field + amount` / `field = field - amount`
    Step {
        field: String,
        negative: bool,
        amount: Value,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum InsertBody {
    /// One VALUES tuple per row; every row follows `fields` order.
    Rows {
        fields: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Raw(Fragment),
}

#[derive(Clone, Debug, PartialEq)]
pub enum UpdateBody {
    Assignments(Vec<Assignment>),
    Raw(Fragment),
}

/// Which assembler compiles the tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Statement {
    #[default]
    Select,
    Insert(InsertBody),
    Update(UpdateBody),
    Delete,
    Truncate { cascade: bool },
}

/// The mutable intermediate representation accumulated by the builder.
#[derive(Clone, Debug, PartialEq)]
pub struct ClauseTree {
    pub statement: Statement,
    pub source: Source,
    /// Empty compiles to `*`.
    pub columns: Vec<Column>,
    pub distinct: bool,
    pub joins: Vec<Join>,
    pub wheres: Vec<WhereNode>,
    pub groups: Vec<Group>,
    /// Rendered only when `groups` is non-empty.
    pub havings: Vec<WhereNode>,
    pub orders: Vec<Order>,
    pub unions: Vec<Union>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub lock: Option<Lock>,
}

impl ClauseTree {
    pub fn new(source: Source) -> Self {
        Self {
            statement: Statement::Select,
            source,
            columns: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            unions: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
        }
    }

    /// Whether HAVING nodes will be rendered.
    pub fn is_grouped(&self) -> bool {
        !self.groups.is_empty()
    }
}
