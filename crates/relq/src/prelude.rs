//! Common imports.
//!
//! ```ignore
//! use relq::prelude::*;
//! ```

pub use crate::builder::{Compiled, QueryBuilder};
pub use crate::clause::{JoinOn, TableRef};
pub use crate::collection::Collection;
pub use crate::connection::Connection;
pub use crate::dialect::{Dialect, MySqlDialect, PostgresDialect};
pub use crate::error::{RelqError, RelqResult};
pub use crate::fields;
pub use crate::record::Record;
pub use crate::value::{FromValue, Value};
