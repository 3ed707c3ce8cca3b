//! The storage boundary.
//!
//! The pipeline itself never talks to storage, but route handlers composed
//! into it do. This module pins the contract any storage collaborator must
//! satisfy: parameterized statements in, rows-as-maps out. Plug in whatever
//! engine you like behind it.

use std::collections::HashMap;

use crate::error::Result;
use crate::value::Value;

/// One result row: column name → value.
pub type Row = HashMap<String, Value>;

/// A storage collaborator usable from route handlers.
pub trait Database: Send + Sync {
    /// Runs a statement with no result, e.g. `INSERT` / `UPDATE` / DDL.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<()>;

    /// Runs a query and returns its rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Minimal in-memory double pinning the contract shape.
    #[derive(Default)]
    struct FakeDb {
        statements: Mutex<Vec<(String, Vec<Value>)>>,
        rows: Mutex<Vec<Row>>,
    }

    impl Database for FakeDb {
        fn execute(&self, sql: &str, params: &[Value]) -> Result<()> {
            self.statements.lock().push((sql.to_owned(), params.to_vec()));
            Ok(())
        }

        fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
            Ok(self.rows.lock().clone())
        }
    }

    #[test]
    fn parameterized_statements_and_row_maps_round_trip() {
        let db = FakeDb::default();
        db.rows.lock().push(Row::from([
            ("id".to_owned(), Value::from("7")),
            ("name".to_owned(), Value::from("alice")),
        ]));

        db.execute("INSERT INTO users (name) VALUES (?)", &[Value::from("alice")])
            .unwrap();
        let rows = db.query("SELECT * FROM users", &[]).unwrap();

        assert_eq!(db.statements.lock().len(), 1);
        assert_eq!(rows[0].get("name").and_then(Value::as_str), Some("alice"));
    }
}
