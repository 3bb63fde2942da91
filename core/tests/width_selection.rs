//! Memory optimizer properties over a table loaded from SQLite.
//!
//! After sanitization and optimization every numeric column's recorded
//! width must strictly contain the column's range, and no value may change.

use rusqlite::Connection;
use suspicion_core::{
    optimizer::MemoryOptimizer,
    sanitizer::NullSanitizer,
    schema::StorageWidth,
    store::ResultStore,
    table::{ColumnData, Table},
};

fn load(sql: &str) -> Table {
    let conn = Connection::open_in_memory().expect("in-memory db");
    conn.execute_batch(sql).expect("seed");
    ResultStore::from_connection(conn)
        .load_table("results")
        .expect("load")
}

fn seeded() -> Table {
    let mut sql = String::from(
        "CREATE TABLE results (user_id TEXT, tiny INTEGER, wide INTEGER, huge INTEGER,
                               prob REAL, big REAL);\n",
    );
    for i in 0..200i64 {
        let tiny = if i % 7 == 0 { "NULL".to_string() } else { (i % 50).to_string() };
        sql.push_str(&format!(
            "INSERT INTO results VALUES ('u{i}', {tiny}, {}, {}, {}, {});\n",
            i * 1000 - 50_000,
            i * 50_000_000,
            i as f64 / 200.0,
            i as f64 * 1e6,
        ));
    }
    load(&sql)
}

#[test]
fn recorded_widths_strictly_contain_each_column_range() {
    let mut table = seeded();
    NullSanitizer::new().sanitize(&mut table);
    let before = table.clone();
    let report = MemoryOptimizer::new().optimize(&mut table).expect("optimize");
    assert!(report.reduction_pct() > 0.0);

    for column in table.columns() {
        match column.data() {
            ColumnData::Integer(cells) => {
                let values: Vec<i64> = cells.iter().map(|c| c.unwrap()).collect();
                let (min, max) = (*values.iter().min().unwrap(), *values.iter().max().unwrap());
                let (lo, hi) = column.width().unwrap().integer_range().unwrap();
                assert!(lo < min && max < hi, "{} not contained", column.name());
            }
            ColumnData::Real(cells) => {
                let values: Vec<f64> = cells.iter().map(|c| c.unwrap()).collect();
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let limit = column.width().unwrap().real_limit().unwrap();
                assert!(-limit < min && max < limit, "{} not contained", column.name());
            }
            ColumnData::Text(_) => assert_eq!(column.width(), None),
        }
    }

    for (a, b) in before.columns().iter().zip(table.columns()) {
        assert_eq!(a.data(), b.data(), "values of '{}' changed", a.name());
    }
}

#[test]
fn widths_follow_the_ladder() {
    let mut table = seeded();
    NullSanitizer::new().sanitize(&mut table);
    MemoryOptimizer::new().optimize(&mut table).expect("optimize");

    let width = |name: &str| table.column(name).unwrap().width().unwrap();
    assert_eq!(width("tiny"), StorageWidth::Int8);
    assert_eq!(width("wide"), StorageWidth::Int32);
    assert_eq!(width("huge"), StorageWidth::Int64);
    assert_eq!(width("prob"), StorageWidth::Float16);
    assert_eq!(width("big"), StorageWidth::Float32);
}

#[test]
fn optimizer_refuses_unsanitized_table() {
    let mut table = seeded();
    assert!(MemoryOptimizer::new().optimize(&mut table).is_err());
}
