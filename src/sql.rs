// src/sql.rs

//! SQL statement construction.
//!
//! All SQL text in the crate is assembled here, from operator-supplied
//! identifiers, type fragments and formatter expressions. Nothing is quoted or
//! escaped; the configuration is trusted. Identifier quoting or allow-listing
//! belongs in this module if it is ever needed.

use crate::config::{ColumnSpec, SourceSpec};

/// Positional bind placeholder understood by the MySQL driver.
pub const PLACEHOLDER: &str = "?";

/// Statement used to check whether a source's table exists. Any error from
/// running it is read as "table absent".
pub fn probe_statement(source: &SourceSpec) -> String {
    format!("SELECT * FROM {} LIMIT 0", source.name)
}

/// `CREATE TABLE <name> (<col> <type>, ... [, <suffix>])`
///
/// Columns appear in declaration order. A non-empty `create_table_opts`
/// suffix is appended verbatim after a separating comma.
pub fn create_table_statement(source: &SourceSpec) -> String {
    let mut defs: Vec<String> = source
        .csv
        .columns
        .iter()
        .map(|col| format!("{} {}", col.name, col.sql_type))
        .collect();

    if !source.csv.create_table_options.is_empty() {
        defs.push(source.csv.create_table_options.clone());
    }

    format!("CREATE TABLE {} ({})", source.name, defs.join(", "))
}

/// `INSERT IGNORE INTO <name> (<cols>) VALUES (<slots>),...` with exactly
/// `row_count` value tuples, or `None` when there is nothing to insert.
///
/// Every slot consumes one bound parameter, so the caller must bind
/// `row_count * columns` values in row-major order.
pub fn insert_statement(source: &SourceSpec, row_count: usize) -> Option<String> {
    if row_count == 0 {
        return None;
    }

    let columns = &source.csv.columns;
    let names = columns
        .iter()
        .map(|col| col.name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let tuple = format!(
        "({})",
        columns.iter().map(value_slot).collect::<Vec<_>>().join(",")
    );

    let header = format!("INSERT IGNORE INTO {} ({names}) VALUES ", source.name);

    let mut sql = String::with_capacity(header.len() + (tuple.len() + 1) * row_count);
    sql.push_str(&header);
    sql.push_str(&tuple);
    sql.push_str(&format!(",{tuple}").repeat(row_count - 1));

    Some(sql)
}

/// The value expression for one column: its formatter, or the bare
/// placeholder.
pub fn value_slot(column: &ColumnSpec) -> &str {
    column.formatter.as_deref().unwrap_or(PLACEHOLDER)
}
