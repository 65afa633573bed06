use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use csv_collector::db::{Database, DbFuture};
use csv_collector::errors::CollectorError;

/// One call made against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbCall {
    Query(String),
    Execute { sql: String, params: Vec<String> },
}

#[derive(Debug, Default)]
struct State {
    tables: HashSet<String>,
    fail_create: HashSet<String>,
    fail_insert: HashSet<String>,
    panic_insert: HashSet<String>,
    calls: Vec<DbCall>,
}

/// A fake database that:
/// - records every statement and its parameters
/// - answers probes for tables it knows about and fails the rest
/// - "creates" tables on `CREATE TABLE`
/// - can be told to fail creates or inserts for a given table, to panic once
///   on an insert, or to stall every call to exercise timeouts.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str) -> Self {
        self.state.lock().unwrap().tables.insert(table.to_string());
        self
    }

    pub fn fail_create_for(self, table: &str) -> Self {
        self.state.lock().unwrap().fail_create.insert(table.to_string());
        self
    }

    pub fn fail_insert_for(self, table: &str) -> Self {
        self.state.lock().unwrap().fail_insert.insert(table.to_string());
        self
    }

    /// Panic inside the next insert into `table`; later inserts behave
    /// normally.
    pub fn panic_once_on_insert_for(self, table: &str) -> Self {
        self.state.lock().unwrap().panic_insert.insert(table.to_string());
        self
    }

    /// Sleep this long (tokio time) before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state.lock().unwrap().tables.contains(table)
    }

    pub fn calls(&self) -> Vec<DbCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// SQL of every call, in order.
    pub fn statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|call| match call {
                DbCall::Query(sql) => sql,
                DbCall::Execute { sql, .. } => sql,
            })
            .collect()
    }

    /// Statements for `table` starting with `prefix` (e.g. "CREATE TABLE").
    pub fn count_for(&self, table: &str, prefix: &str) -> usize {
        self.statements()
            .iter()
            .filter(|sql| sql.starts_with(prefix) && table_of(sql) == Some(table))
            .count()
    }

    /// Every insert executed against `table`, with its bound values.
    pub fn inserts_for(&self, table: &str) -> Vec<(String, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DbCall::Execute { sql, params }
                    if sql.starts_with("INSERT") && table_of(&sql) == Some(table) =>
                {
                    Some((sql, params))
                }
                _ => None,
            })
            .collect()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Table name for the three statement shapes the pipeline produces.
pub fn table_of(sql: &str) -> Option<&str> {
    let words: Vec<&str> = sql.split_whitespace().collect();
    match words.as_slice() {
        ["SELECT", "*", "FROM", table, ..] => Some(*table),
        ["CREATE", "TABLE", table, ..] => Some(*table),
        ["INSERT", "IGNORE", "INTO", table, ..] => Some(*table),
        _ => None,
    }
}

impl Database for FakeDatabase {
    fn query<'a>(&'a self, sql: &'a str) -> DbFuture<'a, ()> {
        Box::pin(async move {
            self.pause().await;
            let mut state = self.state.lock().unwrap();
            state.calls.push(DbCall::Query(sql.to_string()));
            match table_of(sql) {
                Some(table) if state.tables.contains(table) => Ok(()),
                Some(table) => Err(CollectorError::Other(anyhow!(
                    "Table '{table}' doesn't exist"
                ))),
                None => Err(CollectorError::Other(anyhow!("unexpected query: {sql}"))),
            }
        })
    }

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [String]) -> DbFuture<'a, u64> {
        Box::pin(async move {
            self.pause().await;
            if let Some(table) = table_of(sql).filter(|_| sql.starts_with("INSERT")) {
                // release the lock before panicking so it is not poisoned
                let armed = self.state.lock().unwrap().panic_insert.remove(table);
                if armed {
                    panic!("insert into '{table}' panicked");
                }
            }

            let mut state = self.state.lock().unwrap();
            state.calls.push(DbCall::Execute {
                sql: sql.to_string(),
                params: params.to_vec(),
            });

            let Some(table) = table_of(sql) else {
                return Err(CollectorError::Other(anyhow!("unexpected statement: {sql}")));
            };

            if sql.starts_with("CREATE TABLE") {
                if state.fail_create.contains(table) {
                    return Err(CollectorError::Other(anyhow!(
                        "create refused for '{table}'"
                    )));
                }
                state.tables.insert(table.to_string());
                return Ok(0);
            }

            if state.fail_insert.contains(table) {
                return Err(CollectorError::Other(anyhow!(
                    "insert refused for '{table}'"
                )));
            }
            if !state.tables.contains(table) {
                return Err(CollectorError::Other(anyhow!(
                    "Table '{table}' doesn't exist"
                )));
            }

            let columns = sql
                .split_once(") VALUES ")
                .and_then(|(head, _)| head.rsplit_once('('))
                .map(|(_, cols)| cols.split(',').count())
                .unwrap_or(1);
            Ok((params.len() / columns) as u64)
        })
    }
}
