// src/db/mysql.rs

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

use crate::config::DbConnectionInfo;
use crate::errors::Result;

use super::{Database, DbFuture};

/// [`Database`] backed by an `sqlx` MySQL pool.
///
/// The pool is cloned cheaply and shared by every source task.
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    /// Open a pool for `info` and make sure the server answers.
    pub async fn connect(info: &DbConnectionInfo) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&info.host)
            .port(info.port)
            .username(&info.username)
            .password(&info.password)
            .database(&info.database);

        let pool = MySqlPoolOptions::new().connect_with(options).await?;

        // ping
        drop(pool.acquire().await?);

        info!(
            address = %info.address(),
            database = %info.database,
            user = %info.username,
            "connected to database"
        );

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl Database for MySqlDatabase {
    fn query<'a>(&'a self, sql: &'a str) -> DbFuture<'a, ()> {
        Box::pin(async move {
            debug!(%sql, "query");
            sqlx::query(sql).fetch_optional(&self.pool).await?;
            Ok(())
        })
    }

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [String]) -> DbFuture<'a, u64> {
        Box::pin(async move {
            debug!(params = params.len(), "execute");
            let mut query = sqlx::query(sql);
            for value in params {
                query = query.bind(value.as_str());
            }
            let result = query.execute(&self.pool).await?;
            Ok(result.rows_affected())
        })
    }
}
