//! In-memory clients shared by the integration tests.
//!
//! They never return rows, so tests assert on the SQL text and the debug
//! rendering of the bound arguments.

#![allow(dead_code)]

use std::sync::Mutex;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use torm::{GenericClient, OrmError, OrmResult, TransactionHandle, Transactional, TxOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub sql: String,
    pub args: Vec<String>,
}

/// Records every statement; `execute` reports one affected row.
#[derive(Default)]
pub struct MockClient {
    log: Mutex<Vec<Recorded>>,
    fail: Option<String>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement fails with `message` after being recorded.
    pub fn failing(message: &str) -> Self {
        Self {
            log: Mutex::default(),
            fail: Some(message.to_string()),
        }
    }

    pub fn statements(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.statements().pop().expect("no statement recorded")
    }

    fn record(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<()> {
        self.log.lock().unwrap().push(Recorded {
            sql: sql.to_string(),
            args: params.iter().map(|p| format!("{p:?}")).collect(),
        });
        match &self.fail {
            Some(message) => Err(OrmError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.record(sql, params)?;
        Ok(Vec::new())
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Row> {
        self.record(sql, params)?;
        Err(OrmError::not_found("Expected one row, got none"))
    }

    async fn query_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Option<Row>> {
        self.record(sql, params)?;
        Ok(None)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        self.record(sql, params)?;
        Ok(1)
    }
}

/// A connection whose transactions log `begin`, `commit` and `rollback`.
#[derive(Default)]
pub struct MockConn {
    pub client: MockClient,
    events: Mutex<Vec<String>>,
    fail_commit: bool,
    fail_rollback: bool,
}

impl MockConn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_commit() -> Self {
        Self {
            fail_commit: true,
            ..Self::default()
        }
    }

    pub fn failing_rollback() -> Self {
        Self {
            fail_rollback: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn event(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

pub struct MockTx<'a> {
    conn: &'a MockConn,
}

impl GenericClient for MockTx<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.conn.client.query(sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Row> {
        self.conn.client.query_one(sql, params).await
    }

    async fn query_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Option<Row>> {
        self.conn.client.query_opt(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        self.conn.client.execute(sql, params).await
    }
}

impl TransactionHandle for MockTx<'_> {
    async fn commit(self) -> OrmResult<()> {
        self.conn.event("commit");
        if self.conn.fail_commit {
            return Err(OrmError::Connection("commit refused".to_string()));
        }
        Ok(())
    }

    async fn rollback(self) -> OrmResult<()> {
        self.conn.event("rollback");
        if self.conn.fail_rollback {
            return Err(OrmError::Connection("connection reset".to_string()));
        }
        Ok(())
    }
}

impl Transactional for MockConn {
    type Tx<'a> = MockTx<'a>;

    async fn begin<'a>(&'a mut self, options: &TxOptions) -> OrmResult<MockTx<'a>> {
        let mut event = String::from("begin");
        if let Some(isolation) = options.isolation {
            event.push_str(&format!(" {isolation:?}"));
        }
        if options.read_only {
            event.push_str(" read_only");
        }
        self.event(event);
        Ok(MockTx { conn: self })
    }
}
