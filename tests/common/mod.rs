//! Scripted mock backend shared by the integration tests.
//!
//! Replies are matched by SQL substring and consumed in order; statements
//! with no scripted reply succeed with an empty result. Every issued
//! statement and every connect is recorded for assertions.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sql_steward::prelude::*;

pub enum Reply {
    Rows(ResultSet),
    Affected(u64),
    Fail(StewardError),
}

pub struct Scripted {
    pub pattern: &'static str,
    pub reply: Reply,
}

pub struct MockState {
    pub replies: Vec<Scripted>,
    pub issued: Vec<String>,
    pub connects: usize,
    pub version: String,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            replies: Vec::new(),
            issued: Vec::new(),
            connects: 0,
            version: "8.0.36".to_string(),
        }
    }
}

impl MockState {
    pub fn script(&mut self, pattern: &'static str, reply: Reply) {
        self.replies.push(Scripted { pattern, reply });
    }

    pub fn issued_matching(&self, pattern: &str) -> usize {
        self.issued.iter().filter(|sql| sql.contains(pattern)).count()
    }

    fn take_reply(&mut self, sql: &str) -> Option<Reply> {
        let index = self
            .replies
            .iter()
            .position(|scripted| sql.contains(scripted.pattern))?;
        Some(self.replies.remove(index).reply)
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    pub state: Arc<Mutex<MockState>>,
}

pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl Connector for MockConnector {
    type Client = MockClient;

    async fn connect(&self, _config: &ConnectConfig) -> Result<MockClient, StewardError> {
        let mut state = self.state.lock().expect("mock state");
        state.connects += 1;
        Ok(MockClient {
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl SqlClient for MockClient {
    async fn execute(&mut self, sql: &str, _params: &[SqlValue]) -> Result<u64, StewardError> {
        let mut state = self.state.lock().expect("mock state");
        state.issued.push(sql.to_string());
        match state.take_reply(sql) {
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Rows(_)) | None => Ok(0),
        }
    }

    async fn query(&mut self, sql: &str, _params: &[SqlValue]) -> Result<ResultSet, StewardError> {
        let mut state = self.state.lock().expect("mock state");
        state.issued.push(sql.to_string());
        match state.take_reply(sql) {
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Rows(set)) => Ok(set),
            Some(Reply::Affected(_)) | None => Ok(ResultSet::default()),
        }
    }

    async fn server_version(&mut self) -> Result<String, StewardError> {
        let state = self.state.lock().expect("mock state");
        Ok(state.version.clone())
    }
}

pub fn harness() -> (MockConnector, Arc<Mutex<MockState>>) {
    let connector = MockConnector::default();
    let state = connector.state.clone();
    (connector, state)
}

/// A config whose session init issues no SQL-mode statements, so tests can
/// assert on exactly the statements they script.
pub fn quiet_config() -> ConnectConfig {
    ConnectConfig::new("cms", "editor", "secret").with_sql_mode_directives(vec![])
}

pub fn server_gone() -> StewardError {
    StewardError::Server {
        code: 2006,
        message: "MySQL server has gone away".to_string(),
    }
}

pub fn syntax_error() -> StewardError {
    StewardError::Server {
        code: 1064,
        message: "You have an error in your SQL syntax".to_string(),
    }
}

/// Result shape of `SHOW VARIABLES LIKE ...`.
pub fn var_result(name: &str, value: &str) -> ResultSet {
    ResultSet::from_rows(
        vec!["Variable_name".to_string(), "Value".to_string()],
        vec![vec![
            SqlValue::Text(name.to_string()),
            SqlValue::Text(value.to_string()),
        ]],
    )
}

/// Result shape of `SHOW TABLE STATUS LIKE ...`.
pub fn table_status_result(name: &str, engine: &str) -> ResultSet {
    ResultSet::from_rows(
        vec!["Name".to_string(), "Engine".to_string()],
        vec![vec![
            SqlValue::Text(name.to_string()),
            SqlValue::Text(engine.to_string()),
        ]],
    )
}

/// A single-column result set, one row per value.
pub fn single_column(column: &str, values: &[&str]) -> ResultSet {
    ResultSet::from_rows(
        vec![column.to_string()],
        values
            .iter()
            .map(|v| vec![SqlValue::Text((*v).to_string())])
            .collect(),
    )
}

/// In-memory durable cache for stopword tests.
#[derive(Clone, Default)]
pub struct MemoryCache {
    pub entries: Arc<Mutex<HashMap<String, String>>>,
}

#[async_trait]
impl DurableCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("cache state").get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) {
        self.entries
            .lock()
            .expect("cache state")
            .insert(key.to_string(), value.to_string());
    }
}
