//! MySQL / MariaDB driver adapter backed by `mysql_async`.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Timelike};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder, Params, Value};
use tracing::debug;

use crate::client::{Connector, SqlClient};
use crate::config::ConnectConfig;
use crate::error::StewardError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Opens `mysql_async` connections from a [`ConnectConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlConnector;

/// A live `mysql_async` connection implementing [`SqlClient`].
pub struct MysqlClient {
    conn: Conn,
}

#[async_trait]
impl Connector for MysqlConnector {
    type Client = MysqlClient;

    async fn connect(&self, config: &ConnectConfig) -> Result<MysqlClient, StewardError> {
        if config.dbname.is_empty() {
            return Err(StewardError::Config("dbname is required".to_string()));
        }
        if config.user.is_empty() {
            return Err(StewardError::Config("user is required".to_string()));
        }

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .db_name(Some(config.dbname.clone()))
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()));
        if let Some(socket) = &config.socket {
            builder = builder.socket(Some(socket.clone()));
        }
        for (key, value) in &config.driver_options {
            builder = match key.as_str() {
                "prefer_socket" => builder.prefer_socket(value == "true"),
                "tcp_nodelay" => builder.tcp_nodelay(value == "true"),
                _ => {
                    debug!(option = %key, "ignoring unrecognized driver option");
                    builder
                }
            };
        }

        let conn = Conn::new(builder).await.map_err(map_driver_error)?;
        Ok(MysqlClient { conn })
    }
}

#[async_trait]
impl SqlClient for MysqlClient {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, StewardError> {
        if params.is_empty() {
            self.conn.query_drop(sql).await.map_err(map_driver_error)?;
        } else {
            self.conn
                .exec_drop(sql, to_params(params))
                .await
                .map_err(map_driver_error)?;
        }
        Ok(self.conn.affected_rows())
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, StewardError> {
        let rows: Vec<mysql_async::Row> = if params.is_empty() {
            self.conn.query(sql).await.map_err(map_driver_error)?
        } else {
            self.conn
                .exec(sql, to_params(params))
                .await
                .map_err(map_driver_error)?
        };
        Ok(build_result_set(rows))
    }

    async fn server_version(&mut self) -> Result<String, StewardError> {
        let (major, minor, patch) = self.conn.server_version();
        Ok(format!("{major}.{minor}.{patch}"))
    }
}

fn map_driver_error(err: mysql_async::Error) -> StewardError {
    match err {
        mysql_async::Error::Server(server) => StewardError::Server {
            code: server.code,
            message: server.message,
        },
        mysql_async::Error::Io(io) => StewardError::Connection(io.to_string()),
        other => StewardError::Driver(other),
    }
}

fn to_params(params: &[SqlValue]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    Params::Positional(params.iter().map(to_value).collect())
}

fn to_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Int(i) => Value::Int(*i),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Bool(b) => Value::Int(i64::from(*b)),
        SqlValue::Text(s) => Value::Bytes(s.clone().into_bytes()),
        SqlValue::Bytes(b) => Value::Bytes(b.clone()),
        SqlValue::Timestamp(ts) => Value::Date(
            u16::try_from(ts.year()).unwrap_or(0),
            ts.month() as u8,
            ts.day() as u8,
            ts.hour() as u8,
            ts.minute() as u8,
            ts.second() as u8,
            ts.nanosecond() / 1_000,
        ),
    }
}

fn from_value(value: Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(i) => SqlValue::Int(i),
        Value::UInt(u) => SqlValue::Int(i64::try_from(u).unwrap_or(i64::MAX)),
        Value::Float(f) => SqlValue::Float(f64::from(f)),
        Value::Double(d) => SqlValue::Float(d),
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => SqlValue::Text(text),
            Err(err) => SqlValue::Bytes(err.into_bytes()),
        },
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map_or(SqlValue::Null, SqlValue::Timestamp)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let total_hours = u32::from(days) * 24 + u32::from(hours);
            SqlValue::Text(format!(
                "{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}

fn build_result_set(rows: Vec<mysql_async::Row>) -> ResultSet {
    let columns: Vec<String> = rows
        .first()
        .map(|row| {
            row.columns_ref()
                .iter()
                .map(|col| col.name_str().to_string())
                .collect()
        })
        .unwrap_or_default();
    let values: Vec<Vec<SqlValue>> = rows
        .into_iter()
        .map(|row| row.unwrap().into_iter().map(from_value).collect())
        .collect();
    ResultSet::from_rows(columns, values)
}
