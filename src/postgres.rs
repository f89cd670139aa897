// =====================================================
// POSTGRESQL CONNECTION, QUERY AND SCANNING
// =====================================================

use crate::db::sql_utils::build_select_query;
use crate::db_types::{ConnectionConfig, SqlValue};
use crate::error::{CopyError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgSslMode};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, Statement, TypeInfo, ValueRef};

const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

// --- Connection ---

/// Starts from the libpq environment (PGHOST, PGUSER, ..., ~/.pgpass) and
/// applies explicit overrides on top.
pub fn connect_options(config: &ConnectionConfig) -> Result<PgConnectOptions> {
    let mut options = PgConnectOptions::new();

    if let Some(host) = &config.host {
        options = options.host(host);
    }
    if let Some(port) = config.port {
        options = options.port(port);
    }
    if let Some(user) = &config.username {
        options = options.username(user);
    }
    if let Some(pwd) = &config.password {
        options = options.password(pwd);
    }
    if let Some(db) = &config.database {
        if !db.is_empty() {
            options = options.database(db);
        }
    }

    if let Some(ssl) = &config.ssl_mode {
        let mode = ssl
            .parse::<PgSslMode>()
            .map_err(|e| CopyError::InvalidArguments(format!("Invalid sslmode {}: {}", ssl, e)))?;
        options = options.ssl_mode(mode);
    }

    Ok(options.log_statements(log::LevelFilter::Debug))
}

pub async fn connect(config: &ConnectionConfig) -> Result<PgConnection> {
    let options = connect_options(config)?;
    let host = options.get_host().to_string();
    let port = options.get_port();

    log::debug!("Connecting to PostgreSQL at {}:{}", host, port);
    options.connect().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("connection refused") || err_msg.contains("Connection refused") {
            return CopyError::Connection(format!(
                "Connection refused. Check if PostgreSQL is running on {}:{}",
                host, port
            ));
        }
        CopyError::Connection(format!("Connection failed: {}", e))
    })
}

// --- Query Execution ---

/// A prepared `SELECT *` whose rows have not been fetched yet.
pub struct QueryCursor {
    conn: PgConnection,
    query: String,
    columns: Vec<String>,
}

impl QueryCursor {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn into_parts(self) -> (PgConnection, String, Vec<String>) {
        (self.conn, self.query, self.columns)
    }
}

/// Builds and prepares the query so column names are known, and the table and
/// where clause validated, before any row is streamed.
pub async fn open_cursor(
    mut conn: PgConnection,
    table: &str,
    where_clause: Option<&str>,
) -> Result<QueryCursor> {
    let query = build_select_query(table, where_clause);
    log::debug!("Preparing query: {}", query);

    let columns = {
        let statement = (&mut conn)
            .prepare(query.as_str())
            .await
            .map_err(|e| CopyError::Query(format!("Failed to run query `{}`: {}", query, e)))?;
        statement
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect::<Vec<String>>()
    };

    log::debug!("Query returns {} column(s): {}", columns.len(), columns.join(", "));
    Ok(QueryCursor {
        conn,
        query,
        columns,
    })
}

pub async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        log::debug!("Failed to close connection cleanly: {}", e);
    }
}

// --- Scanning ---

/// Rows come from the simple-query protocol, so every value is in text format
/// and can be read as a string before being typed here. A value that is not
/// valid UTF-8 has no usable text form and is kept as `Other`.
pub fn scan_row(row: &PgRow) -> Result<Vec<SqlValue>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let type_name = column.type_info().name();
            let value = row
                .try_get_raw(i)
                .map_err(|e| CopyError::Scan(format!("column {}: {}", column.name(), e)))?;
            if value.is_null() {
                return Ok(SqlValue::Null);
            }
            match value.as_str() {
                Ok(text) => scan_value(type_name, Some(text.to_string()))
                    .map_err(|e| CopyError::Scan(format!("column {}: {}", column.name(), e))),
                Err(_) => Ok(SqlValue::Other {
                    type_name: type_name.to_string(),
                    rendered: value
                        .as_bytes()
                        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                        .unwrap_or_default(),
                }),
            }
        })
        .collect()
}

pub fn scan_value(type_name: &str, raw: Option<String>) -> Result<SqlValue, String> {
    let Some(text) = raw else {
        return Ok(SqlValue::Null);
    };

    let kind = type_name.to_ascii_uppercase();
    match kind.as_str() {
        "BOOL" => match text.as_str() {
            "t" | "true" => Ok(SqlValue::Bool(true)),
            "f" | "false" => Ok(SqlValue::Bool(false)),
            other => Err(format!("invalid boolean {:?}", other)),
        },
        "INT2" | "INT4" | "INT8" | "OID" => text
            .parse::<i64>()
            .map(SqlValue::Int)
            .map_err(|e| format!("invalid integer {:?}: {}", text, e)),
        "FLOAT4" | "FLOAT8" => parse_float(&text).map(SqlValue::Float),
        "BYTEA" => parse_bytea(&text).map(SqlValue::Bytes),
        "TIMESTAMPTZ" => Ok(DateTime::parse_from_str(&text, TIMESTAMPTZ_FORMAT)
            .map(SqlValue::Timestamp)
            .unwrap_or(SqlValue::Text(text))),
        "TIMESTAMP" => Ok(NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
            .map(|naive| SqlValue::Timestamp(naive.and_utc().fixed_offset()))
            .unwrap_or(SqlValue::Text(text))),
        "DATE" => Ok(NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| SqlValue::Timestamp(naive.and_utc().fixed_offset()))
            .unwrap_or(SqlValue::Text(text))),
        // Character types, NUMERIC, UUID, JSON, arrays, enums, ranges, domains
        // and any other type: the server's text form is a valid quoted literal.
        _ => Ok(SqlValue::Text(text)),
    }
}

fn parse_float(text: &str) -> Result<f64, String> {
    match text {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => text
            .parse::<f64>()
            .map_err(|e| format!("invalid float {:?}: {}", text, e)),
    }
}

fn parse_bytea(text: &str) -> Result<Vec<u8>, String> {
    let digits = text
        .strip_prefix("\\x")
        .ok_or_else(|| "bytea is not in hex output format".to_string())?;
    hex::decode(digits).map_err(|e| format!("invalid bytea hex: {}", e))
}

#[cfg(test)]
mod tests;
