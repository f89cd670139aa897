// =====================================================
// SQL UTILITIES MODULE
// Literal formatting and statement text
// =====================================================

use crate::db_types::{GenerationMode, Row, SqlValue, ValueWarning};
use crate::error::{CopyError, Result};

pub const NULL_LITERAL: &str = "null";

/// `YYYY-MM-DDTHH:MM:SS.mmm±HHMM`, milliseconds truncated.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

pub fn quote_sql_string(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

fn float_literal(value: f64) -> String {
    if value.is_nan() {
        return "'NaN'".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() {
            "'Infinity'".to_string()
        } else {
            "'-Infinity'".to_string()
        };
    }
    // Display for f64 is the shortest round-trip form and never uses an exponent.
    value.to_string()
}

pub fn value_to_sql_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => NULL_LITERAL.to_string(),
        // bytea hex input form, which keeps every byte intact.
        SqlValue::Bytes(bytes) => format!("'\\x{}'", hex::encode(bytes)),
        SqlValue::Text(s) => quote_sql_string(s),
        SqlValue::Int(v) => v.to_string(),
        SqlValue::Float(v) => float_literal(*v),
        SqlValue::Bool(v) => {
            if *v {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        SqlValue::Timestamp(ts) => format!("'{}'", ts.format(TIMESTAMP_FORMAT)),
        SqlValue::Other { rendered, .. } => quote_sql_string(rendered),
    }
}

/// Formats one column value, flagging types that only got a generic rendering.
pub fn format_column(column: &str, value: &SqlValue) -> (String, Option<ValueWarning>) {
    let warning = match value {
        SqlValue::Other { type_name, .. } => {
            log::warn!("Column {} is an unhandled type: {}", column, type_name);
            Some(ValueWarning {
                column: column.to_string(),
                type_name: type_name.clone(),
            })
        }
        _ => None,
    };
    (value_to_sql_literal(value), warning)
}

// --- Statement Text ---

pub fn build_select_query(table: &str, where_clause: Option<&str>) -> String {
    match where_clause.map(str::trim).filter(|clause| !clause.is_empty()) {
        Some(clause) => format!("SELECT * FROM {} {}", table, clause),
        None => format!("SELECT * FROM {}", table),
    }
}

pub fn header_comment(mode: GenerationMode, query: &str) -> String {
    format!("-- Creating {}(s) from query: {}", mode, query)
}

pub fn warning_comment(warning: &ValueWarning) -> String {
    format!(
        "-- Warning: column {} has unhandled type {}",
        warning.column, warning.type_name
    )
}

fn literal_for<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
    row.get(column)
        .ok_or_else(|| CopyError::Scan(format!("row has no value for column {}", column)))
}

pub fn build_insert_statement(table: &str, columns: &[String], row: &Row) -> Result<String> {
    let values = columns
        .iter()
        .map(|column| literal_for(row, column))
        .collect::<Result<Vec<&str>>>()?
        .join(", ");

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        columns.join(", "),
        values
    ))
}

pub fn build_update_statement(
    table: &str,
    columns: &[String],
    id_column: &str,
    row: &Row,
) -> Result<String> {
    let id_value = row
        .get(id_column)
        .ok_or_else(|| CopyError::MissingIdentifierColumn(id_column.to_string()))?;

    let assignments = columns
        .iter()
        .filter(|column| column.as_str() != id_column)
        .map(|column| literal_for(row, column).map(|value| format!("{}={}", column, value)))
        .collect::<Result<Vec<String>>>()?;
    if assignments.is_empty() {
        return Err(CopyError::InvalidArguments(format!(
            "UPDATE of {} has no column to set besides {}",
            table, id_column
        )));
    }
    let assignments = assignments.join(", ");

    Ok(format!(
        "UPDATE {} SET {} WHERE {}={};",
        table, assignments, id_column, id_value
    ))
}
