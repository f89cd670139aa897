use super::*;
use crate::db::sql_utils::value_to_sql_literal;

fn scan(type_name: &str, raw: &str) -> SqlValue {
    scan_value(type_name, Some(raw.to_string())).unwrap()
}

#[test]
fn null_of_any_type_scans_as_null() {
    for type_name in ["INT4", "TEXT", "TIMESTAMPTZ", "POINT"] {
        assert_eq!(scan_value(type_name, None), Ok(SqlValue::Null));
    }
}

#[test]
fn scans_integers_and_booleans() {
    assert_eq!(scan("INT2", "-7"), SqlValue::Int(-7));
    assert_eq!(scan("INT8", "9223372036854775807"), SqlValue::Int(i64::MAX));
    assert_eq!(scan("BOOL", "t"), SqlValue::Bool(true));
    assert_eq!(scan("BOOL", "f"), SqlValue::Bool(false));
    assert!(scan_value("INT4", Some("abc".to_string())).is_err());
    assert!(scan_value("BOOL", Some("maybe".to_string())).is_err());
}

#[test]
fn scans_floats_including_special_values() {
    assert_eq!(scan("FLOAT4", "0.1"), SqlValue::Float(0.1));
    assert_eq!(scan("FLOAT8", "-2.5e-3"), SqlValue::Float(-0.0025));
    assert_eq!(scan("FLOAT8", "Infinity"), SqlValue::Float(f64::INFINITY));
    assert!(matches!(scan("FLOAT8", "NaN"), SqlValue::Float(v) if v.is_nan()));
}

#[test]
fn scans_bytea_hex_output() {
    assert_eq!(scan("BYTEA", "\\x4869"), SqlValue::Bytes(b"Hi".to_vec()));
    assert_eq!(
        value_to_sql_literal(&scan("BYTEA", "\\xdeadbeef00")),
        "'\\xdeadbeef00'"
    );
    assert!(scan_value("BYTEA", Some("\\x4g".to_string())).is_err());
    assert!(scan_value("BYTEA", Some("Hi".to_string())).is_err());
}

#[test]
fn scans_timestamps_with_offsets() {
    let value = scan("TIMESTAMPTZ", "2024-03-09 07:05:01.123987+02");
    assert_eq!(value_to_sql_literal(&value), "'2024-03-09T07:05:01.123+0200'");

    let value = scan("TIMESTAMPTZ", "2024-03-09 07:05:01-05:30");
    assert_eq!(value_to_sql_literal(&value), "'2024-03-09T07:05:01.000-0530'");

    let value = scan("TIMESTAMP", "2024-03-09 07:05:01.5");
    assert_eq!(value_to_sql_literal(&value), "'2024-03-09T07:05:01.500+0000'");

    let value = scan("DATE", "2024-03-09");
    assert_eq!(value_to_sql_literal(&value), "'2024-03-09T00:00:00.000+0000'");
}

#[test]
fn unparseable_timestamps_stay_quoted_text() {
    assert_eq!(
        scan("TIMESTAMPTZ", "infinity"),
        SqlValue::Text("infinity".to_string())
    );
    assert_eq!(
        scan("DATE", "0044-03-15 BC"),
        SqlValue::Text("0044-03-15 BC".to_string())
    );
}

#[test]
fn text_like_types_scan_as_text() {
    assert_eq!(scan("TEXT", "Ann's"), SqlValue::Text("Ann's".to_string()));
    assert_eq!(scan("varchar", "x"), SqlValue::Text("x".to_string()));
    assert_eq!(scan("NUMERIC", "12.50"), SqlValue::Text("12.50".to_string()));
    assert_eq!(
        scan("JSONB", "{\"k\": \"it's\"}"),
        SqlValue::Text("{\"k\": \"it's\"}".to_string())
    );
    assert_eq!(
        value_to_sql_literal(&scan("JSONB", "{\"k\": \"it's\"}")),
        "'{\"k\": \"it''s\"}'"
    );
}

#[test]
fn arrays_scan_as_quoted_text() {
    let value = scan("TEXT[]", "{\"x'); DROP TABLE t; --\"}");
    assert_eq!(
        value_to_sql_literal(&value),
        "'{\"x''); DROP TABLE t; --\"}'"
    );
    assert_eq!(value_to_sql_literal(&scan("_int4", "{1,2}")), "'{1,2}'");
    assert_eq!(value_to_sql_literal(&scan("INT4[]", "{}")), "'{}'");
}

#[test]
fn user_defined_and_geometric_types_scan_as_text() {
    assert_eq!(scan("mood", "happy"), SqlValue::Text("happy".to_string()));
    assert_eq!(value_to_sql_literal(&scan("mood", "it's")), "'it''s'");
    assert_eq!(value_to_sql_literal(&scan("POINT", "(1,2)")), "'(1,2)'");
    assert_eq!(value_to_sql_literal(&scan("INT4RANGE", "[1,5)")), "'[1,5)'");
    assert_eq!(
        value_to_sql_literal(&scan("HSTORE", "\"a\"=>\"b\"")),
        "'\"a\"=>\"b\"'"
    );
}

#[test]
fn connect_options_apply_overrides() {
    let config = ConnectionConfig {
        host: Some("db.internal".to_string()),
        port: Some(6543),
        username: Some("copier".to_string()),
        password: None,
        database: Some("app".to_string()),
        ssl_mode: Some("disable".to_string()),
    };
    let options = connect_options(&config).unwrap();
    assert_eq!(options.get_host(), "db.internal");
    assert_eq!(options.get_port(), 6543);
    assert_eq!(options.get_username(), "copier");
    assert_eq!(options.get_database(), Some("app"));
}

#[test]
fn connect_options_accept_every_libpq_sslmode() {
    for mode in ["disable", "allow", "prefer", "require", "verify-ca", "verify-full"] {
        let config = ConnectionConfig {
            ssl_mode: Some(mode.to_string()),
            ..ConnectionConfig::default()
        };
        assert!(connect_options(&config).is_ok(), "{mode}");
    }
}

#[test]
fn unknown_sslmode_is_invalid_arguments() {
    let config = ConnectionConfig {
        ssl_mode: Some("requir".to_string()),
        ..ConnectionConfig::default()
    };
    assert!(matches!(
        connect_options(&config),
        Err(CopyError::InvalidArguments(_))
    ));
}

// --- Live database ---

fn integration_enabled() -> bool {
    std::env::var("PGCP_RUN_INTEGRATION_DB_TESTS")
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(false)
}

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn postgres_it_config() -> Result<ConnectionConfig, String> {
    let port = env_or_default("PGCP_IT_POSTGRES_PORT", "5432")
        .parse::<u16>()
        .map_err(|e| format!("Invalid PGCP_IT_POSTGRES_PORT: {}", e))?;
    Ok(ConnectionConfig {
        host: Some(env_or_default("PGCP_IT_POSTGRES_HOST", "127.0.0.1")),
        port: Some(port),
        username: Some(env_or_default("PGCP_IT_POSTGRES_USER", "postgres")),
        password: Some(env_or_default("PGCP_IT_POSTGRES_PASSWORD", "postgres")),
        database: Some(env_or_default("PGCP_IT_POSTGRES_DATABASE", "postgres")),
        ssl_mode: Some("disable".to_string()),
    })
}

#[tokio::test]
#[ignore = "requires PostgreSQL integration environment"]
async fn integration_scans_live_rows() -> Result<(), String> {
    if !integration_enabled() {
        return Ok(());
    }

    let config = postgres_it_config()?;
    let mut conn = connect(&config).await.map_err(|e| e.to_string())?;
    sqlx::raw_sql(
        "DROP TABLE IF EXISTS pgcp_it_user;
         CREATE TABLE pgcp_it_user (id INT8 PRIMARY KEY, name TEXT, email TEXT, active BOOL);
         INSERT INTO pgcp_it_user VALUES (1, 'Ann''s', NULL, true);",
    )
    .execute(&mut conn)
    .await
    .map_err(|e| e.to_string())?;

    let cursor = open_cursor(conn, "pgcp_it_user", Some("WHERE id = 1"))
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(cursor.columns(), ["id", "name", "email", "active"]);
    assert_eq!(cursor.query(), "SELECT * FROM pgcp_it_user WHERE id = 1");

    let (mut conn, query, _) = cursor.into_parts();
    let rows = sqlx::raw_sql(&query)
        .fetch_all(&mut conn)
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(rows.len(), 1);
    let values = scan_row(&rows[0]).map_err(|e| e.to_string())?;
    assert_eq!(
        values,
        vec![
            SqlValue::Int(1),
            SqlValue::Text("Ann's".to_string()),
            SqlValue::Null,
            SqlValue::Bool(true),
        ]
    );

    close(conn).await;
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL integration environment"]
async fn integration_scans_arrays_enums_and_bytea_as_literals() -> Result<(), String> {
    if !integration_enabled() {
        return Ok(());
    }

    let config = postgres_it_config()?;
    let mut conn = connect(&config).await.map_err(|e| e.to_string())?;
    let rows = sqlx::raw_sql(
        "DROP TABLE IF EXISTS pgcp_it_extra;
         DROP TYPE IF EXISTS pgcp_it_mood;
         CREATE TYPE pgcp_it_mood AS ENUM ('happy', 'sad');
         CREATE TABLE pgcp_it_extra (tags TEXT[], mood pgcp_it_mood, payload BYTEA);
         INSERT INTO pgcp_it_extra VALUES
             (ARRAY['x''); DROP TABLE t; --'], 'happy', '\\xdeadbeef00');
         SELECT * FROM pgcp_it_extra;",
    )
    .fetch_all(&mut conn)
    .await
    .map_err(|e| e.to_string())?;
    assert_eq!(rows.len(), 1);

    let literals: Vec<String> = scan_row(&rows[0])
        .map_err(|e| e.to_string())?
        .iter()
        .map(value_to_sql_literal)
        .collect();
    assert_eq!(
        literals,
        vec![
            "'{\"x''); DROP TABLE t; --\"}'".to_string(),
            "'happy'".to_string(),
            "'\\xdeadbeef00'".to_string(),
        ]
    );

    close(conn).await;
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL integration environment"]
async fn integration_missing_table_is_query_error() -> Result<(), String> {
    if !integration_enabled() {
        return Ok(());
    }

    let config = postgres_it_config()?;
    let conn = connect(&config).await.map_err(|e| e.to_string())?;
    match open_cursor(conn, "pgcp_it_no_such_table", None).await {
        Err(CopyError::Query(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error: {}", other)),
        Ok(_) => Err("query against a missing table succeeded".to_string()),
    }
}
