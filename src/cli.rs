// =====================================================
// COMMAND LINE
// Flags, positional arguments and the where-clause prompt
// =====================================================

use crate::db_types::{ConnectionConfig, CopyRequest, GenerationMode};
use crate::error::{CopyError, Result};
use clap::{ArgAction, Parser};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Copies table data as either INSERT or UPDATE statements.
///
/// Example: pgcp -U myuser -d mydb INSERT t_user "WHERE user_id < 4"
///
/// Connection settings not given as flags are read from PGHOST, PGPORT,
/// PGUSER, PGPASSWORD, PGDATABASE, PGSSLMODE and ~/.pgpass.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_flag = true)]
pub struct Args {
    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,

    /// PostgreSQL user.
    #[arg(short = 'U', long = "user")]
    pub user: Option<String>,

    /// Database host (default: localhost).
    #[arg(short = 'h', long = "host")]
    pub host: Option<String>,

    /// Database port (default: 5432).
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Database name.
    #[arg(short = 'd', long = "dbname")]
    pub dbname: Option<String>,

    /// Password for the PostgreSQL user.
    #[arg(long = "pw", visible_alias = "password")]
    pub password: Option<String>,

    /// libpq SSL mode (disable, allow, prefer, require, verify-ca, verify-full).
    #[arg(
        long = "sslmode",
        value_parser = ["disable", "allow", "prefer", "require", "verify-ca", "verify-full"]
    )]
    pub ssl_mode: Option<String>,

    /// Write statements to this file instead of stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Do not ask for confirmation when no where clause is given.
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Type of SQL to generate: insert or update.
    pub gen_type: String,

    /// Name of the table to copy.
    pub table: String,

    /// INSERT: [whereClause]. UPDATE: <idColumn> [whereClause].
    #[arg(value_name = "ARGS")]
    pub rest: Vec<String>,
}

impl Args {
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.user.clone(),
            password: self.password.clone(),
            database: self.dbname.clone(),
            ssl_mode: self.ssl_mode.clone(),
        }
    }

    pub fn copy_request(&self) -> Result<CopyRequest> {
        let mode: GenerationMode = self.gen_type.parse()?;
        let mut rest = self.rest.iter().cloned();

        let id_column = match mode {
            GenerationMode::Insert => None,
            GenerationMode::Update => {
                let id_column = rest
                    .next()
                    .filter(|column| !column.trim().is_empty())
                    .ok_or_else(|| {
                        CopyError::InvalidArguments("UPDATE requires an idColumn".to_string())
                    })?;
                Some(id_column)
            }
        };

        let where_clause = rest.next().filter(|clause| !clause.trim().is_empty());
        if let Some(extra) = rest.next() {
            return Err(CopyError::InvalidArguments(format!(
                "Unexpected argument: {}",
                extra
            )));
        }

        Ok(CopyRequest {
            mode,
            table: self.table.clone(),
            where_clause,
            id_column,
        })
    }
}

pub const NO_WHERE_CLAUSE_PROMPT: &str = "Did you intend to have no where clause? [Y/n] ";

/// Asks a yes/no question; an empty answer takes `default`.
pub fn prompt_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: bool,
) -> Result<bool> {
    loop {
        output.write_all(question.as_bytes())?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(default);
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}

/// A missing where clause copies the whole table, so it has to be confirmed
/// unless `--yes` was given.
pub fn confirm_request<R: BufRead, W: Write>(
    request: &CopyRequest,
    assume_yes: bool,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    if request.where_clause.is_some() || assume_yes {
        return Ok(());
    }
    if prompt_yes_no(input, output, NO_WHERE_CLAUSE_PROMPT, true)? {
        Ok(())
    } else {
        Err(CopyError::Aborted(
            "no where clause was given and the copy was not confirmed".to_string(),
        ))
    }
}
