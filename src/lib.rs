// Copies PostgreSQL table rows as INSERT or UPDATE statements.

pub mod cli;
pub mod db;
pub mod db_types;
pub mod error;
pub mod postgres;
pub mod streamer;

use crate::cli::Args;
use crate::db::statements::{check_identifier_column, StatementGenerator};
use crate::db_types::CopyRequest;
use crate::error::{CopyError, Result};
use crate::postgres::QueryCursor;
use crate::streamer::RowStream;
use tokio::io::{AsyncWrite, BufWriter};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout carries the generated SQL.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

pub async fn run(args: Args) -> Result<()> {
    let request = args.copy_request()?;
    {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut prompt = std::io::stderr();
        cli::confirm_request(&request, args.yes, &mut input, &mut prompt)?;
    }

    let conn = postgres::connect(&args.connection_config()).await?;
    let cursor =
        postgres::open_cursor(conn, &request.table, request.where_clause.as_deref()).await?;
    check_identifier_column(&request, cursor.columns())?;

    let written = match &args.output {
        Some(path) => {
            let file = tokio::fs::File::create(path).await.map_err(|e| {
                CopyError::Output(format!("Failed to create {}: {}", path.display(), e))
            })?;
            copy_rows(cursor, &request, BufWriter::new(file)).await?
        }
        None => copy_rows(cursor, &request, tokio::io::stdout()).await?,
    };

    log::info!("Generated {} {} statement(s)", written, request.mode);
    Ok(())
}

pub async fn copy_rows<W>(cursor: QueryCursor, request: &CopyRequest, writer: W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let query = cursor.query().to_string();
    let columns = cursor.columns().to_vec();
    let stream = streamer::spawn_cursor(cursor);
    let (written, _) = write_statements(request, &query, columns, stream, writer).await?;
    Ok(written)
}

/// Consumer side of the pipeline: header, then one statement per streamed row.
/// Whatever was written before a failure is flushed, never retracted.
pub async fn write_statements<W>(
    request: &CopyRequest,
    query: &str,
    columns: Vec<String>,
    mut stream: RowStream,
    writer: W,
) -> Result<(u64, W)>
where
    W: AsyncWrite + Unpin,
{
    let mut generator = StatementGenerator::new(writer, request, columns)?;
    generator.write_header(query).await?;

    // A drain error is the root cause and wins over a later flush error.
    let drained = generator.drain(stream.rows()).await;
    let flushed = generator.flush().await;
    let written = drained?;
    flushed?;

    let published = stream.join().await?;
    log::debug!("Streamed {} row(s), wrote {} statement(s)", published, written);
    Ok((written, generator.finish().await?))
}
