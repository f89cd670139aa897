// =====================================================
// STATEMENT GENERATOR
// Drains converted rows and writes INSERT/UPDATE text
// =====================================================

use crate::db::sql_utils::{
    build_insert_statement, build_update_statement, header_comment, warning_comment,
};
use crate::db_types::{CopyRequest, GenerationMode, Row};
use crate::error::{CopyError, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

enum StatementKind {
    Insert,
    Update { id_column: String },
}

/// Returns the identifier column for UPDATE once it is known to be part of the result.
pub fn check_identifier_column<'a>(
    request: &'a CopyRequest,
    columns: &[String],
) -> Result<Option<&'a str>> {
    match request.mode {
        GenerationMode::Insert => Ok(None),
        GenerationMode::Update => {
            let id_column = request.id_column.as_deref().ok_or_else(|| {
                CopyError::InvalidArguments("UPDATE requires an idColumn".to_string())
            })?;
            if !columns.iter().any(|column| column == id_column) {
                return Err(CopyError::MissingIdentifierColumn(id_column.to_string()));
            }
            if columns.iter().all(|column| column == id_column) {
                return Err(CopyError::InvalidArguments(format!(
                    "UPDATE needs at least one column besides {}",
                    id_column
                )));
            }
            Ok(Some(id_column))
        }
    }
}

pub struct StatementGenerator<W> {
    writer: W,
    table: String,
    columns: Vec<String>,
    kind: StatementKind,
    mode: GenerationMode,
    statements_written: u64,
}

impl<W: AsyncWrite + Unpin> StatementGenerator<W> {
    /// Fails before anything is written if the identifier column is not part of the result.
    pub fn new(writer: W, request: &CopyRequest, columns: Vec<String>) -> Result<Self> {
        let kind = match check_identifier_column(request, &columns)? {
            None => StatementKind::Insert,
            Some(id_column) => StatementKind::Update {
                id_column: id_column.to_string(),
            },
        };

        Ok(Self {
            writer,
            table: request.table.clone(),
            columns,
            kind,
            mode: request.mode,
            statements_written: 0,
        })
    }

    pub fn statements_written(&self) -> u64 {
        self.statements_written
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    pub async fn write_header(&mut self, query: &str) -> Result<()> {
        let header = header_comment(self.mode, query);
        self.write_line(&header).await
    }

    pub async fn write_row(&mut self, row: &Row) -> Result<()> {
        let statement = match &self.kind {
            StatementKind::Insert => build_insert_statement(&self.table, &self.columns, row)?,
            StatementKind::Update { id_column } => {
                build_update_statement(&self.table, &self.columns, id_column, row)?
            }
        };

        let mut output = String::new();
        for warning in &row.warnings {
            output.push_str(&warning_comment(warning));
            output.push('\n');
        }
        output.push_str(&statement);
        self.write_line(&output).await?;
        self.statements_written += 1;
        Ok(())
    }

    /// Writes every row until the stream closes. The first error received or
    /// raised here ends the drain.
    pub async fn drain(&mut self, rows: &mut mpsc::Receiver<Result<Row>>) -> Result<u64> {
        while let Some(next) = rows.recv().await {
            let row = next?;
            self.write_row(&row).await?;
        }
        Ok(self.statements_written)
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<W> {
        self.flush().await?;
        Ok(self.writer)
    }
}
