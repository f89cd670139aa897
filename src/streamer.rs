// =====================================================
// ROW STREAMER
// Producer side of the one-row handoff
// =====================================================

use crate::db::sql_utils::format_column;
use crate::db_types::{Row, SqlValue};
use crate::error::{CopyError, Result};
use crate::postgres::{self, QueryCursor};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The producer may prepare at most one row beyond what the consumer has taken.
pub const ROW_HANDOFF_CAPACITY: usize = 1;

pub type RowReceiver = mpsc::Receiver<Result<Row>>;

/// Consumer handle: the receiving end of the handoff plus the producer task.
pub struct RowStream {
    rows: RowReceiver,
    producer: JoinHandle<u64>,
}

impl RowStream {
    pub fn rows(&mut self) -> &mut RowReceiver {
        &mut self.rows
    }

    /// Waits for the producer to finish and returns how many rows it published.
    pub async fn join(self) -> Result<u64> {
        drop(self.rows);
        self.producer
            .await
            .map_err(|e| CopyError::Scan(format!("row streamer task failed: {}", e)))
    }
}

pub fn convert_row(columns: &[String], values: Vec<SqlValue>) -> Result<Row> {
    if values.len() != columns.len() {
        return Err(CopyError::Scan(format!(
            "row has {} value(s) for {} column(s)",
            values.len(),
            columns.len()
        )));
    }

    let mut literals = HashMap::with_capacity(columns.len());
    let mut warnings = Vec::new();
    for (column, value) in columns.iter().zip(values.iter()) {
        let (literal, warning) = format_column(column, value);
        literals.insert(column.clone(), literal);
        warnings.extend(warning);
    }

    Ok(Row { literals, warnings })
}

/// Converts and sends rows in cursor order. Stops after the first error (which
/// is forwarded) or when the consumer has gone away. A row is pulled from the
/// source only once the handoff slot is free.
pub async fn publish_rows<S>(
    columns: &[String],
    mut rows: S,
    tx: &mpsc::Sender<Result<Row>>,
) -> u64
where
    S: Stream<Item = Result<Vec<SqlValue>>> + Unpin,
{
    let mut published = 0;
    loop {
        let permit = match tx.reserve().await {
            Ok(permit) => permit,
            Err(_) => {
                log::debug!("Row consumer closed after {} row(s)", published);
                break;
            }
        };
        let Some(next) = rows.next().await else {
            break;
        };

        let message = next.and_then(|values| convert_row(columns, values));
        let failed = message.is_err();
        permit.send(message);
        if failed {
            break;
        }
        published += 1;
    }
    published
}

/// Streams already-scanned rows from any source on a separate task.
pub fn spawn<S>(columns: Vec<String>, rows: S) -> RowStream
where
    S: Stream<Item = Result<Vec<SqlValue>>> + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(ROW_HANDOFF_CAPACITY);
    let producer = tokio::spawn(async move { publish_rows(&columns, rows, &tx).await });
    RowStream { rows: rx, producer }
}

/// Takes ownership of the cursor and streams its rows on a separate task.
pub fn spawn_cursor(cursor: QueryCursor) -> RowStream {
    let (tx, rx) = mpsc::channel(ROW_HANDOFF_CAPACITY);
    let producer = tokio::spawn(async move {
        let (mut conn, query, columns) = cursor.into_parts();
        let published = {
            let rows = sqlx::raw_sql(&query).fetch(&mut conn).map(|fetched| {
                fetched
                    .map_err(CopyError::from)
                    .and_then(|row| postgres::scan_row(&row))
            });
            publish_rows(&columns, rows, &tx).await
        };
        drop(tx);
        log::debug!("Row streamer finished after {} row(s)", published);
        postgres::close(conn).await;
        published
    });
    RowStream { rows: rx, producer }
}
