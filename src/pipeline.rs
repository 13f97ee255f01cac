//! Import orchestration: the row-count guard plus the preview and import
//! flows that the HTTP layer (or here, the CLI) triggers.
//!
//! Rows are validated and persisted strictly in input order, one store
//! round-trip at a time. A persistence failure is caught per row and reported
//! in that row's error list, so one bad row never aborts the batch.

use crate::config::Import;
use crate::csv::{self, ParsedCsv};
use crate::model::{
    EntityKind, FailedRow, ImportSummary, PreviewReport, PreviewRow, PreviewTotals, RowOutcome,
};
use crate::persist::persist_import_record;
use crate::store::DocumentStore;
use crate::validate::build_validation_context;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Hard abort conditions. Everything else in the pipeline is reported per row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("The uploaded file contains {count} rows. The maximum supported per import is {max}. Please split the file and try again.")]
    RowLimitExceeded { count: usize, max: usize },
    #[error("The uploaded file is empty.")]
    EmptyFile,
    #[error("No header row detected in CSV.")]
    NoHeaderRow,
    #[error("No data rows found in the CSV. Add at least one row below the header.")]
    NoDataRows,
}

/// Enforce the per-file row cap before any row is processed.
pub fn ensure_row_limit(count: usize, max: usize) -> Result<(), ImportError> {
    if count > max {
        return Err(ImportError::RowLimitExceeded { count, max });
    }
    Ok(())
}

fn parse_and_guard(text: &str, max_rows: usize) -> Result<ParsedCsv, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::EmptyFile);
    }
    let parsed = csv::parse_to_records(text);
    if parsed.headers.is_empty() {
        return Err(ImportError::NoHeaderRow);
    }
    ensure_row_limit(parsed.rows.len(), max_rows)?;
    if parsed.rows.is_empty() {
        return Err(ImportError::NoDataRows);
    }
    Ok(parsed)
}

/// Validate every row of a CSV upload without persisting anything.
#[instrument(skip_all, fields(entity = %entity))]
pub async fn preview(
    entity: EntityKind,
    text: &str,
    store: &dyn DocumentStore,
    import_cfg: &Import,
) -> Result<PreviewReport, ImportError> {
    let parsed = parse_and_guard(text, import_cfg.max_rows)?;
    let context = build_validation_context(entity, store, import_cfg).await;

    let rows: Vec<PreviewRow> = parsed
        .rows
        .into_iter()
        .map(|row| {
            let outcome = context.validate_row(&row.raw);
            PreviewRow {
                index: row.index,
                raw: row.raw,
                data: outcome.data,
                errors: outcome.errors,
            }
        })
        .collect();

    let valid = rows.iter().filter(|row| row.errors.is_empty()).count();
    let totals = PreviewTotals {
        total: rows.len(),
        valid,
        invalid: rows.len() - valid,
    };
    info!(total = totals.total, valid, invalid = totals.invalid, "preview complete");

    Ok(PreviewReport {
        headers: parsed.headers,
        rows,
        totals,
    })
}

/// Validate and persist a CSV upload row by row, in input order.
#[instrument(skip_all, fields(entity = %entity))]
pub async fn import(
    entity: EntityKind,
    text: &str,
    store: &dyn DocumentStore,
    import_cfg: &Import,
) -> Result<ImportSummary, ImportError> {
    let parsed = parse_and_guard(text, import_cfg.max_rows)?;
    let context = build_validation_context(entity, store, import_cfg).await;

    let total = parsed.rows.len();
    let mut created = 0;
    let mut updated = 0;
    let mut failed = Vec::new();

    for row in parsed.rows {
        let outcome = context.validate_row(&row.raw);
        if !outcome.errors.is_empty() {
            failed.push(FailedRow {
                index: row.index,
                errors: outcome.errors,
            });
            continue;
        }

        match persist_import_record(store, &outcome.data).await {
            Ok(RowOutcome::Created) => created += 1,
            Ok(RowOutcome::Updated) => updated += 1,
            Err(err) => {
                warn!(?err, index = row.index, "row persistence failed");
                failed.push(FailedRow {
                    index: row.index,
                    errors: vec![err.to_string()],
                });
            }
        }
    }

    info!(total, created, updated, failed = failed.len(), "import complete");
    Ok(ImportSummary {
        total,
        created,
        updated,
        failed,
    })
}
