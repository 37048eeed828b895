// Upload Ingest
//
// What an upload handler does once a file has been parsed into rows:
// summarize it, hand it to the dataset backend, and build the receipt
// echoed back to the uploader.

use serde::Serialize;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::dataset::{DatasetId, Meta, Row, StoreError};

/// Number of leading rows echoed back in an upload receipt.
pub const PREVIEW_ROWS: usize = 5;

/// Response to a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub dataset_id: DatasetId,
    /// Stored metadata plus a `preview` of the first rows.
    pub summary: Meta,
}

/// Metadata recorded for an uploaded file: row count, columns, filename.
pub fn upload_meta(filename: &str, columns: &[String], row_count: usize) -> Meta {
    let mut meta = Meta::new();
    meta.insert("rows".into(), json!(row_count));
    meta.insert("columns".into(), json!(columns));
    meta.insert("filename".into(), json!(filename));
    meta
}

/// Column names in first-seen order across all rows.
///
/// Used when the caller has no header line to take them from.
pub fn columns_of(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Store parsed upload rows under `filename` and build the receipt.
pub fn ingest_upload(
    ctx: &AppContext,
    filename: &str,
    columns: &[String],
    rows: Vec<Row>,
) -> Result<UploadReceipt, StoreError> {
    let meta = upload_meta(filename, columns, rows.len());
    let preview: Vec<Value> = rows
        .iter()
        .take(PREVIEW_ROWS)
        .cloned()
        .map(Value::Object)
        .collect();

    let dataset_id = ctx.store().save(filename, meta.clone(), rows)?;

    let mut summary = meta;
    summary.insert("preview".into(), Value::Array(preview));

    Ok(UploadReceipt {
        dataset_id,
        summary,
    })
}
