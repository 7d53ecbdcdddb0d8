// src/applications/handlers/import.rs

use axum::extract::{Extension, Json, Multipart};
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::super::importer::{
    application_field_specs, import_rows, CellValue, ImportError, ImportOutcome,
};
use super::super::models::ImportSummary;
use crate::auth::AuthedUser;
use crate::common::{generate_application_id, ApiError, AppState};

/// POST /api/applications/import - Bulk-import applications from CSV or XLSX
///
/// The uploaded file is decoded into a cell grid and fed through the
/// heuristic import pipeline. Rows missing a mandatory field are skipped
/// silently; the response reports both counts.
pub async fn import_applications(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Application import request received");

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("invalid multipart body".to_string()))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("import.csv").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::BadRequest("invalid file".to_string()))?;
            file_bytes = Some(data.to_vec());
        }
    }

    let bytes = file_bytes
        .ok_or_else(|| ApiError::BadRequest("missing 'file' field in upload".to_string()))?;

    let lower = filename.to_lowercase();
    let rows = if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        decode_worksheet(&bytes)?
    } else if lower.ends_with(".csv") || lower.ends_with(".txt") {
        decode_csv(&bytes)?
    } else {
        warn!(filename = %filename, "Rejected import file with unsupported extension");
        return Err(ApiError::UnsupportedFormat(
            "only CSV and XLSX files can be imported".to_string(),
        ));
    };

    let outcome = match import_rows(&rows, &application_field_specs()) {
        Ok(o) => o,
        Err(ImportError::EmptyInput) => {
            return Err(ApiError::ImportError(
                "import data contains no data rows".to_string(),
            ));
        }
    };

    persist_batch(&state, &authed.id, &outcome).await?;

    info!(
        user_id = %authed.id,
        filename = %filename,
        imported = outcome.imported,
        skipped = outcome.skipped,
        "Application import completed"
    );

    Ok(Json(ImportSummary {
        imported: outcome.imported,
        skipped: outcome.skipped,
    }))
}

// ---- Decoders ----

/// Decode CSV bytes to a cell grid. The header row stays in place; the
/// import pipeline interprets it.
fn decode_csv(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            error!(error = %e, "CSV parse error during import");
            ApiError::ImportError("malformed CSV data".to_string())
        })?;

        let row = record
            .iter()
            .map(|value| {
                if value.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(value.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Decode the first worksheet of an XLSX file to a cell grid. Date cells
/// surface as their raw serial numbers; the import pipeline converts them.
fn decode_worksheet(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, ApiError> {
    use calamine::{Data, Reader, Xlsx};

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| {
        error!(error = %e, "Failed to open uploaded workbook");
        ApiError::ImportError("malformed XLSX data".to_string())
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ApiError::ImportError("workbook contains no worksheets".to_string()))?
        .map_err(|e| {
            error!(error = %e, "Failed to read worksheet range");
            ApiError::ImportError("malformed XLSX data".to_string())
        })?;

    let mut rows = Vec::new();
    for row in range.rows() {
        let cells = row
            .iter()
            .map(|cell| match cell {
                Data::Empty | Data::Error(_) => CellValue::Empty,
                Data::String(s) => CellValue::Text(s.clone()),
                Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
                Data::Float(f) => CellValue::Number(*f),
                Data::Int(i) => CellValue::Number(*i as f64),
                Data::Bool(b) => CellValue::Text(b.to_string()),
                Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            })
            .collect();
        rows.push(cells);
    }

    Ok(rows)
}

// ---- Persistence ----

async fn persist_batch(
    state: &AppState,
    user_id: &str,
    outcome: &ImportOutcome,
) -> Result<(), ApiError> {
    for record in &outcome.records {
        let id = generate_application_id();
        sqlx::query(
            r#"INSERT INTO applications (id, user_id, role, company, applied_at, via, status, notes, link)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(record.get("role").unwrap_or(""))
        .bind(record.get("company").unwrap_or(""))
        .bind(record.get("applied_at"))
        .bind(record.get("via").unwrap_or("Other"))
        .bind(record.get("status").unwrap_or("No Response"))
        .bind(record.get("notes"))
        .bind(record.get("link"))
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                application_id = %id,
                user_id = %user_id,
                "Database error inserting imported application"
            );
            ApiError::DatabaseError(e)
        })?;
    }

    Ok(())
}
