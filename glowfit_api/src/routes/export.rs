use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use chrono_tz::Tz;
use glowfit_storage::HistoryExportRow;
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    response::ApiQuery,
    state::AppState,
};

/// Lets spreadsheet applications detect UTF-8.
const UTF8_BOM: &str = "\u{FEFF}";

pub fn router() -> Router<AppState> {
    Router::new().route("/export/history", get(export_history))
}

#[derive(Clone, Copy)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Type")]
    kind: &'static str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Completed At")]
    completed_at: String,
    #[serde(rename = "Duration (min)")]
    duration_minutes: Option<u32>,
    #[serde(rename = "Sets")]
    sets: Option<u32>,
    #[serde(rename = "Reps")]
    reps: Option<u32>,
    #[serde(rename = "Notes")]
    notes: Option<&'a str>,
}

/// One CSV line per history record, times shown in the user's timezone.
pub fn history_csv(rows: &[HistoryExportRow], tz: Tz) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.as_bytes().to_vec());
    for row in rows {
        writer.serialize(CsvRow {
            kind: row.kind.as_str(),
            name: &row.target_name,
            completed_at: row
                .completed_at
                .with_timezone(&tz)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            duration_minutes: row.duration_minutes,
            sets: row.sets,
            reps: row.reps,
            notes: row.notes.as_deref(),
        })?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

async fn export_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let format = match query.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("csv") => ExportFormat::Csv,
        Some("json") => ExportFormat::Json,
        Some(_) => return Err(ApiError::field("format", "must be csv or json")),
    };

    let rows = state.history.export_rows(user.id).await?;
    let date = Utc::now().with_timezone(&user.timezone).format("%Y%m%d");
    log::info!(
        "History exported. [user_id = {}, rows = {}]",
        user.id,
        rows.len()
    );

    let (content_type, extension, body) = match format {
        ExportFormat::Csv => (
            "text/csv; charset=utf-8",
            "csv",
            history_csv(&rows, user.timezone)?,
        ),
        ExportFormat::Json => (
            "application/json",
            "json",
            serde_json::to_vec_pretty(&rows).map_err(anyhow::Error::from)?,
        ),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"history-{date}.{extension}\""),
            ),
        ],
        body,
    ))
}
