use super::{RenderContext, Renderer};
use crate::server::HttpResponse;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Tabular output offered as a CSV download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvResult {
    pub status: StatusCode,
    /// Suggested download name; `.csv` is appended when missing
    pub filename: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvResult {
    pub fn new(filename: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            status: StatusCode::OK,
            filename: filename.into(),
            columns,
            rows,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Build a table from serializable records.
    ///
    /// Columns are the field names of the first record, in serialized (sorted)
    /// order; later records contribute values for those columns only.
    /// Non-object records become a single `value` column.
    pub fn from_records<T: Serialize>(
        filename: impl Into<String>,
        records: &[T],
    ) -> serde_json::Result<Self> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<Value>>>()?;
        let columns: Vec<String> = match values.first() {
            Some(Value::Object(first)) => first.keys().cloned().collect(),
            Some(_) => vec!["value".to_string()],
            None => Vec::new(),
        };
        let rows = values
            .iter()
            .map(|value| match value {
                Value::Object(map) => columns
                    .iter()
                    .map(|column| map.get(column).map(cell).unwrap_or_default())
                    .collect(),
                other => vec![cell(other)],
            })
            .collect();
        Ok(Self::new(filename, columns, rows))
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn push_record<S: AsRef<str>>(out: &mut String, record: &[S]) {
    for (index, field) in record.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        push_field(out, field.as_ref());
    }
    out.push_str("\r\n");
}

/// Write a header row (when non-empty) followed by `rows`, RFC 4180 style.
#[must_use]
pub fn write_csv(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    if !columns.is_empty() {
        push_record(&mut out, columns);
    }
    for row in rows {
        push_record(&mut out, row);
    }
    out
}

fn attachment_name(filename: &str) -> String {
    let base: String = filename
        .trim()
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    let base = if base.is_empty() { "export".to_string() } else { base };
    if base.to_ascii_lowercase().ends_with(".csv") {
        base
    } else {
        format!("{base}.csv")
    }
}

pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    type Output = CsvResult;

    fn render(&self, output: &CsvResult, ctx: &RenderContext<'_>) -> anyhow::Result<HttpResponse> {
        let body = write_csv(&output.columns, &output.rows);
        let filename = attachment_name(&output.filename);
        debug!(
            path = %ctx.path,
            status = output.status.as_u16(),
            rows = output.rows.len(),
            filename = %filename,
            "CSV result rendered"
        );
        let mut response =
            HttpResponse::with_body(output.status, "text/csv; charset=utf-8", body.into_bytes());
        response.set_header(
            "content-disposition",
            format!("attachment; filename=\"{filename}\""),
        );
        Ok(response)
    }
}
