use ede_types::Record;
use serde_json::Value;

const EMPTY_CELL: &str = "-";

/// How a column derives its text from a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellFormat {
    Text,
    /// Status-like values, rendered bracketed
    Badge,
    Flag,
    /// Seconds rendered as `m:ss` or `h:mm:ss`
    Duration,
    /// Percentage; with `of`, the cell is the share of another field
    Percent { of: Option<String> },
    /// RFC 3339 timestamps shortened to `YYYY-MM-DD HH:MM`
    Date,
    /// Length of an array, or the number itself
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub format: CellFormat,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>, format: CellFormat) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            format,
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, CellFormat::Text)
    }
}

pub fn render_cell(record: &Record, column: &Column) -> String {
    let value = match record.get(&column.key) {
        None | Some(Value::Null) => return EMPTY_CELL.to_string(),
        Some(value) => value,
    };

    let rendered = match &column.format {
        CellFormat::Text => Some(plain(value)),
        CellFormat::Badge => Some(format!("[{}]", plain(value))),
        CellFormat::Flag => value
            .as_bool()
            .map(|flag| if flag { "yes" } else { "no" }.to_string()),
        CellFormat::Duration => value.as_f64().map(format_duration),
        CellFormat::Percent { of: None } => value.as_f64().map(|p| format!("{p:.1}%")),
        CellFormat::Percent { of: Some(whole) } => {
            let whole = record.get(whole).and_then(Value::as_f64);
            value
                .as_f64()
                .zip(whole)
                .and_then(|(part, whole)| format_percent(part, whole))
        }
        CellFormat::Date => value.as_str().map(format_date),
        CellFormat::Count => match value {
            Value::Array(items) => Some(items.len().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
    };

    rendered.unwrap_or_else(|| plain(value))
}

fn plain(value: &Value) -> String {
    match value {
        Value::Null => EMPTY_CELL.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(plain).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// `None` when the whole is zero
pub fn format_percent(part: f64, whole: f64) -> Option<String> {
    (whole != 0.0).then(|| format!("{:.1}%", part / whole * 100.0))
}

pub fn format_date(value: &str) -> String {
    let Some((date, time)) = value.split_once('T') else {
        return value.to_string();
    };
    match time.get(..5) {
        Some(hm) => format!("{date} {hm}"),
        None => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_missing_and_null_cells() {
        let row = record(json!({ "word": null }));
        assert_eq!(render_cell(&row, &Column::text("word", "Word")), "-");
        assert_eq!(render_cell(&row, &Column::text("missing", "Missing")), "-");
    }

    #[test]
    fn test_derived_cells() {
        let row = record(json!({
            "status": "completed",
            "is_active": false,
            "duration": 125.4,
            "processed": 3,
            "total": 8,
            "created_at": "2024-03-05T10:20:30Z",
            "tags": ["greeting", "basic"],
        }));

        let cell = |key: &str, format| render_cell(&row, &Column::new(key, key, format));
        assert_eq!(cell("status", CellFormat::Badge), "[completed]");
        assert_eq!(cell("is_active", CellFormat::Flag), "no");
        assert_eq!(cell("duration", CellFormat::Duration), "2:05");
        assert_eq!(
            cell("processed", CellFormat::Percent { of: Some("total".into()) }),
            "37.5%"
        );
        assert_eq!(cell("created_at", CellFormat::Date), "2024-03-05 10:20");
        assert_eq!(cell("tags", CellFormat::Count), "2");
        assert_eq!(cell("tags", CellFormat::Text), "greeting, basic");
    }

    #[test]
    fn test_formatters() {
        assert_eq!(format_duration(3725.0), "1:02:05");
        assert_eq!(format_duration(-4.0), "0:00");
        assert_eq!(format_percent(1.0, 0.0), None);
        assert_eq!(format_date("2024-03-05"), "2024-03-05");
    }

    #[test]
    fn test_mismatched_value_falls_back_to_text() {
        let row = record(json!({ "duration": "n/a" }));
        assert_eq!(
            render_cell(&row, &Column::new("duration", "Length", CellFormat::Duration)),
            "n/a"
        );
    }
}
