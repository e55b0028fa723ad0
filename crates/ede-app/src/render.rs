use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use ede_core::display::render_cell;
use ede_core::{ConfirmGate, Draft, DraftMode, EntitySchema, ListController, Selection};
use ede_types::{Notification, NotificationLevel, Record, record_id};
use serde_json::Value;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Loaded page with selection marks, followed by the pagination summary
pub fn render_page(schema: &EntitySchema, list: &ListController, selection: &Selection) -> String {
    let mut table = Table::new();
    let mut header = vec![header_cell("")];
    header.extend(schema.columns.iter().map(|c| header_cell(&c.label)));
    table.set_header(header);
    apply_table_style(&mut table);

    for record in list.items() {
        let selected = record_id(record).is_some_and(|id| selection.contains(&id));
        let mut row = vec![Cell::new(if selected { "*" } else { "" })];
        row.extend(
            schema
                .columns
                .iter()
                .map(|column| Cell::new(render_cell(record, column))),
        );
        table.add_row(row);
    }

    let window = list.window();
    let location = list.location();
    let mut out = if location.is_empty() {
        format!("{}\n{table}\n", schema.name)
    } else {
        format!("{}?{location}\n{table}\n", schema.name)
    };
    out.push_str(&format!(
        "{}  page {} of {}",
        window.summary(),
        window.page,
        window.total_pages()
    ));
    if !selection.is_empty() {
        out.push_str(&format!("  selected {}", selection.len()));
    }
    if list.is_loading() {
        out.push_str("  loading...");
    }
    if let Some(error) = list.error() {
        out.push_str(&format!("\n! {error}"));
    }
    out
}

pub fn render_draft(schema: &EntitySchema, draft: &Draft) -> String {
    let title = match &draft.mode {
        DraftMode::Create => format!("new {}", schema.label),
        DraftMode::Edit(id) => format!("edit {} {id}", schema.label),
    };

    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value"), header_cell("")]);
    apply_table_style(&mut table);

    for field in &schema.fields {
        let value = draft
            .value(&field.name)
            .map(field_text)
            .unwrap_or_default();
        let label = if field.required {
            format!("{} ({})*", field.label, field.name)
        } else {
            format!("{} ({})", field.label, field.name)
        };
        let note = draft.field_errors.get(&field.name).cloned().unwrap_or_default();
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value),
            Cell::new(note).fg(Color::Red),
        ]);
    }

    let mut out = format!("{title}\n{table}");
    if let Some(attachment) = &draft.attachment {
        out.push_str(&format!(
            "\nattachment: {} ({}, {} bytes)",
            attachment.file_name,
            attachment.mime_type,
            attachment.size()
        ));
    }
    if let Some(error) = &draft.error {
        out.push_str(&format!("\n! {error}"));
    }
    out
}

/// Two-column view of one record, in key order
pub fn render_record(record: &Record) -> String {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_table_style(&mut table);
    for (key, value) in record {
        table.add_row(vec![key.clone(), field_text(value)]);
    }
    table.to_string()
}

pub fn render_prompt(gate: &ConfirmGate) -> Option<String> {
    gate.pending()
        .map(|action| format!("? {} [yes/no]", action.description))
}

pub fn render_notification(notification: &Notification) -> String {
    let marker = match notification.level {
        NotificationLevel::Success => "+",
        NotificationLevel::Info => "i",
        NotificationLevel::Warning => "!",
        NotificationLevel::Error => "x",
    };
    format!("[{marker} {}] {}", notification.level, notification.message)
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(field_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ede_config::Config;
    use ede_core::{EntityKind, FormController};
    use serde_json::json;

    fn notification(level: NotificationLevel, message: &str) -> Notification {
        Notification {
            id: Default::default(),
            level,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_page_shows_summary_and_marks() {
        let schema = EntityKind::Words.schema(&Config::default());
        let mut list = ListController::new(schema.resource.clone(), schema.list.clone());
        let ticket = list.begin_fetch();
        list.complete_fetch(
            ticket.generation,
            Ok(ede_api::ListPage {
                items: vec![
                    json!({ "id": 1, "word": "ile", "is_active": true })
                        .as_object()
                        .cloned()
                        .unwrap(),
                ],
                total: 1,
            }),
        );
        let mut selection = Selection::new();
        selection.toggle("1");

        let out = render_page(&schema, &list, &selection);
        assert!(out.contains("ile"));
        assert!(out.contains("Showing 1 to 1 of 1"));
        assert!(out.contains("selected 1"));
    }

    #[test]
    fn test_draft_marks_required_and_errors() {
        let schema = EntityKind::Words.schema(&Config::default());
        let mut form = FormController::new();
        form.open_create(&schema, &schema.list.initial_state()).unwrap();
        let _ = form.begin_submit(&schema);

        let out = render_draft(&schema, form.draft().unwrap());
        assert!(out.starts_with("new word"));
        assert!(out.contains("Word (word)*"));
        assert!(out.contains("required"));
    }

    #[test]
    fn test_notification_line() {
        let line = render_notification(&notification(NotificationLevel::Error, "boom"));
        assert_eq!(line, "[x error] boom");
    }
}
