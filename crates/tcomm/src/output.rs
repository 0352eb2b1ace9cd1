use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{Map, Value};
use tcomm_frame::NAMED_CHANNELS;
use tcomm_session::SessionEvent;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    event: &'a str,
    data: Value,
    timestamp: String,
}

pub fn print_event(event: &SessionEvent, format: OutputFormat) {
    let data = event.data();
    match format {
        OutputFormat::Json => {
            let out = EventOutput {
                event: event.name(),
                data,
                timestamp: now_unix_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "DATA"])
                .add_row(vec![event.name().to_string(), cell(&data)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if data.is_null() {
                println!("[{}]", event.name());
            } else {
                println!("[{}] {}", event.name(), pretty(&data));
            }
        }
    }
}

/// Print one decoded record, a field per row.
pub fn print_fields(fields: &Map<String, Value>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in fields {
                table.add_row(vec![name.clone(), cell(value)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (name, value) in fields {
                println!("{name}: {}", pretty(value));
            }
        }
    }
}

pub fn print_channels(format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<Value> = NAMED_CHANNELS
                .iter()
                .map(|(name, id)| serde_json::json!({ "name": name, "id": id }))
                .collect();
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "ID"]);
            for (name, id) in NAMED_CHANNELS {
                table.add_row(vec![name.to_string(), id.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (name, id) in NAMED_CHANNELS {
                println!("{id:>8}  {name}");
            }
        }
    }
}

/// UTF-8 payloads as text, anything else summarized.
pub fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn now_unix_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cells_render_strings_bare() {
        assert_eq!(cell(&json!("A:H")), "A:H");
        assert_eq!(cell(&json!(866)), "866");
        assert_eq!(cell(&Value::Null), "");
        assert_eq!(cell(&json!({ "a": 1 })), r#"{"a":1}"#);
    }

    #[test]
    fn binary_payload_is_summarized() {
        assert_eq!(payload_preview(b"hi"), "hi");
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }
}
