//! Table and timestamp formatting helpers for CLI output.

use chrono::{DateTime, Local, Utc};
use comfy_table::{ContentArrangement, Table};

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Pretty-print a raw JSON response (`--verbose`).
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

/// Format an RFC 3339 timestamp from the control API.
///
/// Shows the time of day, prefixed by the date when `date` is set, in UTC
/// when `utc` is set and local time otherwise. Unparseable input is
/// returned unchanged.
pub fn format_timestamp(timestamp: &str, date: bool, utc: bool) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };

    let pattern = if date { "%Y-%m-%d %H:%M:%S" } else { "%H:%M:%S" };
    if utc {
        let mut text = parsed.with_timezone(&Utc).format(pattern).to_string();
        text.push('Z');
        text
    } else {
        parsed.with_timezone(&Local).format(pattern).to_string()
    }
}
