//! Check-in CSV export
//!
//! Pure formatting over rows the store already fetched; no storage access
//! happens here.

use crate::models::ExportRow;

/// Render export rows as CSV
///
/// Returns the suggested attachment filename and the CSV content. The
/// filename is derived from the event name with everything non-alphanumeric
/// flattened to underscores.
pub fn render(event_name: &str, rows: &[ExportRow]) -> (String, String) {
    let mut csv = String::from("Name,External ID,Checked In,Check-in Time");

    for row in rows {
        let checked_in = if row.checked_in_at.is_some() {
            "Yes"
        } else {
            "No"
        };
        let check_in_time = row
            .checked_in_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();

        csv.push('\n');
        csv.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\"",
            escape(&row.name),
            escape(row.external_id.as_deref().unwrap_or("")),
            checked_in,
            check_in_time
        ));
    }

    let stem: String = event_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    (format!("{}_checkins.csv", stem), csv)
}

fn escape(field: &str) -> String {
    field.replace('"', "\"\"")
}
