//! Roster CSV import
//!
//! The roster arrives as pasted CSV text at event creation. Header matching
//! is intentionally forgiving: a plain "name" column, or separate first and
//! last name columns, plus an optional id column mapped to the external id.
//! Email columns are recognized only to keep them from being mistaken for id
//! columns. Duplicate names are allowed on this path; only the single-add
//! endpoint enforces uniqueness.

/// One attendee parsed from the roster
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub external_id: Option<String>,
}

#[derive(Default)]
struct Columns {
    name: Option<usize>,
    first_name: Option<usize>,
    last_name: Option<usize>,
    external_id: Option<usize>,
}

/// Parse roster CSV into entries plus per-row errors
///
/// Rows that cannot be parsed are reported and skipped; the rest of the
/// roster still imports.
pub fn parse(csv: &str) -> (Vec<RosterEntry>, Vec<String>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    let mut lines = csv.trim().lines();
    let Some(header_line) = lines.next() else {
        errors.push("CSV file is empty".to_string());
        return (entries, errors);
    };

    let headers = parse_row(header_line);
    let columns = detect_columns(&headers);

    for (index, line) in lines.enumerate() {
        let row_number = index + 2;
        let row = parse_row(line);

        if row.len() != headers.len() {
            errors.push(format!(
                "Row {}: Column count mismatch (expected {}, got {})",
                row_number,
                headers.len(),
                row.len()
            ));
            continue;
        }

        let name = extract_name(&columns, &row);
        if name.is_empty() {
            errors.push(format!("Row {}: No name found", row_number));
            continue;
        }

        let external_id = columns
            .external_id
            .map(|i| row[i].clone())
            .filter(|v| !v.is_empty());

        entries.push(RosterEntry { name, external_id });
    }

    (entries, errors)
}

/// Split one CSV line, honoring quoted fields and doubled-quote escapes
fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => in_quotes = true,
            '"' if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = false,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

fn detect_columns(headers: &[String]) -> Columns {
    let mut columns = Columns::default();

    for (index, header) in headers.iter().enumerate() {
        let header = header.to_lowercase();
        if header == "name"
            || (header.contains("name")
                && !header.contains("first")
                && !header.contains("last")
                && !header.contains("given")
                && !header.contains("family"))
        {
            columns.name = Some(index);
        } else if header.contains("first") {
            columns.first_name = Some(index);
        } else if header.contains("last") || header.contains("family") || header.contains("surname")
        {
            columns.last_name = Some(index);
        } else if header.contains("id") && !header.contains("email") {
            columns.external_id = Some(index);
        }
    }

    columns
}

fn extract_name(columns: &Columns, row: &[String]) -> String {
    if let Some(i) = columns.name {
        if !row[i].is_empty() {
            return row[i].clone();
        }
    }
    match (columns.first_name, columns.last_name) {
        (Some(first), Some(last)) => format!("{} {}", row[first], row[last]).trim().to_string(),
        (Some(first), None) => row[first].clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_roster_with_ids() {
        let (entries, errors) = parse("name,id\nAlice Example,a-1\nBob Sample,b-2\n");
        assert!(errors.is_empty());
        assert_eq!(
            entries,
            vec![
                RosterEntry {
                    name: "Alice Example".to_string(),
                    external_id: Some("a-1".to_string()),
                },
                RosterEntry {
                    name: "Bob Sample".to_string(),
                    external_id: Some("b-2".to_string()),
                },
            ]
        );
    }

    #[test]
    fn combines_first_and_last_name_columns() {
        let (entries, errors) = parse("First Name,Last Name\nAlice,Example\nBob,Sample");
        assert!(errors.is_empty());
        assert_eq!(entries[0].name, "Alice Example");
        assert_eq!(entries[1].name, "Bob Sample");
    }

    #[test]
    fn honors_quoted_fields_and_escaped_quotes() {
        let (entries, errors) =
            parse("name,id\n\"Example, Alice\",a-1\n\"Bob \"\"Bo\"\" Sample\",b-2");
        assert!(errors.is_empty());
        assert_eq!(entries[0].name, "Example, Alice");
        assert_eq!(entries[1].name, "Bob \"Bo\" Sample");
    }

    #[test]
    fn reports_column_count_mismatch_and_keeps_going() {
        let (entries, errors) = parse("name,id\nAlice,a-1,extra\nBob,b-2");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Bob");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Row 2:"));
    }

    #[test]
    fn reports_rows_without_a_name() {
        let (entries, errors) = parse("name,id\n,a-1\nBob,b-2");
        assert_eq!(entries.len(), 1);
        assert_eq!(errors, vec!["Row 2: No name found".to_string()]);
    }

    #[test]
    fn email_columns_are_not_mistaken_for_ids() {
        let (entries, errors) = parse("name,email\nAlice,alice@example.com");
        assert!(errors.is_empty());
        assert_eq!(entries[0].external_id, None);
    }

    #[test]
    fn empty_input_is_an_error() {
        let (entries, errors) = parse("");
        assert!(entries.is_empty());
        assert_eq!(errors, vec!["CSV file is empty".to_string()]);
    }

    #[test]
    fn duplicate_names_survive_bulk_import() {
        let (entries, errors) = parse("name\nAlex Kim\nAlex Kim");
        assert!(errors.is_empty());
        assert_eq!(entries.len(), 2);
    }
}
