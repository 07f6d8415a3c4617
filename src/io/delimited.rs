use std::collections::BTreeMap;

/// A single data row keyed by column name.
pub type Record = BTreeMap<String, String>;

/// Parsed delimited text: the header columns in declaration order plus one
/// record per non-blank data line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    /// Returns `true` when the header declares `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|candidate| candidate == column)
    }

    /// Builds a table from already split rows, the first row being the header.
    /// Rows whose cells are all blank are skipped like blank text lines.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let columns = rows.next().unwrap_or_default();
        let records = rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| build_record(&columns, row))
            .collect();
        Self { columns, records }
    }
}

/// Parses comma separated text whose first line is the header.
///
/// Missing trailing values default to the empty string and malformed quoting
/// never fails: an unterminated quote just runs to the end of its line.
pub fn parse_table(text: &str) -> Table {
    let mut rows = parse_rows(text).into_iter();
    let columns = rows.next().unwrap_or_default();
    let records = rows.map(|row| build_record(&columns, row)).collect();
    Table { columns, records }
}

/// Splits text into rows of values: the first line always, then every line
/// that is not blank.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let normalized = text
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut lines = normalized.split('\n');
    let mut rows: Vec<Vec<String>> = lines.next().map(parse_line).into_iter().collect();
    rows.extend(
        lines
            .filter(|line| !line.trim().is_empty())
            .map(parse_line),
    );
    rows
}

/// Splits a single line on commas, honouring `"` quoting and `""` escapes
/// inside quoted sections.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => result.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    result.push(current);
    result
}

fn build_record(columns: &[String], values: Vec<String>) -> Record {
    let mut values = values.into_iter();
    let mut record = Record::new();
    for column in columns {
        record.insert(column.clone(), values.next().unwrap_or_default());
    }
    record
}
