//! RFC 4180 reading of whole CSV files, quoted line breaks included.

use csv::ReaderBuilder;

/// Every record of `text`, header row included. Rows may differ in length.
pub fn read_rows(text: &str) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    reader
        .records()
        .map(|record| record.map(|record| record.iter().map(str::to_string).collect()))
        .collect()
}

/// Header names of `text`; empty when the text has no header row.
pub fn read_headers(text: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_line_breaks_stay_in_their_cell() {
        let rows = read_rows("object,description\nSite,\"line one\nline two\"\n").unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["object", "description"],
                vec!["Site", "line one\nline two"],
            ]
        );
    }

    #[test]
    fn ragged_rows_are_kept() {
        let rows = read_rows("a,b,c\n1\n").unwrap();
        assert_eq!(rows[1], vec!["1"]);
    }

    #[test]
    fn empty_text_has_no_headers() {
        assert!(read_headers("").unwrap().is_empty());
        assert!(read_rows("").unwrap().is_empty());
    }

    #[test]
    fn headers_ignore_the_data_rows() {
        let headers = read_headers("Site name,\"Top\n(cm)\"\nA,1\n").unwrap();
        assert_eq!(headers, vec!["Site name", "Top\n(cm)"]);
    }
}
