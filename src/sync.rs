use std::fs;
use std::path::Path;

use tracing::{info, instrument};

use crate::error::{Relation, Result, ToolError};
use crate::io::csv_file::read_rows;
use crate::io::excel_write::{self, SheetTable};

/// Row count of one relation uploaded by [`sync_to_workbook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub sheet_name: String,
    /// Rows including the header row.
    pub rows: usize,
}

/// Reads the three relation CSVs of `schema_dir` and writes them into one
/// workbook, one sheet per relation named after the file stem. A dry run only
/// reports what would be written.
#[instrument(
    level = "info",
    skip_all,
    fields(schema_dir = %schema_dir.display(), output = %output.display(), dry_run = dry_run)
)]
pub fn sync_to_workbook(schema_dir: &Path, output: &Path, dry_run: bool) -> Result<Vec<SheetSummary>> {
    let mut tables = Vec::new();
    for relation in Relation::ALL {
        let path = schema_dir.join(format!("{relation}.csv"));
        if !path.exists() {
            return Err(ToolError::MissingInput(path));
        }
        let text = fs::read_to_string(&path)?;
        let mut rows = read_rows(&text)?.into_iter();
        let columns = rows.next().unwrap_or_default();
        tables.push(SheetTable {
            sheet_name: relation.sheet_name().to_string(),
            columns,
            rows: rows.collect(),
        });
    }

    let summaries: Vec<SheetSummary> = tables
        .iter()
        .map(|table| SheetSummary {
            sheet_name: table.sheet_name.clone(),
            rows: table.rows.len() + 1,
        })
        .collect();

    for summary in &summaries {
        info!(sheet = %summary.sheet_name, rows = summary.rows, dry_run, "sheet prepared");
    }
    if !dry_run {
        excel_write::write_workbook(output, &tables)?;
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::excel_read::read_relations;

    fn write_schema(dir: &Path, fields: &str) {
        fs::write(dir.join("objects.csv"), "name\nSite\n").unwrap();
        fs::write(dir.join("fields.csv"), fields).unwrap();
        fs::write(dir.join("enum_values.csv"), "enum,value\n").unwrap();
    }

    #[test]
    fn quoted_line_breaks_do_not_add_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            "object,json_name,type,description\nSite,name,string,\"line one\nline two\"\n",
        );
        let output = dir.path().join("schema.xlsx");

        let summaries = sync_to_workbook(dir.path(), &output, false).unwrap();
        assert_eq!(summaries[1].rows, 2);
        assert_eq!(summaries[2].rows, 1);

        let (_, fields, _) = read_relations(&output).unwrap();
        assert_eq!(fields.records.len(), 1);
        assert_eq!(fields.records[0]["object"], "Site");
        assert_eq!(fields.records[0]["description"], "line one\nline two");
    }

    #[test]
    fn missing_relation_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("objects.csv"), "name\nSite\n").unwrap();
        let err = sync_to_workbook(dir.path(), &dir.path().join("out.xlsx"), true).unwrap_err();
        assert!(matches!(err, ToolError::MissingInput(path) if path.ends_with("fields.csv")));
    }
}
