use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::error::{FetchError, LoadError, Relation};
use crate::io::delimited::Table;

/// Reads the `objects`, `fields` and `enum_values` sheets of a workbook
/// following the layout produced by [`excel_write`](crate::io::excel_write).
pub fn read_relations(path: &Path) -> Result<(Table, Table, Table), LoadError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|err: calamine::XlsxError| LoadError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let objects = read_required_sheet(&mut workbook, Relation::Objects)?;
    let fields = read_required_sheet(&mut workbook, Relation::Fields)?;
    let enum_values = read_required_sheet(&mut workbook, Relation::EnumValues)?;
    Ok((objects, fields, enum_values))
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    relation: Relation,
) -> Result<Table, LoadError> {
    let name = relation.sheet_name();
    let range = workbook
        .worksheet_range(name)
        .ok_or_else(|| {
            LoadError::new(relation, FetchError::Workbook(format!("missing sheet '{name}'")))
        })?
        .map_err(|err| LoadError::new(relation, FetchError::Workbook(err.to_string())))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect())
        .collect();
    Ok(Table::from_rows(rows))
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::excel_write::{SheetTable, write_workbook};

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_to_string(Some(&DataType::String("Site".into()))), "Site");
        assert_eq!(cell_to_string(Some(&DataType::Int(3))), "3");
        assert_eq!(cell_to_string(Some(&DataType::Bool(true))), "true");
        assert_eq!(cell_to_string(None), "");
    }

    #[test]
    fn unreadable_workbook_names_the_path_not_a_relation() {
        let err = read_relations(Path::new("/nonexistent/schema.xlsx")).unwrap_err();
        assert_eq!(err.resource(), None);
        assert!(
            err.to_string()
                .starts_with("failed to open workbook /nonexistent/schema.xlsx: ")
        );
    }

    #[test]
    fn missing_sheet_names_its_relation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.xlsx");
        let tables = [SheetTable {
            sheet_name: "objects".into(),
            columns: vec!["name".into()],
            rows: vec![vec!["Site".into()]],
        }];
        write_workbook(&path, &tables).unwrap();

        let err = read_relations(&path).unwrap_err();
        assert_eq!(err.resource(), Some(Relation::Fields));
        assert_eq!(
            err.to_string(),
            "failed to load fields: workbook missing sheet 'fields'"
        );
    }
}
