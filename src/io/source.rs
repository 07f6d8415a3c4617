use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::error::{FetchError, LoadError, Relation};
use crate::io::delimited::{Table, parse_table};
use crate::io::excel_read;
use crate::model::Schema;

/// Prefix selecting a spreadsheet id in a source string.
pub const SHEETS_PREFIX: &str = "sheets:";

/// Per-sheet CSV export endpoint; `{id}` and `{sheet}` are substituted.
pub const DEFAULT_SHEET_URL_TEMPLATE: &str =
    "https://docs.google.com/spreadsheets/d/{id}/gviz/tq?tqx=out:csv&sheet={sheet}";

/// Where the three schema relations come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Directory or base URL holding `objects.csv`, `fields.csv` and
    /// `enum_values.csv`.
    LocalPath(String),
    /// Identifier of a spreadsheet exporting one sheet per relation.
    SpreadsheetId(String),
    /// Local `.xlsx` workbook with one sheet per relation.
    Workbook(PathBuf),
}

impl SourceSpec {
    /// Location of `relation` for text based sources.
    pub fn location(&self, relation: Relation, sheet_url_template: &str) -> String {
        match self {
            SourceSpec::LocalPath(base) if base.is_empty() => format!("{relation}.csv"),
            SourceSpec::LocalPath(base) => {
                format!("{}/{relation}.csv", base.trim_end_matches('/'))
            }
            SourceSpec::SpreadsheetId(id) => sheet_url_template
                .replace("{id}", id)
                .replace("{sheet}", relation.sheet_name()),
            SourceSpec::Workbook(path) => format!("{}#{relation}", path.display()),
        }
    }
}

impl FromStr for SourceSpec {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(id) = value.strip_prefix(SHEETS_PREFIX) {
            return Ok(SourceSpec::SpreadsheetId(id.to_string()));
        }
        if value.to_ascii_lowercase().ends_with(".xlsx") {
            return Ok(SourceSpec::Workbook(PathBuf::from(value)));
        }
        Ok(SourceSpec::LocalPath(value.to_string()))
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::LocalPath(base) => write!(f, "{base}"),
            SourceSpec::SpreadsheetId(id) => write!(f, "{SHEETS_PREFIX}{id}"),
            SourceSpec::Workbook(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Returns the complete text stored at a location.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_text(&self, location: &str) -> Result<String, FetchError>;
}

/// Fetches `http(s)://` locations over HTTP and reads anything else from the
/// filesystem.
#[derive(Debug, Clone, Default)]
pub struct DefaultFetcher {
    client: Client,
}

impl DefaultFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceFetcher for DefaultFetcher {
    async fn fetch_text(&self, location: &str) -> Result<String, FetchError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self.client.get(location).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    location: location.to_string(),
                    status: status.as_u16(),
                });
            }
            let bytes = response.bytes().await?;
            return String::from_utf8(bytes.to_vec()).map_err(|err| FetchError::Io {
                location: location.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
            });
        }

        tokio::fs::read_to_string(location)
            .await
            .map_err(|source| FetchError::Io {
                location: location.to_string(),
                source,
            })
    }
}

/// Options of a schema load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub sheet_url_template: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet_url_template: DEFAULT_SHEET_URL_TEMPLATE.to_string(),
        }
    }
}

/// Loads the three relations of `source` concurrently and assembles the
/// schema once all of them succeeded.
#[instrument(level = "info", skip_all, fields(source = %source))]
pub async fn load_schema(
    source: &SourceSpec,
    fetcher: &dyn ResourceFetcher,
    options: &LoadOptions,
) -> Result<Schema, LoadError> {
    let (objects, fields, enum_values) = match source {
        SourceSpec::Workbook(path) => excel_read::read_relations(path)?,
        _ => {
            let template = options.sheet_url_template.as_str();
            futures::try_join!(
                fetch_relation(source, Relation::Objects, fetcher, template),
                fetch_relation(source, Relation::Fields, fetcher, template),
                fetch_relation(source, Relation::EnumValues, fetcher, template),
            )?
        }
    };

    for (relation, table) in [
        (Relation::Objects, &objects),
        (Relation::Fields, &fields),
        (Relation::EnumValues, &enum_values),
    ] {
        check_columns(relation, table)?;
    }

    let schema = Schema::from_records(&objects.records, &fields.records, &enum_values.records);
    info!(
        objects = schema.objects.len(),
        fields = schema.fields.len(),
        enum_values = schema.enum_values.len(),
        "schema loaded"
    );
    Ok(schema)
}

async fn fetch_relation(
    source: &SourceSpec,
    relation: Relation,
    fetcher: &dyn ResourceFetcher,
    template: &str,
) -> Result<Table, LoadError> {
    let location = source.location(relation, template);
    debug!(%relation, %location, "fetching relation");
    let text = fetcher
        .fetch_text(&location)
        .await
        .map_err(|cause| LoadError::new(relation, cause))?;
    Ok(parse_table(&text))
}

/// Rejects relations that lack a column the schema cannot do without.
pub fn check_columns(relation: Relation, table: &Table) -> Result<(), LoadError> {
    match relation
        .required_columns()
        .iter()
        .find(|column| !table.has_column(column))
    {
        Some(column) => Err(LoadError::new(
            relation,
            FetchError::MissingColumn(column.to_string()),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_paths_join_relation_files() {
        let source = SourceSpec::LocalPath("https://example.com/export".into());
        assert_eq!(
            source.location(Relation::EnumValues, DEFAULT_SHEET_URL_TEMPLATE),
            "https://example.com/export/enum_values.csv"
        );
        let empty = SourceSpec::LocalPath(String::new());
        assert_eq!(
            empty.location(Relation::Objects, DEFAULT_SHEET_URL_TEMPLATE),
            "objects.csv"
        );
    }

    #[test]
    fn spreadsheet_ids_fill_the_template() {
        let source: SourceSpec = "sheets:abc123".parse().unwrap();
        assert_eq!(source, SourceSpec::SpreadsheetId("abc123".into()));
        assert_eq!(
            source.location(Relation::Fields, DEFAULT_SHEET_URL_TEMPLATE),
            "https://docs.google.com/spreadsheets/d/abc123/gviz/tq?tqx=out:csv&sheet=fields"
        );
        assert_eq!(source.to_string(), "sheets:abc123");
    }

    #[test]
    fn workbook_paths_parse_by_extension() {
        let source: SourceSpec = "docs/schema.XLSX".parse().unwrap();
        assert_eq!(source, SourceSpec::Workbook(PathBuf::from("docs/schema.XLSX")));
        let dir: SourceSpec = "docs".parse().unwrap();
        assert_eq!(dir, SourceSpec::LocalPath("docs".into()));
    }

    #[test]
    fn missing_required_columns_are_load_errors() {
        let table = parse_table("object,json_name\nSite,name");
        let err = check_columns(Relation::Fields, &table).unwrap_err();
        assert_eq!(err.resource(), Some(Relation::Fields));
        assert_eq!(err.to_string(), "failed to load fields: missing column 'type'");
        assert!(check_columns(Relation::Objects, &parse_table("name")).is_ok());
    }
}
