use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads a schema, renders documentation, or validates fixtures.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a schema or fixture CSV file is malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when one of the three schema relations could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Raised when the containment graph cannot be walked.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Raised when the page does not contain a required output anchor.
    #[error("missing output element '{0}'")]
    MissingAnchor(String),

    /// Raised when the configuration file cannot be read or parsed.
    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Raised when export fixtures use undocumented columns or fields.
    #[error("found {0} validation errors")]
    ValidationFailed(usize),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// One of the three relations making up a schema.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Objects,
    Fields,
    EnumValues,
}

impl Relation {
    /// All relations in load order.
    pub const ALL: [Relation; 3] = [Relation::Objects, Relation::Fields, Relation::EnumValues];

    /// Sheet name (and CSV file stem) of the relation.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Relation::Objects => "objects",
            Relation::Fields => "fields",
            Relation::EnumValues => "enum_values",
        }
    }

    /// Columns a relation must declare to be usable.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Relation::Objects => &["name"],
            Relation::Fields => &["object", "type"],
            Relation::EnumValues => &["enum", "value"],
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// Failure to load a schema. The whole load fails with it.
#[derive(Debug, Error)]
pub enum LoadError {
    /// One relation could not be fetched or lacks a required column.
    #[error("failed to load {resource}: {cause}")]
    Relation {
        resource: Relation,
        #[source]
        cause: FetchError,
    },

    /// The workbook holding all relations could not be opened.
    #[error("failed to open workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },
}

impl LoadError {
    pub fn new(resource: Relation, cause: FetchError) -> Self {
        LoadError::Relation { resource, cause }
    }

    /// Relation that failed, if the failure is tied to one.
    pub fn resource(&self) -> Option<Relation> {
        match self {
            LoadError::Relation { resource, .. } => Some(*resource),
            LoadError::Workbook { .. } => None,
        }
    }
}

/// Reasons a resource fetch can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{location} returned HTTP {status}")]
    Status { location: String, status: u16 },

    #[error("workbook {0}")]
    Workbook(String),

    #[error("missing column '{0}'")]
    MissingColumn(String),
}

/// Errors raised while walking the containment graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The containment relation loops back onto an object already on the
    /// current walk.
    #[error("cyclic containment: {}", path.join(" -> "))]
    Cyclic { path: Vec<String> },
}
