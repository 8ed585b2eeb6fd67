use thiserror::Error;

pub type IjahResult<T> = Result<T, IjahError>;

#[derive(Error, Debug)]
pub enum IjahError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Reference not found: no product with SKU '{0}'")]
    ReferenceNotFound(String),

    #[error("Record not found: no {table} with id {id}")]
    RecordNotFound { table: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<calamine::Error> for IjahError {
    fn from(e: calamine::Error) -> Self {
        match e {
            calamine::Error::Io(io) => IjahError::Io(io),
            other => IjahError::Workbook(other.to_string()),
        }
    }
}
