use thiserror::Error;

#[derive(Error, Debug)]
pub enum YoyError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schema mismatch at row {row}: {detail}")]
    Schema { row: usize, detail: String },

    #[error("Invalid sales month '{value}'")]
    InvalidMonth { value: String },

    #[error("Invalid volume in column '{column}' at row {row}: {value}")]
    InvalidVolume { column: String, row: usize, value: f64 },

    #[error("No dataset has been imported into {path}")]
    NoImport { path: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type YoyResult<T> = Result<T, YoyError>;
