use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChespiError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Malformed Input: {0}")]
    Input(String),

    #[error("Structural Inconsistency: {0}")]
    Structural(String),

    #[error("Repair did not converge after {iterations} iterations")]
    RepairDiverged { iterations: usize },
}

pub type ChespiResult<T> = Result<T, ChespiError>;
