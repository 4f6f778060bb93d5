use thiserror::Error;

/// Результат операций сети
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Ошибки построения и использования сети
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("network needs at least two layers, got {layers}")]
    TooFewLayers { layers: usize },

    #[error("layer {layer} has no neurons")]
    EmptyLayer { layer: usize },

    #[error("expected {expected} input values, got {actual}")]
    InputSize { expected: usize, actual: usize },

    #[error("expected {expected} target values, got {actual}")]
    TargetSize { expected: usize, actual: usize },

    #[error("expected {expected} connection weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },

    #[error("invalid training parameter {parameter}: {value}")]
    InvalidConfig { parameter: &'static str, value: f64 },
}

/// Ошибки чтения обучающей выборки
#[derive(Error, Debug)]
pub enum TrainingDataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing 'topology' line")]
    MissingTopology,

    #[error("line {line}: expected keyword '{expected}', found '{found}'")]
    UnexpectedKeyword {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: 'input' without a following 'expected' line")]
    MissingExpected { line: usize },

    #[error("line {line}: expected {expected} values, got {actual}")]
    SizeMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("topology needs at least two layers, got {layers}")]
    TooFewLayers { layers: usize },
}
