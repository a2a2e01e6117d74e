use thiserror::Error;

/// Structured failures while reading an indicator or reference file.
///
/// These are wrapped into `anyhow::Error` at the loader boundary so the UI
/// can show the full context chain.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row {row}: '{text}' is not a valid {expected}")]
    InvalidField {
        row: usize,
        text: String,
        expected: &'static str,
    },
}
