use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfDoctorError {
    #[error("File '{0}' not found")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("Conversion failed: {0}")]
    ConversionFailure(String),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PdfDoctorError>;
