use thiserror::Error;

/// Failure to turn text into a QR matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The data does not fit even the largest symbol at the requested level.
    #[error("data too large: needs {needed_bits} bits, max capacity is {capacity_bits} bits")]
    DataTooLarge {
        needed_bits: usize,
        capacity_bits: usize,
    },

    #[error("encoding failure: {0}")]
    EncodingFailure(String),
}

/// Failure to turn a QR matrix into PNG bytes.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("raster failure: {0}")]
    RasterFailure(#[from] image::ImageError),
}

/// Any failure of the text-to-PNG pipeline.
#[derive(Debug, Error)]
pub enum QrError {
    #[error("no data to encode")]
    EmptyInput,

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl QrError {
    /// Text suitable for showing to whoever typed the input.
    pub fn user_message(&self) -> String {
        match self {
            QrError::EmptyInput => "Please enter some data to generate a QR code.".to_string(),
            other => format!("An error occurred during QR code generation: {other}"),
        }
    }

    /// Empty input is a warning; everything else is an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, QrError::EmptyInput)
    }
}
