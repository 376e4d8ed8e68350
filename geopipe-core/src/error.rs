use thiserror::Error;

/// Raised internally by `exif::decode` when the raw image bytes won't
/// decode. `Pipeline::process` catches this itself and folds it into an
/// empty `PipelineOutput` rather than letting it escape — the driver is
/// total over both well-formed and malformed input. `exif::decode` still
/// surfaces it as a distinct `Result` so callers that decode directly
/// (bypassing `Pipeline`) get an explicit outcome instead of a silent
/// empty image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
