use std::path::PathBuf;

/// Errors produced by the extraction pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("could not identify four corners on a piece outline from {path}")]
    CornersNotFound { path: PathBuf },
}
