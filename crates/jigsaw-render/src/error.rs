use std::path::PathBuf;

/// Errors produced while computing poses or rendering the output.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("pose system for {unknown} is under-determined")]
    PoseUnderdetermined { unknown: &'static str },
}
