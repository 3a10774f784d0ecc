use thiserror::Error;

/// Fatal set-up failures. Per-object data problems are not errors; the
/// initializer skips those sub-objects instead.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("missing page element #{0}")]
    MissingElement(String),
    #[error("no rendering context: {0}")]
    MissingRenderContext(String),
    #[error("malformed scene document: {0}")]
    MalformedScene(#[from] serde_json::Error),
    #[error("camera index {0} out of range")]
    UnknownCamera(usize),
    #[error("page update failed: {0}")]
    Page(String),
    #[error("vector rendering failed: {0}")]
    VectorRender(String),
}

pub type Result<T, E = SceneError> = std::result::Result<T, E>;
