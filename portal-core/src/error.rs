/// Error type for the rendering and document-merge core.
///
/// `SourceNotFound` and `EntityNotFound` are the variants a server layer
/// should surface as 404s; everything else is a persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Document(String),
}
