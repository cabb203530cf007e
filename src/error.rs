use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    ConfigParse(String),

    #[error("invalid scene: {0}")]
    SceneParse(String),

    #[error("step '{step}' references unknown edge '{edge}'")]
    UnknownEdge { step: String, edge: String },

    #[error("step '{0}' is defined more than once")]
    DuplicateStep(String),

    #[error("render failed: {0}")]
    Render(String),
}
