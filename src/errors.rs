use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Type check failed: {0}")]
    TypeCheck(String),

    #[error(
        "Command `{command}` failed with exit code {exit_code}\nStdout: {stdout}\nStderr: {stderr}"
    )]
    CommandFailed {
        command: String,
        stdout: String,
        stderr: String,
        exit_code: i32,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ENV key not found ({key}) for container ({container})")]
    EnvKeyNotFound { key: String, container: String },

    #[error("No container found matching '{0}'")]
    ContainerNotFound(String),

    #[error("Container '{0}' has no IP address (is it running?)")]
    NoIpAddress(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Callback '{name}' failed: {message}")]
    CallbackFailed { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FixtureError>;
