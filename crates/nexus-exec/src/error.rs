use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{program}' failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command '{program}' timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },
}

pub type Result<T> = std::result::Result<T, ExecError>;
