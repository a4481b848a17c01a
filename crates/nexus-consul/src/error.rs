use thiserror::Error;

#[derive(Error, Debug)]
pub enum AclError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} returned HTTP {status}: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Cannot create a token for '{service}': the policy name is empty")]
    EmptyPolicyName { service: String },

    #[error("Access control returned an empty token for '{service}'")]
    EmptyToken { service: String },
}

pub type Result<T> = std::result::Result<T, AclError>;
