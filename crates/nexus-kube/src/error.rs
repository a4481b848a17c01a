use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeError {
    #[error("kubectl invocation failed: {0}")]
    Exec(#[from] nexus_exec::ExecError),

    #[error("Secret '{secret}' contains invalid data: {message}")]
    SecretDecode { secret: String, message: String },
}

pub type Result<T> = std::result::Result<T, KubeError>;
