pub mod docker;
pub mod error;

pub use docker::*;
pub use error::*;
