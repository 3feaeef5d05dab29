use bloc_core::BlocError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error(transparent)]
    Bloc(#[from] BlocError),

    #[error("Invalid route path '{0}': must start with '/'")]
    InvalidPath(String),
}
