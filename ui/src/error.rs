use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] backend::error::Error),
    #[error("could not connect to {}: {source}", port.display())]
    Connect {
        port: PathBuf,
        source: backend::error::Error,
    },
}
