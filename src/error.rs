use crate::{config, store};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("row store error: {0}")]
    Store(#[from] store::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
