pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Environment' from the provided string: {0}")]
    StringToEnvironmentFail(String),
    #[error("missing required store setting: {0} must be set and non-empty")]
    MissingStoreSetting(&'static str),
    #[error("invalid store table name: '{0}'")]
    InvalidTableName(String),
    #[error("invalid CORS origin: '{0}'")]
    InvalidCorsOrigin(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("figment error: {0}")]
    Figment(#[from] figment::Error),
}
