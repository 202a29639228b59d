use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error("configuration package not found: {0}")]
    PackageNotFound(String),

    #[error("activation context unavailable: {0}")]
    ActivationContextUnavailable(String),

    #[error("protected value handle is absent")]
    NullSecret,

    #[error("protected value is not valid UTF-16")]
    SecretDecode,

    #[error("failed to decrypt parameter: {0}")]
    Decrypt(String),
}
