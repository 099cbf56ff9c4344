use thiserror::Error;

/// Errors raised while describing, configuring or exporting fixed-precision metrics.
///
/// The hot path never returns errors: arithmetic on a cell cannot fail, and a
/// negative add on a counter panics instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid metric descriptor: {0}")]
    Descriptor(#[from] prometheus::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Encoding error: {message}")]
    Encode { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config {
            message: format!("Failed to parse config: {}", err),
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Encode {
            message: format!("Exposition is not valid UTF-8: {}", err),
        }
    }
}
