use thiserror::Error;

/// Errors raised while loading or validating search cache settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {path}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to write config file: {path}")]
    WriteFailed { path: String, message: String },

    #[error("Invalid config file {path}: {message}")]
    ParseFailed { path: String, message: String },

    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Could not determine the user config directory")]
    NoConfigDir,
}

impl ConfigError {
    /// Create a user-friendly error message for display in the frontend
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ReadFailed { path, message } => {
                format!("Search settings could not be read from '{}': {}", path, message)
            }
            ConfigError::WriteFailed { path, message } => {
                format!("Search settings could not be saved to '{}': {}", path, message)
            }
            ConfigError::ParseFailed { path, .. } => {
                format!(
                    "The search settings file '{}' is damaged. Default settings will be used.",
                    path
                )
            }
            ConfigError::InvalidValue { field, message } => {
                format!("The search setting '{}' is not valid ({}).", field, message)
            }
            ConfigError::NoConfigDir => {
                "The settings folder for this user could not be found.".to_string()
            }
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by the HTTP fetch adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("No endpoint configured for entity type: {entity}")]
    UnknownEntity { entity: String },

    #[error("HTTP error {status}: {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Response is not valid JSON: {message}")]
    Decode { message: String },
}

impl RemoteError {
    /// Create a user-friendly error message for display in the frontend
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::UnknownEntity { entity } => {
                format!("Searching '{}' is not supported.", entity)
            }
            RemoteError::Http { status, .. } if *status == 401 || *status == 403 => {
                "Your session has expired. Please sign in again.".to_string()
            }
            RemoteError::Http { status, .. } => {
                format!("The server could not complete the search (HTTP {}).", status)
            }
            RemoteError::Network { .. } => {
                "The server could not be reached. Check your connection and try again.".to_string()
            }
            RemoteError::Decode { .. } => {
                "The server sent an unexpected response.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            RemoteError::Http {
                status: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if error.is_decode() {
            RemoteError::Decode {
                message: error.to_string(),
            }
        } else {
            RemoteError::Network {
                message: error.to_string(),
            }
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Convert errors to String for the shell layer
impl From<ConfigError> for String {
    fn from(error: ConfigError) -> Self {
        error.user_message()
    }
}

impl From<RemoteError> for String {
    fn from(error: RemoteError) -> Self {
        error.user_message()
    }
}
