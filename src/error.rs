use std::fmt;

#[derive(Debug)]
pub enum MarkPlateError {
    InvalidConfiguration(String),
    Asset(String),
    Io(std::io::Error),
}

impl fmt::Display for MarkPlateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkPlateError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            MarkPlateError::Asset(message) => write!(f, "asset error: {}", message),
            MarkPlateError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for MarkPlateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkPlateError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MarkPlateError {
    fn from(value: std::io::Error) -> Self {
        MarkPlateError::Io(value)
    }
}
