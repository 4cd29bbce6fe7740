use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    InvalidInput(String),
    InvalidData(String),
    Io(String),
    StorageRead(String),
    StorageWrite(String),
    Parse(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn storage_read<M: Into<String>>(message: M) -> Self {
        Self::StorageRead(message.into())
    }

    pub fn storage_write<M: Into<String>>(message: M) -> Self {
        Self::StorageWrite(message.into())
    }

    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
            Self::StorageRead(_) => "storage_read",
            Self::StorageWrite(_) => "storage_write",
            Self::Parse(_) => "parse_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Io(message)
            | Self::StorageRead(message)
            | Self::StorageWrite(message)
            | Self::Parse(message) => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}
