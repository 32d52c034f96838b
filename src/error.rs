#![forbid(unsafe_code)]

use std::io;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Not bzip data")]
    NotBzipData,
    #[error("Obsolete (pre 0.9.5) bzip format not supported")]
    ObsoleteFormat,
    #[error("Data error ({0})")]
    DataError(&'static str),
    #[error("Data error (crc mismatch: expected {expected:#010x}, computed {computed:#010x})")]
    CrcMismatch { expected: u32, computed: u32 },
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl DecodeError {
    /// True for every kind of structural corruption, checksum failures included.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::DataError(_) | Self::CrcMismatch { .. })
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            _ => Self::Io(err),
        }
    }
}

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io(inner) => inner,
            DecodeError::UnexpectedEof => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_conversions() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "short");
        assert!(matches!(DecodeError::from(eof), DecodeError::UnexpectedEof));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(DecodeError::from(denied), DecodeError::Io(_)));

        let back: io::Error = DecodeError::DataError("bad table").into();
        assert_eq!(back.kind(), io::ErrorKind::InvalidData);
        let back: io::Error = DecodeError::UnexpectedEof.into();
        assert_eq!(back.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn user_facing_messages() {
        assert_eq!(DecodeError::NotBzipData.to_string(), "Not bzip data");
        assert_eq!(
            DecodeError::ObsoleteFormat.to_string(),
            "Obsolete (pre 0.9.5) bzip format not supported"
        );
        assert!(DecodeError::DataError("x").to_string().starts_with("Data error"));
        let crc = DecodeError::CrcMismatch {
            expected: 1,
            computed: 2,
        };
        assert!(crc.to_string().starts_with("Data error"));
        assert!(crc.is_data_error());
        assert!(!DecodeError::NotBzipData.is_data_error());
    }
}
