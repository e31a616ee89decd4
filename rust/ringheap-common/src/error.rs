//! Error type shared by the ringheap crates.

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_bounds(name: impl Into<String>, index: usize, bound: usize) -> Error {
        Error(
            ErrorKind::OutOfBounds {
                name: name.into(),
                index,
                bound,
            }
            .into(),
        )
    }

    pub fn empty(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::EmptyCollection {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn allocation_failed(bytes: usize) -> Error {
        Error(ErrorKind::AllocationFailed { bytes }.into())
    }

    pub fn is_invalid_arg(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfBounds { .. })
    }

    pub fn is_empty_collection(&self) -> bool {
        matches!(self.kind(), ErrorKind::EmptyCollection { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("{name} out of bounds: {index} >= {bound}")]
    OutOfBounds {
        name: String,
        index: usize,
        bound: usize,
    },

    #[error("{operation} on an empty collection")]
    EmptyCollection { operation: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("failed to allocate {bytes} bytes")]
    AllocationFailed { bytes: usize },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let e = Error::out_of_bounds("offset", 8, 8);
        assert!(e.is_out_of_bounds());
        assert_eq!(e.to_string(), "offset out of bounds: 8 >= 8");

        let e = Error::empty("pop_front");
        assert!(e.is_empty_collection());
        assert_eq!(e.to_string(), "pop_front on an empty collection");

        let e = Error::invalid_arg("entry_size", "entry_size > 0");
        assert!(e.is_invalid_arg());
        match e.into_kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "entry_size");
                assert_eq!(message, "entry_size > 0");
            }
            kind => panic!("unexpected error kind {kind:?}"),
        }
    }
}
