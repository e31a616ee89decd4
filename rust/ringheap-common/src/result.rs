//! Crate-wide `Result` alias and the argument/index checks that feed it.

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Returns `InvalidArgument` from the enclosing function unless `$expr` holds.
///
/// The error names `$name` and carries the failed condition as its message.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let holds = $expr;
        $crate::result::verify_arg(holds, stringify!($name), stringify!($expr))?;
    }};
}

/// Returns `OutOfBounds` from the enclosing function unless `$index < $bound`.
#[macro_export]
macro_rules! verify_index {
    ($name:expr, $index:expr, $bound:expr) => {{
        $crate::result::verify_index($index, $bound, stringify!($name))?;
    }};
}

#[inline]
pub fn verify_arg(holds: bool, name: &str, condition: &str) -> Result<()> {
    match holds {
        true => Ok(()),
        false => Err(failed_condition(name, condition)),
    }
}

#[inline]
pub fn verify_index(index: usize, bound: usize, name: &str) -> Result<()> {
    match index < bound {
        true => Ok(()),
        false => Err(index_past_bound(name, index, bound)),
    }
}

#[cold]
fn failed_condition(name: &str, condition: &str) -> Error {
    Error::invalid_arg(name, condition)
}

#[cold]
fn index_past_bound(name: &str, index: usize, bound: usize) -> Error {
    Error::out_of_bounds(name, index, bound)
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn checked(entry_size: usize, offset: usize, capacity: usize) -> super::Result<()> {
        verify_arg!(entry_size, entry_size != 0);
        verify_index!(offset, offset, capacity);
        Ok(())
    }

    #[test]
    fn test_verify_macros() {
        assert!(checked(4, 0, 1).is_ok());

        let e = checked(0, 0, 1).unwrap_err();
        match e.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "entry_size");
                assert_eq!(message, "entry_size != 0");
            }
            kind => panic!("unexpected error kind {kind:?}"),
        }

        let e = checked(4, 3, 3).unwrap_err();
        match e.kind() {
            ErrorKind::OutOfBounds { name, index, bound } => {
                assert_eq!(name, "offset");
                assert_eq!(*index, 3);
                assert_eq!(*bound, 3);
            }
            kind => panic!("unexpected error kind {kind:?}"),
        }
    }
}
