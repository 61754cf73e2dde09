use std::result;

/// Failures reported by the tree containers.
///
/// Lookups that can miss (`find`, `get`, `contains_key`) report absence through their return
/// value instead; only the accessors that promise a value and the cursor-based erase fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The requested key is not stored in the container.
    #[error("key not found")]
    KeyNotFound,
    /// The cursor is the end position or no longer references a live node.
    #[error("invalid iterator")]
    InvalidIterator,
}

pub type Result<T> = result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_display() {
        assert_eq!(Error::KeyNotFound.to_string(), "key not found");
        assert_eq!(Error::InvalidIterator.to_string(), "invalid iterator");
    }
}
