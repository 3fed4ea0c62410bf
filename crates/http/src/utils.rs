//! Utility macros shared by the matchers and the parser.

/// Early-returns `Err($error)` when `$predicate` does not hold.
///
/// Works like `assert!`, but for fallible code paths. Used for the limit
/// checks in the parser, e.g. `ensure!(count <= max, ParseError::limit_exceeded(..))`.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
