use std::path::PathBuf;

use thiserror::Error;

/// Declared failures that end a grading run before any report is written.
///
/// Compile and per-test failures are not here: they are scored, not raised.
#[derive(Error, Debug)]
pub enum GradeError {
    #[error("{file}: first name token {found:?} does not match output prefix {prefix:?}")]
    PrefixMismatch {
        file: String,
        prefix: String,
        found: String,
    },
    #[error("{file}: expected an input file token after the output prefix")]
    MissingInputToken { file: String },
    #[error("no `{prefix}*.out` test cases found in {}", dir.display())]
    NoTestCasesFound { dir: PathBuf, prefix: String },
    #[error("cannot build a file pattern from {0:?}")]
    InvalidPattern(String),
}
