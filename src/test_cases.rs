use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use tracing::debug;

use crate::{config::GradeConfig, error::GradeError};

const EXPECTED_EXT: &str = ".out";

/// One expected-output file and the command line it encodes.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub expected: PathBuf,
    pub args: Vec<String>,
}

// Expected-output files are named
//   <prefix>-<arg1>-<arg2>-...-<argN>.out
// and the program is run with `arg1 arg2 ... argN`. With an input
// extension, arg1 is the base name of an input file next to the .out file:
//   pa2-miniRoutes-MAX.out  =>  <testdir>/miniRoutes.csv MAX
//
// An argument that itself contains '-' cannot be expressed.
pub fn derive_args(
    file_name: &str,
    prefix: Option<&str>,
    input_dir: &Path,
    input_ext: Option<&str>,
) -> Result<Vec<String>, GradeError> {
    let stem = file_name.strip_suffix(EXPECTED_EXT).unwrap_or(file_name);
    let mut tokens = stem.split('-');

    // split always yields at least one item
    let first = tokens.next().unwrap_or_default();
    if let Some(prefix) = prefix {
        if first != prefix {
            return Err(GradeError::PrefixMismatch {
                file: file_name.to_string(),
                prefix: prefix.to_string(),
                found: first.to_string(),
            });
        }
    }

    let mut args: Vec<String> = tokens.map(str::to_string).collect();

    // The input token is expanded even when empty (`pa2--x.out` names
    // `<dir>/.csv`); other empty tokens are dropped afterwards.
    if let Some(ext) = input_ext {
        let base = args
            .first_mut()
            .ok_or_else(|| GradeError::MissingInputToken {
                file: file_name.to_string(),
            })?;
        *base = input_dir
            .join(format!("{base}.{ext}"))
            .to_string_lossy()
            .into_owned();
    }
    args.retain(|a| !a.is_empty());

    Ok(args)
}

/// Every `<prefix>*.out` file in the test directory, in name order, with its
/// derived arguments. Expected and input files resolve against the absolute
/// test directory since programs run inside the scratch directory.
pub fn discover(config: &GradeConfig) -> Result<Vec<TestCase>> {
    let prefix = config.output_prefix.as_deref().unwrap_or("");
    let dir = config
        .test_dir
        .to_str()
        .ok_or_else(|| GradeError::InvalidPattern(config.test_dir.display().to_string()))?;
    let file_pattern = format!("{}*{EXPECTED_EXT}", Pattern::escape(prefix));
    let pattern = Path::new(&Pattern::escape(dir)).join(&file_pattern);
    let pattern = pattern
        .to_str()
        .ok_or_else(|| GradeError::InvalidPattern(pattern.display().to_string()))?;

    let mut expected_files: Vec<PathBuf> = glob(pattern)
        .map_err(|_| GradeError::InvalidPattern(pattern.to_string()))?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    expected_files.sort();

    if expected_files.is_empty() {
        return Err(GradeError::NoTestCasesFound {
            dir: config.test_dir.clone(),
            prefix: prefix.to_string(),
        }
        .into());
    }

    let input_dir = fs::canonicalize(&config.test_dir)
        .with_context(|| format!("Failed to resolve {}", config.test_dir.display()))?;

    let mut cases = Vec::with_capacity(expected_files.len());
    for expected in expected_files {
        let file_name = expected
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GradeError::InvalidPattern(expected.display().to_string()))?;
        let args = derive_args(
            file_name,
            config.output_prefix.as_deref(),
            &input_dir,
            config.input_extension.as_deref(),
        )?;
        debug!("{file_name} => {args:?}");

        cases.push(TestCase {
            name: expected.display().to_string(),
            expected: input_dir.join(file_name),
            args,
        });
    }

    Ok(cases)
}
