use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Submission location when grading locally.
pub const LOCAL_SUBMISSION_DIR: &str = "src/";
/// Submission location inside the Gradescope autograder image.
pub const GRADESCOPE_SUBMISSION_DIR: &str = "/autograder/submission/";
pub const SCRATCH_DIR: &str = "TestingTemp";
pub const REPORT_FILE: &str = "results.json";
/// Correctness points shared equally between all test cases.
pub const TOTAL_POINTS: f64 = 50.0;

#[derive(Parser)]
#[command(author, version, about = "Compile a submission and grade it against expected-output files", long_about = None)]
pub struct Cli {
    /// Terminal coloring
    #[arg(short = 'c', long, value_parser = ["on", "off"])]
    pub color: Option<String>,

    /// Quiet (use -q or -qq)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Debug information
    #[arg(long)]
    pub debug: bool,

    /// Prefix for expected outfiles
    #[arg(long)]
    pub outpre: Option<String>,

    /// Extension for input files
    #[arg(long)]
    pub inext: Option<String>,

    /// Copy submission from gradescope location
    #[arg(long)]
    pub gradescope: bool,

    /// Per-test execution time limit in seconds (unbounded if absent)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Name of the main class, without extension
    pub mainclass: String,

    /// Directory holding the expected-output files
    pub testdir: PathBuf,
}

impl Cli {
    pub fn into_config(self) -> GradeConfig {
        let submission_dir = if self.gradescope {
            PathBuf::from(GRADESCOPE_SUBMISSION_DIR)
        } else {
            PathBuf::from(LOCAL_SUBMISSION_DIR)
        };

        GradeConfig {
            entry_class: self.mainclass,
            test_dir: self.testdir,
            output_prefix: self.outpre,
            input_extension: self.inext,
            submission_dir,
            scratch_dir: PathBuf::from(SCRATCH_DIR),
            report_file: REPORT_FILE.to_string(),
            total_points: TOTAL_POINTS,
            toolchain: Toolchain::default(),
            run_timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

/// External programs the grader shells out to.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub compiler: String,
    pub runtime: String,
    pub diff: String,
    pub source_ext: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: "javac".to_string(),
            runtime: "java".to_string(),
            diff: "diff".to_string(),
            source_ext: "java".to_string(),
        }
    }
}

/// Everything one grading run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct GradeConfig {
    pub entry_class: String,
    pub test_dir: PathBuf,
    /// `None` matches every `*.out` file.
    pub output_prefix: Option<String>,
    /// When set, the first argument token names an input file in `test_dir`.
    pub input_extension: Option<String>,
    pub submission_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub report_file: String,
    pub total_points: f64,
    pub toolchain: Toolchain,
    pub run_timeout: Option<Duration>,
}

impl GradeConfig {
    pub fn entry_source(&self) -> String {
        format!("{}.{}", self.entry_class, self.toolchain.source_ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_and_options() {
        let cli = Cli::try_parse_from([
            "grade",
            "PA2Main",
            "PublicTestCases",
            "--outpre",
            "pa2",
            "--inext",
            "csv",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!(config.entry_class, "PA2Main");
        assert_eq!(config.test_dir, PathBuf::from("PublicTestCases"));
        assert_eq!(config.output_prefix.as_deref(), Some("pa2"));
        assert_eq!(config.input_extension.as_deref(), Some("csv"));
        assert_eq!(config.submission_dir, PathBuf::from(LOCAL_SUBMISSION_DIR));
        assert_eq!(config.entry_source(), "PA2Main.java");
        assert!(config.run_timeout.is_none());
    }

    #[test]
    fn gradescope_flag_switches_submission_dir() {
        let cli = Cli::try_parse_from([
            "grade",
            "Main",
            "tests",
            "--gradescope",
            "--timeout",
            "10",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!(
            config.submission_dir,
            PathBuf::from(GRADESCOPE_SUBMISSION_DIR)
        );
        assert_eq!(config.run_timeout, Some(Duration::from_secs(10)));
        assert!(config.output_prefix.is_none());
    }

    #[test]
    fn missing_testdir_is_a_usage_error() {
        assert!(Cli::try_parse_from(["grade", "Main"]).is_err());
    }
}
