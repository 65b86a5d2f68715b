use anyhow::Result;
use colored::Colorize;
use tracing::{info, warn};

use crate::{
    config::GradeConfig,
    error::GradeError,
    process::{self, Invocation, ProcessResult},
    report::{format_score, TestRecord},
    test_cases::TestCase,
    workspace::Workspace,
};

const DIFF_HEADER: &str = "*********** DIFF OUTPUT: Actual output followed by expected.\n";

/// Equal share of `total` for each of `count` tests.
pub fn max_score_per_test(config: &GradeConfig, count: usize) -> Result<f64, GradeError> {
    if count == 0 {
        return Err(GradeError::NoTestCasesFound {
            dir: config.test_dir.clone(),
            prefix: config.output_prefix.clone().unwrap_or_default(),
        });
    }
    Ok(config.total_points / count as f64)
}

/// Runs the compiled program for one case and diffs its stdout against the
/// expected file, ignoring blank lines and whitespace.
pub fn run_test(
    config: &GradeConfig,
    workspace: &Workspace,
    case: &TestCase,
    max_score: f64,
) -> Result<TestRecord> {
    let actual = workspace.actual_output();
    let program = Invocation::new(&config.toolchain.runtime, workspace.root())
        .arg(&config.entry_class)
        .args(&case.args);
    info!("Running `{program}`");

    let execution =
        process::run_redirected(&program, &actual, &workspace.error_output(), config.run_timeout)?;
    if execution != ProcessResult::Success {
        warn!("{}: `{program}` {execution}", case.name);
    }

    let diff = Invocation::new(&config.toolchain.diff, workspace.root())
        .args(["-B", "-w"])
        .arg(&actual)
        .arg(&case.expected);
    let diffed = process::capture(&diff)?;

    let timed_out = execution == ProcessResult::Timeout;
    let passed = !timed_out && diffed.success();

    let (score, message) = if passed {
        let message = format!("Passed {} test.\n", case.name);
        println!("{}", message.green());
        (max_score, message)
    } else {
        let mut message = format!("Failed {} test.\n", case.name);
        if let (true, Some(limit)) = (timed_out, config.run_timeout) {
            message.push_str(&format!(
                "Program timed out after {} seconds.\n",
                limit.as_secs()
            ));
        }
        message.push_str(DIFF_HEADER);
        println!("{}{}", message.red(), diffed.text);
        (0.0, message)
    };

    Ok(TestRecord {
        max_score: format_score(max_score),
        name: case.name.clone(),
        output: message + &diffed.text,
        score: format_score(score),
        passed,
    })
}

/// Runs every case in order. A failing case never stops the ones after it.
pub fn run_all(
    config: &GradeConfig,
    workspace: &Workspace,
    cases: &[TestCase],
) -> Result<Vec<TestRecord>> {
    let max_score = max_score_per_test(config, cases.len())?;

    let mut records = Vec::with_capacity(cases.len());
    for case in cases {
        records.push(run_test(config, workspace, case, max_score)?);
    }

    let passed = records.iter().filter(|r| r.passed).count();
    info!("{passed}/{} tests passed", records.len());

    Ok(records)
}
