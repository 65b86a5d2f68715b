use anyhow::Result;
use tracing::info;

use config::GradeConfig;
use report::ReportDocument;
use workspace::Workspace;

pub mod build;
pub mod config;
pub mod error;
pub mod process;
pub mod report;
pub mod runner;
pub mod test_cases;
pub mod workspace;

/// Stages, compiles and tests one submission, then writes the report into
/// the scratch directory. Returns whether it compiled and every test passed.
pub fn run(config: &GradeConfig) -> Result<bool> {
    let workspace = Workspace::stage(
        &config.submission_dir,
        &config.scratch_dir,
        &config.toolchain.source_ext,
    )?;

    let build = build::compile(config, &workspace)?;
    let report = if build.succeeded {
        let cases = test_cases::discover(config)?;
        info!("Found {} test cases in {}", cases.len(), config.test_dir.display());
        let records = runner::run_all(config, &workspace, &cases)?;
        ReportDocument::graded(build.message, records)
    } else {
        ReportDocument::compile_failed(build.message)
    };

    println!("{}", report.summary(config.total_points));
    let report_path = workspace.report_path(&config.report_file);
    report.write_to(&report_path)?;
    info!("Wrote {}", report_path.display());

    Ok(report.passed())
}
