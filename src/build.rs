use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::{config::GradeConfig, process, process::Invocation, workspace::Workspace};

#[derive(Debug)]
pub struct BuildOutcome {
    pub succeeded: bool,
    /// Names the command and carries the compiler output on failure.
    pub message: String,
}

/// Compiles the entry source inside the workspace. A non-zero compiler exit
/// is reported in the outcome; only a compiler that cannot be started is an
/// error.
pub fn compile(config: &GradeConfig, workspace: &Workspace) -> Result<BuildOutcome> {
    let invocation =
        Invocation::new(&config.toolchain.compiler, workspace.root()).arg(config.entry_source());
    info!("Compiling with `{invocation}`");

    let captured = process::capture(&invocation)?;
    let prefix = format!("Compilation ({invocation})");

    let outcome = if captured.success() {
        let message = format!("{prefix} SUCCEEDED!\n");
        println!("{}", message.green());
        BuildOutcome {
            succeeded: true,
            message,
        }
    } else {
        let message = format!("{prefix} FAILED:\n{}", captured.text);
        println!("{}", message.red());
        BuildOutcome {
            succeeded: false,
            message,
        }
    };

    Ok(outcome)
}
