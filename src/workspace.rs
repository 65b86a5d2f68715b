use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const ACTUAL_OUTPUT: &str = "out";
const ERROR_OUTPUT: &str = "err";

/// The scratch directory a grading run compiles and executes in.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Recreates `scratch_dir` empty and copies every `*.<source_ext>` file
    /// directly inside `submission_dir` into it.
    pub fn stage(submission_dir: &Path, scratch_dir: &Path, source_ext: &str) -> Result<Self> {
        match fs::remove_dir_all(scratch_dir) {
            Ok(()) => debug!("Removed previous {}", scratch_dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", scratch_dir.display()))
            }
        }
        fs::create_dir_all(scratch_dir)
            .with_context(|| format!("Failed to create {}", scratch_dir.display()))?;

        let workspace = Self {
            root: fs::canonicalize(scratch_dir)?,
        };

        let sources = collect_sources(submission_dir, source_ext)?;
        if sources.is_empty() {
            warn!(
                "No .{source_ext} files found in {}",
                submission_dir.display()
            );
        }
        for source in sources {
            // collect_sources only yields paths with a file name
            if let Some(name) = source.file_name() {
                fs::copy(&source, workspace.root.join(name))
                    .with_context(|| format!("Failed to copy {}", source.display()))?;
                debug!("Staged {}", source.display());
            }
        }

        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn actual_output(&self) -> PathBuf {
        self.root.join(ACTUAL_OUTPUT)
    }

    pub fn error_output(&self) -> PathBuf {
        self.root.join(ERROR_OUTPUT)
    }

    pub fn report_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

/// Regular files in `dir` (not its subdirectories) with the given extension,
/// sorted by name. A missing directory yields nothing.
fn collect_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}
