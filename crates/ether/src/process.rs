//! External tools: the Swift package manager and git.

use ether_types::sort_tags_newest_first;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0} not found on PATH")]
    NotFound(String),
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

impl ProcessError {
    /// The command line that failed, for reporting.
    pub fn command(&self) -> &str {
        match self {
            Self::NotFound(tool) => tool,
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }
}

/// Run `program args...` in `dir` and return stdout.
async fn run(program: &Path, args: &[&str], dir: Option<&Path>) -> Result<String, ProcessError> {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    let command = format!("{} {}", name, args.join(" "));
    tracing::debug!("Running {}", command);

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let output = cmd.output().await.map_err(|source| ProcessError::Spawn {
        command: command.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(ProcessError::Failed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn locate(tool: &str) -> Result<PathBuf, ProcessError> {
    which::which(tool).map_err(|_| ProcessError::NotFound(tool.to_string()))
}

/// The `swift package` subcommands run against one project.
pub struct SwiftPackageManager {
    swift: PathBuf,
    root: PathBuf,
}

impl SwiftPackageManager {
    /// Find `swift` on PATH.
    pub fn locate(root: &Path) -> Result<Self, ProcessError> {
        Ok(Self {
            swift: locate("swift")?,
            root: root.to_path_buf(),
        })
    }

    pub async fn resolve(&self) -> Result<(), ProcessError> {
        run(&self.swift, &["package", "resolve"], Some(&self.root)).await?;
        Ok(())
    }

    /// `swift package update` followed by `swift package resolve`.
    pub async fn update(&self) -> Result<(), ProcessError> {
        run(&self.swift, &["package", "update"], Some(&self.root)).await?;
        self.resolve().await
    }
}

/// Tag names of a remote repository, newest first.
pub async fn remote_tags(url: &str) -> Result<Vec<String>, ProcessError> {
    let git = locate("git")?;
    let stdout = run(&git, &["ls-remote", "--tags", "--refs", url], None).await?;
    let mut tags = parse_ls_remote(&stdout);
    sort_tags_newest_first(&mut tags);
    Ok(tags)
}

/// Tag names from `git ls-remote --tags` output.
pub fn parse_ls_remote(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            // Format: "<sha>\trefs/tags/<tag>"
            let (_, reference) = line.split_once('\t')?;
            let tag = reference.trim().strip_prefix("refs/tags/")?;
            let tag = tag.strip_suffix("^{}").unwrap_or(tag);
            (!tag.is_empty()).then(|| tag.to_string())
        })
        .fold(Vec::new(), |mut tags, tag| {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
            tags
        })
}

/// Stage everything in `root` and commit it.
pub async fn git_commit(root: &Path, message: &str) -> Result<(), ProcessError> {
    let git = locate("git")?;
    run(&git, &["add", "-A"], Some(root)).await?;
    run(&git, &["commit", "-m", message], Some(root)).await?;
    Ok(())
}
