use crate::core::{self, FileEntry};
use crate::transform::{self, CaseStyle, SeparatorPolicy};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Rename,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unchanged,
    EmptyName,
    TargetExists,
    DuplicateTarget,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Unchanged => "name unchanged",
            SkipReason::EmptyName => "new name would be empty",
            SkipReason::TargetExists => "target already exists",
            SkipReason::DuplicateTarget => "another file maps to the same name",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Default)]
pub struct Plan {
    pub operations: Vec<Operation>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

#[derive(Debug, Default)]
pub struct Report {
    pub done: Vec<Operation>,
    pub failed: Vec<(Operation, String)>,
}

pub async fn build_plan(
    entries: &[FileEntry],
    filters: &[String],
    style: CaseStyle,
    separator: &SeparatorPolicy,
) -> Plan {
    let mut plan = Plan::default();
    let mut targets = HashSet::new();
    for entry in entries {
        let (_, extension) = transform::split_extension(&entry.filename);
        let new_name = transform::preview_name(&entry.filename, filters, style, separator);
        // The extension is appended verbatim, so nothing else means an empty base.
        if new_name.len() == extension.len() {
            plan.skipped.push((entry.path.clone(), SkipReason::EmptyName));
            continue;
        }
        if new_name == entry.filename {
            plan.skipped.push((entry.path.clone(), SkipReason::Unchanged));
            continue;
        }
        let target = entry.path.with_file_name(&new_name);
        if !targets.insert(target.clone()) {
            plan.skipped.push((entry.path.clone(), SkipReason::DuplicateTarget));
            continue;
        }
        let exists = tokio::fs::try_exists(&target).await.unwrap_or(false);
        if exists && !is_same_file(&entry.path, &target).await {
            plan.skipped.push((entry.path.clone(), SkipReason::TargetExists));
            continue;
        }
        plan.operations.push(Operation {
            source: entry.path.clone(),
            target,
        });
    }
    plan
}

pub async fn execute(plan: &Plan, mode: Mode) -> Report {
    let mut report = Report::default();
    for operation in &plan.operations {
        let result = match mode {
            Mode::Rename => core::rename_path(&operation.source, &operation.target).await,
            Mode::Copy => core::copy_path(&operation.source, &operation.target).await,
        };
        match result {
            Ok(()) => {
                info!(
                    source = %operation.source.display(),
                    target = %operation.target.display(),
                    ?mode,
                    "applied"
                );
                report.done.push(operation.clone());
            }
            Err(err) => {
                warn!(source = %operation.source.display(), error = %err, "operation failed");
                report.failed.push((operation.clone(), err.to_string()));
            }
        }
    }
    report
}

// Case-only renames on case-insensitive filesystems see the target as existing.
async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
