//! Crate and source file discovery.
//!
//! # Responsibility
//! - Walk the checked root and find crate manifests and Rust files.
//! - Attribute every Rust file to its innermost crate.
//!
//! # Invariants
//! - `target/` and hidden directories are never entered.
//! - Discovery order is sorted by path, so layouts are deterministic.

use crate::config::CompiledConfig;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};
use toml::{Table, Value};
use walkdir::{DirEntry, WalkDir};

const MANIFEST_FILE_NAME: &str = "Cargo.toml";

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    RootNotFound(PathBuf),
    Io { path: PathBuf, message: String },
    Manifest { path: PathBuf, message: String },
}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootNotFound(path) => {
                write!(f, "root `{}` is not a readable directory", path.display())
            }
            Self::Io { path, message } => write!(f, "failed to read `{}`: {message}", path.display()),
            Self::Manifest { path, message } => {
                write!(f, "invalid manifest `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for DiscoveryError {}

/// One `[package]` found under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateLayout {
    pub name: String,
    /// Root-relative crate directory; empty for a crate at the root.
    pub dir: String,
    /// Resolved package version (workspace inheritance applied).
    pub version: Option<String>,
    /// Root-relative `.rs` files owned by this crate, sorted.
    pub files: Vec<String>,
}

impl CrateLayout {
    /// Root-relative path of a crate-relative path.
    pub fn join(&self, crate_relative: &str) -> String {
        if self.dir.is_empty() {
            crate_relative.to_string()
        } else {
            format!("{}/{crate_relative}", self.dir)
        }
    }

    /// Crate-relative form of a root-relative path owned by this crate.
    pub fn crate_relative<'a>(&self, path: &'a str) -> &'a str {
        if self.dir.is_empty() {
            return path;
        }
        path.strip_prefix(self.dir.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    }

    pub fn manifest_path(&self) -> String {
        self.join(MANIFEST_FILE_NAME)
    }

    fn owns(&self, path: &str) -> bool {
        self.dir.is_empty()
            || path
                .strip_prefix(self.dir.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    pub root: PathBuf,
    pub crates: Vec<CrateLayout>,
    /// `.rs` files that belong to no crate.
    pub loose_files: Vec<String>,
}

impl WorkspaceLayout {
    pub fn file_count(&self) -> usize {
        self.crates.iter().map(|krate| krate.files.len()).sum::<usize>() + self.loose_files.len()
    }
}

/// Discovers crates and Rust files under `root`.
pub fn discover_workspace(root: &Path, config: &CompiledConfig) -> DiscoveryResult<WorkspaceLayout> {
    if !root.is_dir() {
        return Err(DiscoveryError::RootNotFound(root.to_path_buf()));
    }

    let mut manifests = Vec::new();
    let mut rust_files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(root, entry, config));

    for entry in walker {
        let entry = entry.map_err(|err| DiscoveryError::Io {
            path: err
                .path()
                .map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            message: err.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_path(root, entry.path());
        if config.is_excluded(&relative) {
            debug!("event=discover_skip module=engine reason=excluded path={relative}");
            continue;
        }
        if entry.file_name() == MANIFEST_FILE_NAME {
            manifests.push((relative, entry.path().to_path_buf()));
        } else if entry.path().extension().is_some_and(|ext| ext == "rs") {
            rust_files.push(relative);
        }
    }

    let parsed = manifests
        .iter()
        .map(|(relative, path)| read_manifest(path).map(|table| (relative.as_str(), table)))
        .collect::<DiscoveryResult<Vec<_>>>()?;

    let workspaces = parsed
        .iter()
        .filter_map(|(relative, table)| {
            let version = table
                .get("workspace")?
                .get("package")
                .and_then(|package| package.get("version"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Some((manifest_dir(relative), version))
        })
        .collect::<Vec<_>>();

    let mut crates = Vec::new();
    for (relative, table) in &parsed {
        let Some(package) = table.get("package").and_then(Value::as_table) else {
            continue;
        };
        let dir = manifest_dir(relative);
        let name = package
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = match package.get("version") {
            Some(Value::String(version)) => Some(version.clone()),
            Some(Value::Table(inherited))
                if inherited.get("workspace").and_then(Value::as_bool) == Some(true) =>
            {
                workspaces
                    .iter()
                    .filter(|(workspace_dir, _)| is_within(&dir, workspace_dir))
                    .max_by_key(|(workspace_dir, _)| workspace_dir.len())
                    .and_then(|(_, version)| version.clone())
            }
            _ => None,
        };
        crates.push(CrateLayout {
            name,
            dir,
            version,
            files: Vec::new(),
        });
    }

    let mut loose_files = Vec::new();
    for file in rust_files {
        let owner = crates
            .iter_mut()
            .filter(|krate| krate.owns(&file))
            .max_by_key(|krate| krate.dir.len());
        match owner {
            Some(krate) => krate.files.push(file),
            None => loose_files.push(file),
        }
    }

    info!(
        "event=discover module=engine status=ok crates={} loose_files={}",
        crates.len(),
        loose_files.len()
    );

    Ok(WorkspaceLayout {
        root: root.to_path_buf(),
        crates,
        loose_files,
    })
}

/// Root-relative `/`-separated form of `path`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn manifest_dir(manifest: &str) -> String {
    manifest
        .strip_suffix(MANIFEST_FILE_NAME)
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string()
}

/// Whether root-relative `dir` is `ancestor` or lies below it.
fn is_within(dir: &str, ancestor: &str) -> bool {
    ancestor.is_empty()
        || dir == ancestor
        || dir
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_skipped_dir(root: &Path, entry: &DirEntry, config: &CompiledConfig) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name == "target" || name.starts_with('.') {
        return true;
    }
    config.is_excluded(&relative_path(root, entry.path()))
}

fn read_manifest(path: &Path) -> DiscoveryResult<Table> {
    let text = std::fs::read_to_string(path).map_err(|err| DiscoveryError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    text.parse::<Table>().map_err(|err| DiscoveryError::Manifest {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
