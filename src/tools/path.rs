//! Path validation against the allowed roots
//!
//! Every tool path goes through [`PathGuard::resolve`]. The result is a
//! [`ResolvedPath`]: absolute, symlink-free, and inside one of the roots.
//! Symlinks are followed component by component, dangling ones included, so
//! neither a symlinked parent nor a link to a missing file can escape.

use log::warn;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{ConfigError, ToolError, ToolOutcome};

/// A caller path that passed validation. Only [`PathGuard::resolve`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Parent directory, if the path has one
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Validates caller paths against a fixed set of canonical roots
#[derive(Debug, Clone)]
pub struct PathGuard {
    roots: Vec<PathBuf>,
}

impl PathGuard {
    /// Canonicalize the configured roots. Each must be an existing directory.
    pub fn new<P: AsRef<Path>>(roots: &[P]) -> Result<Self, ConfigError> {
        if roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }

        let mut canonical_roots = Vec::with_capacity(roots.len());
        for root in roots {
            let root = root.as_ref();
            let canonical = fs::canonicalize(root).map_err(|source| ConfigError::InvalidRoot {
                path: root.display().to_string(),
                source,
            })?;
            if !canonical.is_dir() {
                return Err(ConfigError::RootNotDirectory(root.display().to_string()));
            }
            canonical_roots.push(canonical);
        }

        Ok(Self {
            roots: canonical_roots,
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Root that relative paths are joined onto
    pub fn primary_root(&self) -> &Path {
        &self.roots[0]
    }

    /// Resolve a raw caller path. Performs no filesystem mutation.
    pub fn resolve(&self, raw: &str) -> ToolOutcome<ResolvedPath> {
        if raw.trim().is_empty() {
            return Err(ToolError::invalid_input("Path must not be empty"));
        }
        if raw.contains('\0') {
            return Err(ToolError::invalid_input(format!(
                "Path contains a null byte: {}",
                raw.replace('\0', "\\0")
            )));
        }

        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.primary_root().join(candidate)
        };

        let resolved = resolve_components(&joined, raw)?;

        if !self.roots.iter().any(|root| resolved.starts_with(root)) {
            warn!(
                "Rejected path '{}': resolves to '{}' outside the allowed roots",
                raw,
                resolved.display()
            );
            return Err(ToolError::path_traversal(format!(
                "Path '{}' is outside the allowed directories",
                raw
            )));
        }

        Ok(ResolvedPath { path: resolved })
    }
}

/// Upper bound on symlinks followed while resolving one path
const MAX_SYMLINK_HOPS: usize = 40;

enum Step {
    Parent,
    Name(OsString),
}

/// Split a path into its prefix/root (absolute paths only) and the steps after it
fn split_steps(path: &Path) -> (Option<PathBuf>, VecDeque<Step>) {
    let mut base: Option<PathBuf> = None;
    let mut steps = VecDeque::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                base.get_or_insert_with(PathBuf::new).push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => steps.push_back(Step::Parent),
            Component::Normal(name) => steps.push_back(Step::Name(name.to_os_string())),
        }
    }
    (base, steps)
}

/// Resolve an absolute path one component at a time, following symlinks the
/// way the OS does. `..` pops the already-resolved parent, so `link/..` lands
/// next to the link target. Dangling links are followed to where they point.
/// Components that do not exist yet are appended as given.
fn resolve_components(path: &Path, raw: &str) -> ToolOutcome<PathBuf> {
    let (base, mut pending) = split_steps(path);
    let mut resolved = match base {
        Some(base) => fs::canonicalize(&base).unwrap_or(base),
        None => return Err(ToolError::invalid_input(format!("Path '{}' is not absolute", raw))),
    };
    let mut hops = 0;

    while let Some(step) = pending.pop_front() {
        let name = match step {
            Step::Parent => {
                resolved.pop();
                continue;
            }
            Step::Name(name) => name,
        };

        let candidate = resolved.join(&name);
        match fs::symlink_metadata(&candidate) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    warn!("Rejected path '{}': symlink chain too deep", raw);
                    return Err(ToolError::io_failure(format!(
                        "Failed to resolve path '{}': too many levels of symbolic links",
                        raw
                    )));
                }
                let target = fs::read_link(&candidate)
                    .map_err(|e| ToolError::from_io(&e, format!("Failed to resolve path '{}'", raw)))?;
                let (target_base, target_steps) = split_steps(&target);
                if let Some(target_base) = target_base {
                    resolved = target_base;
                }
                for step in target_steps.into_iter().rev() {
                    pending.push_front(step);
                }
            }
            _ => resolved = candidate,
        }
    }
    Ok(resolved)
}
