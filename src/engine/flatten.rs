//! Resolves dropped/selected entries into a flat upload plan.
//!
//! Containers are enumerated through the [`ChildLister`] capability so the
//! walk itself stays host-agnostic; the CLI supplies [`FsLister`]. Sibling
//! subtrees are walked concurrently, so callers must treat the output as an
//! unordered collection keyed by `relative_path`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Raw input to flattening: a leaf file or a container that can be
/// enumerated. `payload`/`handle` are opaque to the walk itself.
#[derive(Debug, Clone)]
pub enum PendingEntry {
    File {
        name: String,
        payload: PathBuf,
        size: u64,
    },
    Container {
        name: String,
        handle: PathBuf,
    },
}

/// One leaf file of the resolved plan. `relative_path` is the `/`-joined
/// chain of ancestor container names plus the leaf name, unique within one
/// flattening run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedFile {
    pub relative_path: String,
    pub payload: PathBuf,
    pub size: u64,
}

/// Enumerates the direct children of a container handle.
#[async_trait]
pub trait ChildLister: Send + Sync {
    async fn list_children(&self, handle: &Path) -> Result<Vec<PendingEntry>>;
}

fn join_path(ancestor: &str, name: &str) -> String {
    if ancestor.is_empty() {
        name.to_string()
    } else {
        format!("{ancestor}/{name}")
    }
}

fn flatten_branch(
    lister: Arc<dyn ChildLister>,
    entry: PendingEntry,
    ancestor: String,
) -> Pin<Box<dyn Future<Output = Vec<FlattenedFile>> + Send>> {
    Box::pin(async move {
        match entry {
            PendingEntry::File {
                name,
                payload,
                size,
            } => vec![FlattenedFile {
                relative_path: join_path(&ancestor, &name),
                payload,
                size,
            }],
            PendingEntry::Container { name, handle } => {
                let children = match lister.list_children(&handle).await {
                    Ok(children) => children,
                    Err(err) => {
                        // A branch that cannot be enumerated contributes
                        // nothing; the rest of the walk still completes.
                        tracing::warn!("skipping container '{name}': {err:#}");
                        return Vec::new();
                    }
                };

                let prefix = join_path(&ancestor, &name);
                let mut tasks = JoinSet::new();
                for child in children {
                    tasks.spawn(flatten_branch(lister.clone(), child, prefix.clone()));
                }

                let mut files = Vec::new();
                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok(branch) => files.extend(branch),
                        Err(err) => tracing::warn!("flatten task failed: {err}"),
                    }
                }
                files
            }
        }
    })
}

/// Resolve every root and every nested branch into leaf files. Completes
/// only once all branches have resolved; sibling order is not preserved.
pub async fn flatten_entries(
    lister: Arc<dyn ChildLister>,
    roots: Vec<PendingEntry>,
) -> Vec<FlattenedFile> {
    let mut tasks = JoinSet::new();
    for root in roots {
        tasks.spawn(flatten_branch(lister.clone(), root, String::new()));
    }

    let mut files = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(branch) => files.extend(branch),
            Err(err) => tracing::warn!("flatten task failed: {err}"),
        }
    }
    files
}

/// Filesystem-backed enumeration for the CLI host.
pub struct FsLister;

#[async_trait]
impl ChildLister for FsLister {
    async fn list_children(&self, handle: &Path) -> Result<Vec<PendingEntry>> {
        let mut dir = tokio::fs::read_dir(handle)
            .await
            .context(format!("Failed to read directory: {}", handle.display()))?;

        let mut entries = Vec::new();
        while let Some(child) = dir
            .next_entry()
            .await
            .context(format!("Failed to enumerate: {}", handle.display()))?
        {
            let name = child.file_name().to_string_lossy().to_string();
            let path = child.path();
            let metadata = child
                .metadata()
                .await
                .context(format!("Failed to stat: {}", path.display()))?;

            if metadata.is_dir() {
                entries.push(PendingEntry::Container { name, handle: path });
            } else if metadata.is_file() {
                entries.push(PendingEntry::File {
                    name,
                    payload: path,
                    size: metadata.len(),
                });
            }
        }
        Ok(entries)
    }
}

/// Build root entries from command-line paths, failing fast on anything
/// that does not exist.
pub async fn roots_from_paths(paths: &[PathBuf]) -> Result<Vec<PendingEntry>> {
    let mut roots = Vec::new();
    for path in paths {
        let metadata = tokio::fs::metadata(path)
            .await
            .context(format!("No such file or directory: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if metadata.is_dir() {
            roots.push(PendingEntry::Container {
                name,
                handle: path.clone(),
            });
        } else {
            roots.push(PendingEntry::File {
                name,
                payload: path.clone(),
                size: metadata.len(),
            });
        }
    }
    Ok(roots)
}
