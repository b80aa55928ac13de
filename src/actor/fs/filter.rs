use std::path::{Path, PathBuf};

use crate::config::PackConfig;
use crate::utils::path::{normalize_source_path, relative_to};

/// Turns watcher paths into project-relative paths worth a change request.
///
/// Build output, dependency folders and editor artifacts never reach the
/// session.
pub(super) struct WatchFilter {
    root: PathBuf,
    /// Fragments as `/fragment`, matched against `/relative/path`.
    ignore: Vec<String>,
    /// Root-relative directories whose whole subtree is dropped.
    output_dirs: Vec<String>,
}

impl WatchFilter {
    pub(super) fn new(root: PathBuf, ignore: &[String]) -> Self {
        let ignore = ignore
            .iter()
            .map(|f| f.trim_start_matches("./").trim_start_matches('/'))
            .filter(|f| !f.is_empty())
            .map(|f| format!("/{f}"))
            .collect();
        Self {
            root,
            ignore,
            output_dirs: Vec::new(),
        }
    }

    /// Filter for `root` that also drops the configured build output and
    /// dependency folders, wherever they are.
    pub(super) fn for_project(root: PathBuf, config: &PackConfig) -> Self {
        let build = &config.build;
        let output_dirs = [&build.out_dir, &build.node_modules]
            .into_iter()
            .filter_map(|dir| {
                if dir.is_absolute() {
                    relative_to(&build.web_dir, dir)
                } else {
                    Some(normalize_source_path(&dir.to_string_lossy()))
                }
            })
            .filter(|dir| !dir.is_empty())
            .collect();

        Self {
            output_dirs,
            ..Self::new(root, &config.dev.ignore)
        }
    }

    pub(super) fn root(&self) -> &Path {
        &self.root
    }

    /// Project-relative path of `path`, or `None` when it is filtered out.
    pub(super) fn accept(&self, path: &Path) -> Option<String> {
        if is_temp_file(path) {
            return None;
        }

        let relative = relative_to(&self.root, path)?;
        let in_output = self.output_dirs.iter().any(|dir| {
            relative
                .strip_prefix(dir.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        });
        if in_output {
            return None;
        }

        let probe = format!("/{relative}");
        if self.ignore.iter().any(|f| probe.contains(f.as_str())) {
            return None;
        }
        Some(relative)
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
