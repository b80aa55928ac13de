//! Source path normalization.
//!
//! Every path the engine stores or compares is a project-relative,
//! slash-based string with no leading `./` or `/`. Pure functions, no I/O.
//!
//! - [`normalize_source_path`]: canonical form of a raw path string
//! - [`join_import`]: resolve an import specifier against its importer
//! - [`relative_to`]: turn a watcher path into canonical form

use std::path::Path;

/// Normalize a source path lexically.
///
/// Backslashes become slashes, `.` segments and empty segments are dropped,
/// and `..` pops the previous segment when there is one.
///
/// # Example
/// ```ignore
/// assert_eq!(normalize_source_path("./pages//home.jsx"), "pages/home.jsx");
/// assert_eq!(normalize_source_path("pages/../components/a.jsx"), "components/a.jsx");
/// ```
pub fn normalize_source_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Resolve an import specifier relative to the file that imports it.
///
/// Specifiers starting with `/` are project-relative; everything else is
/// relative to the importer's directory.
pub fn join_import(importer: &str, specifier: &str) -> String {
    if specifier.starts_with('/') {
        return normalize_source_path(specifier);
    }

    let importer = normalize_source_path(importer);
    match importer.rsplit_once('/') {
        Some((dir, _)) => normalize_source_path(&format!("{dir}/{specifier}")),
        None => normalize_source_path(specifier),
    }
}

/// Express `path` relative to `root` in canonical form.
///
/// Returns `None` when `path` lies outside `root`.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let normalized = normalize_source_path(&relative.to_string_lossy());
    (!normalized.is_empty()).then_some(normalized)
}

/// Check whether a normalized path has a recognised page source extension.
pub fn is_page_source(path: &str) -> bool {
    matches!(
        path.rsplit_once('.').map(|(_, ext)| ext),
        Some("jsx" | "js" | "tsx" | "ts")
    )
}
