//! Regex-based JSX page parser.
//!
//! Extracts the default-exported component name and the module specifiers
//! of `import`/`export ... from` statements. Local specifiers (`./`, `../`,
//! `/`) are resolved to project-relative paths; extensionless ones are
//! probed against the file system.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{ImportDependency, ImportKind, PageDocument, ParseError, SourceParser};
use crate::utils::path::{join_import, normalize_source_path};

static RE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*(?:import|export)\s+(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"\n]+)['"]"#)
        .unwrap()
});

static RE_DEFAULT_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)export\s+default\s+(?:(?:async\s+)?function\*?|class)\s+([A-Za-z_$][\w$]*)|export\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$",
    )
    .unwrap()
});

/// Suffixes tried, in order, for extensionless local imports.
const RESOLVE_SUFFIXES: &[&str] = &[
    ".jsx",
    ".js",
    ".tsx",
    ".ts",
    "/index.jsx",
    "/index.js",
    "/index.tsx",
    "/index.ts",
];

/// Parser for JSX-family page sources rooted at a project directory.
#[derive(Debug, Clone)]
pub struct JsxParser {
    root: PathBuf,
}

impl JsxParser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse already-loaded source text for `path`.
    pub fn parse_source(&self, path: &str, source: &str) -> PageDocument {
        let imports = RE_IMPORT
            .captures_iter(source)
            .filter_map(|caps| {
                let statement = caps.get(0)?.as_str().trim().to_string();
                let specifier = caps.get(1)?.as_str();
                Some(self.classify_import(path, statement, specifier))
            })
            .collect();

        let name = default_export_name(source).unwrap_or_else(|| default_page_name(path));
        PageDocument::new(name, imports, source)
    }

    fn classify_import(&self, importer: &str, statement: String, specifier: &str) -> ImportDependency {
        if !is_local_specifier(specifier) {
            return ImportDependency {
                statement,
                path: specifier.to_string(),
                kind: ImportKind::External,
            };
        }

        ImportDependency {
            statement,
            path: self.resolve_local(importer, specifier),
            kind: ImportKind::Local,
        }
    }

    /// Resolve a local specifier, probing extensions when it has none.
    fn resolve_local(&self, importer: &str, specifier: &str) -> String {
        let joined = join_import(importer, specifier);
        if self.root.join(&joined).is_file() || has_extension(&joined) {
            return joined;
        }

        RESOLVE_SUFFIXES
            .iter()
            .map(|suffix| format!("{joined}{suffix}"))
            .find(|candidate| self.root.join(candidate).is_file())
            .unwrap_or(joined)
    }
}

impl SourceParser for JsxParser {
    fn parse(&self, path: &str) -> Result<PageDocument, ParseError> {
        let path = normalize_source_path(path);
        let full = self.root.join(&path);
        let bytes = std::fs::read(&full).map_err(|source| ParseError::Io {
            path: full.clone(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8(path.clone()))?;

        Ok(self.parse_source(&path, &source))
    }
}

fn is_local_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

fn has_extension(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.contains('.') && !file.ends_with('.')
}

fn default_export_name(source: &str) -> Option<String> {
    let caps = RE_DEFAULT_EXPORT.captures(source)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Fallback name from the file stem: `about-us_page.jsx` -> `AboutUsPage`.
fn default_page_name(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);

    stem.split(['_', ' ', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
