//! Source-to-target transforms.
//!
//! A wrapper turns a parsed page into the entry file handed to the bundler:
//! it imports the page component and mounts it into the DOM.

use std::path::Path;

use crate::parse::{PageDocument, ParseError};

/// Turns a page into a bundler entry.
pub trait WebWrapper: Send + Sync {
    /// Produce the entry source for `page`, whose file lives at `page_path`.
    ///
    /// `origin` is the project-relative path, used in errors.
    fn apply(&self, page: &PageDocument, origin: &str, page_path: &Path) -> Result<String, ParseError>;
}

/// React client-side render.
///
/// The page is mounted into `#<key>_react_frame` with the props serialized in
/// `#orbit_manifest`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactCsrWrapper;

impl WebWrapper for ReactCsrWrapper {
    fn apply(&self, page: &PageDocument, origin: &str, page_path: &Path) -> Result<String, ParseError> {
        let name = page.name();
        let Some(first) = name.chars().next() else {
            return Err(ParseError::InvalidComponent {
                path: origin.to_string(),
                reason: "missing default export".into(),
            });
        };

        // React treats lowercase tags as DOM elements.
        if !first.is_uppercase() {
            return Err(ParseError::InvalidComponent {
                path: origin.to_string(),
                reason: format!("prefer capitalization for jsx components, got `{name}`"),
            });
        }

        let import = serde_json::to_string(&page_path.to_string_lossy())
            .map_err(|e| ParseError::InvalidComponent {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;

        Ok(format!(
            "import React from 'react'\n\
             import ReactDOM from 'react-dom'\n\
             import {name} from {import}\n\
             \n\
             ReactDOM.render(<{name} {{...JSON.parse(document.getElementById('orbit_manifest').textContent)}}/>, document.getElementById('{key}_react_frame'))\n",
            key = page.key(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::bundle_key;

    fn page(name: &str) -> PageDocument {
        PageDocument::new(name, Vec::new(), "")
    }

    #[test]
    fn mounts_component_into_keyed_frame() {
        let entry = ReactCsrWrapper
            .apply(&page("Home"), "pages/home.jsx", Path::new("/web/pages/home.jsx"))
            .unwrap();

        assert!(entry.contains(r#"import Home from "/web/pages/home.jsx""#));
        assert!(entry.contains("ReactDOM.render(<Home {...JSON.parse("));
        assert!(entry.contains(&format!("getElementById('{}_react_frame')", bundle_key("Home"))));
    }

    #[test]
    fn rejects_lowercase_component() {
        let err = ReactCsrWrapper
            .apply(&page("home"), "pages/home.jsx", Path::new("/web/pages/home.jsx"))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidComponent { ref path, .. } if path == "pages/home.jsx"));
    }

    #[test]
    fn rejects_empty_name() {
        let err = ReactCsrWrapper
            .apply(&page(""), "pages/x.jsx", Path::new("/web/pages/x.jsx"))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidComponent { .. }));
    }
}
