//! `pagepack graph`: dump the dependency graph without bundling.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::common::discover_pages;
use crate::config::PackConfig;
use crate::graph::{ParserQuery, SourceMap};
use crate::log;
use crate::logger::Logger;
use crate::parse::JsxParser;

/// Parse every page and write the source map to `out`, or to
/// `<out_dir>/dependency.graph`.
pub fn write_graph(config: &PackConfig, out: Option<&Path>, logger: &Logger) -> Result<PathBuf> {
    let pages = discover_pages(config)?;
    let page_count = pages.len();

    let query = ParserQuery::uncached(Arc::new(JsxParser::new(&config.build.web_dir)), pages);
    let map = SourceMap::build(&query, "").context("failed to build dependency graph")?;
    for (importer, imported) in map.tree().cycles() {
        log!(logger, "graph"; "import cycle: {importer} -> {imported}");
    }

    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.build.out_dir().join("dependency.graph"));
    map.write(&out)?;

    log!(
        logger,
        "graph";
        "{} dependencies of {} pages written to {}",
        map.len(),
        page_count,
        out.display()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_of_jsx_project() {
        let temp = tempfile::TempDir::new().unwrap();
        let web = temp.path();
        std::fs::create_dir_all(web.join("pages")).unwrap();
        std::fs::create_dir_all(web.join("components")).unwrap();
        std::fs::write(
            web.join("pages/home.jsx"),
            "import React from 'react'\nimport Nav from '../components/nav'\nexport default function Home() {}\n",
        )
        .unwrap();
        std::fs::write(
            web.join("pages/about.jsx"),
            "import Nav from '../components/nav.jsx'\nexport default function About() {}\n",
        )
        .unwrap();
        std::fs::write(
            web.join("components/nav.jsx"),
            "import './nav.css'\nexport default function Nav() {}\n",
        )
        .unwrap();

        let mut config = PackConfig::default();
        config.build.web_dir = web.to_path_buf();

        let out = write_graph(&config, None, &Logger::silent()).unwrap();
        assert_eq!(out, web.join(".orbit/dependency.graph"));
        assert_eq!(
            std::fs::read_to_string(out).unwrap(),
            "mode: graph\n\
             components/nav.css pages/about.jsx\n\
             components/nav.css pages/home.jsx\n\
             components/nav.jsx pages/about.jsx\n\
             components/nav.jsx pages/home.jsx\n"
        );
    }
}
