//! Shared setup for the subcommands.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use jwalk::WalkDir;

use crate::bundler::{ReactCsrWrapper, WebpackBundler};
use crate::config::PackConfig;
use crate::core::CancelToken;
use crate::log;
use crate::logger::Logger;
use crate::pack::{JsPacker, PackPipeline, TimingHook, read_bundle_keys};
use crate::parse::{JsxParser, SourceParser};
use crate::utils::path::{is_page_source, relative_to};

/// The JSX parser and the webpack pipeline for this project.
pub fn pack_pipeline(
    config: &PackConfig,
    cancel: CancelToken,
    logger: &Logger,
) -> (Arc<dyn SourceParser>, Arc<PackPipeline>) {
    let build = &config.build;
    let parser: Arc<dyn SourceParser> = Arc::new(JsxParser::new(&build.web_dir));
    let bundler = Arc::new(WebpackBundler::new(
        &build.web_dir,
        build.out_dir(),
        build.node_modules(),
        build.mode,
        logger.clone(),
    ));
    let pipeline = Arc::new(PackPipeline::new(
        &build.web_dir,
        parser.clone(),
        Arc::new(ReactCsrWrapper),
        bundler,
        cancel,
    ));
    (parser, pipeline)
}

/// Where bundle keys are kept between runs.
pub fn keys_file(config: &PackConfig) -> PathBuf {
    config.build.out_dir().join("bundle.keys")
}

/// Packer over `pipeline` that reuses the bundle keys of the previous run.
pub fn packer(config: &PackConfig, pipeline: Arc<PackPipeline>, logger: &Logger) -> JsPacker {
    let packer = JsPacker::new(pipeline).with_hook(Arc::new(TimingHook::new(logger.clone())));
    let path = keys_file(config);
    match read_bundle_keys(&path) {
        Ok(keys) => packer.with_cached_keys(keys),
        Err(e) if e.kind() == ErrorKind::NotFound => packer,
        Err(e) => {
            log!(logger, "pack"; "ignoring `{}`: {e}", path.display());
            packer
        }
    }
}

/// Every page source under `pages_dir`, relative to `web_dir`, sorted.
pub fn discover_pages(config: &PackConfig) -> Result<Vec<String>> {
    let pages_dir = config.build.pages_dir();
    if !pages_dir.is_dir() {
        bail!("pages directory `{}` does not exist", pages_dir.display());
    }
    Ok(collect_pages(&config.build.web_dir, &pages_dir))
}

fn collect_pages(web_dir: &Path, pages_dir: &Path) -> Vec<String> {
    let mut pages: Vec<String> = WalkDir::new(pages_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| relative_to(web_dir, &e.path()))
        .filter(|p| is_page_source(p))
        .collect();
    pages.sort();
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::testing::Fixture;
    use crate::pack::Packer;

    #[test]
    fn test_collect_pages_relative_to_web_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let pages = temp.path().join("pages");
        std::fs::create_dir_all(pages.join("blog")).unwrap();
        std::fs::write(pages.join("home.jsx"), "").unwrap();
        std::fs::write(pages.join("blog/post.tsx"), "").unwrap();
        std::fs::write(pages.join("style.css"), "").unwrap();

        assert_eq!(
            collect_pages(temp.path(), &pages),
            vec!["pages/blog/post.tsx", "pages/home.jsx"]
        );
    }

    #[test]
    fn test_packer_reuses_keys_of_previous_run() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = PackConfig::default();
        config.build.web_dir = temp.path().to_path_buf();

        let fx = Fixture::new();
        fx.parser.set_page("pages/home.jsx", "Home", &[]);
        let home = packer(&config, fx.pipeline.clone(), &Logger::silent())
            .pack_single("pages/home.jsx")
            .unwrap();
        assert_eq!(home.bundle_key(), crate::utils::hash::bundle_key("Home"));

        std::fs::create_dir_all(config.build.out_dir()).unwrap();
        std::fs::write(keys_file(&config), "keys: bundles\npages/home.jsx pinned\n").unwrap();
        let home = packer(&config, fx.pipeline.clone(), &Logger::silent())
            .pack_single("pages/home.jsx")
            .unwrap();
        assert_eq!(home.bundle_key(), "pinned");
    }
}
