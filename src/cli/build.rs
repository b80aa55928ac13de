//! `pagepack build`: pack every page once.

use std::time::Instant;

use anyhow::{Context, Result, anyhow};

use super::common::{discover_pages, keys_file, pack_pipeline, packer};
use crate::config::PackConfig;
use crate::core::CancelToken;
use crate::log;
use crate::logger::Logger;
use crate::pack::Packer;

/// Pack all pages and write `<out_dir>/components.audit` and the bundle keys.
pub fn build_pages(config: &PackConfig, cancel: CancelToken, logger: &Logger) -> Result<()> {
    let pages = discover_pages(config)?;
    log!(logger, "build"; "packing {} pages ({})", pages.len(), config.build.mode);

    let start = Instant::now();
    let (_, pipeline) = pack_pipeline(config, cancel, logger);
    let components = packer(config, pipeline, logger)
        .pack_many(&pages)
        .map_err(|e| anyhow!("{e}\n{}", e.source.detail()))?;

    let audit = config.build.out_dir().join("components.audit");
    components
        .write(&audit)
        .with_context(|| format!("failed to write `{}`", audit.display()))?;
    let keys = keys_file(config);
    components
        .write_keys(&keys)
        .with_context(|| format!("failed to write `{}`", keys.display()))?;

    log!(
        logger,
        "build";
        "packed {} components in {:.1}s",
        components.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
