//! Webpack process bundler.

use std::path::{Path, PathBuf};

use super::{BundleError, BundleRequest, BundleResource, Bundler, BundlerMode};
use crate::logger::Logger;
use crate::utils::exec::Cmd;
use crate::{debug, log};

/// Runs `node <node_modules>/.bin/webpack --config <file>` per page.
#[derive(Debug, Clone)]
pub struct WebpackBundler {
    /// Working directory of the bundler process.
    web_dir: PathBuf,
    /// Generated entries, configs and bundles.
    out_dir: PathBuf,
    node_modules: PathBuf,
    mode: BundlerMode,
    logger: Logger,
}

impl WebpackBundler {
    pub fn new(
        web_dir: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        node_modules: impl Into<PathBuf>,
        mode: BundlerMode,
        logger: Logger,
    ) -> Self {
        Self {
            web_dir: web_dir.into(),
            out_dir: out_dir.into(),
            node_modules: node_modules.into(),
            mode,
            logger,
        }
    }

    fn webpack_bin(&self) -> PathBuf {
        self.node_modules.join(".bin").join("webpack")
    }

    /// Webpack configuration for one page entry.
    fn config_source(&self, entry: &Path, bundle_key: &str) -> String {
        let entry = js_string(&entry.to_string_lossy());
        let output = js_string(&self.out_dir.join("dist").to_string_lossy());
        let filename = js_string(&format!("{bundle_key}.js"));

        format!(
            r#"module.exports = {{
  entry: [{entry}],
  mode: '{mode}',
  output: {{
    path: {output},
    filename: {filename},
  }},
  module: {{
    rules: [
      {{
        test: /\.(js|jsx|ts|tsx)$/,
        exclude: /node_modules/,
        use: {{
          loader: 'babel-loader',
          options: {{ presets: ['@babel/preset-env', '@babel/preset-react'] }},
        }},
      }},
      {{ test: /\.css$/, use: ['style-loader', 'css-loader'] }},
    ],
  }},
  resolve: {{ extensions: ['.js', '.jsx', '.ts', '.tsx'] }},
}}
"#,
            mode = self.mode,
        )
    }
}

impl Bundler for WebpackBundler {
    fn setup(&self, request: &BundleRequest) -> Result<BundleResource, BundleError> {
        let entry_path = self.out_dir.join(format!("{}.entry.jsx", request.bundle_key));
        let config_path = self.out_dir.join(format!("{}.config.js", request.bundle_key));
        let config_source = self.config_source(&entry_path, &request.bundle_key);

        Ok(BundleResource {
            entry_path,
            config_path,
            config_source,
        })
    }

    fn bundle(&self, resource: &BundleResource) -> Result<(), BundleError> {
        let cmd = Cmd::new("node")
            .arg(self.webpack_bin())
            .arg("--config")
            .arg(&resource.config_path)
            .cwd(&self.web_dir);
        debug!(self.logger, "pack"; "{}", cmd.display());

        let command_line = cmd.display();
        cmd.run(true).map(|_| ()).map_err(|source| {
            log!(self.logger, "error"; "invalid pack: \"{command_line}\"");
            BundleError::Process {
                config: resource.config_path.clone(),
                source,
            }
        })
    }
}

/// Quote a string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("'{value}'"))
}
