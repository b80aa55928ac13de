//! Component packing.
//!
//! A [`Component`] is one root page and its compiled bundle. Packing runs the
//! [`PackPipeline`] (parse, wrap, bundler setup, write, bundle) for a path;
//! [`JsPacker`] fans the pipeline out over many pages with rayon and
//! [`repack_many`] does the same for already-registered components.
//!
//! The bootstrap result is frozen into a [`ComponentRegistry`].

mod component;
mod hook;
mod packer;
mod pipeline;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use component::Component;
pub use hook::{NoopHook, PackHook, TimingHook, with_hook};
pub use packer::{ComponentList, JsPacker, PartialPack, Packer, read_bundle_keys, repack_many};
pub use pipeline::{PackPipeline, PackedPage};
pub use registry::ComponentRegistry;

use thiserror::Error;

use crate::bundler::BundleError;
use crate::parse::ParseError;

/// Packing failures.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to parse `{path}`")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to bundle `{path}`")]
    Bundle {
        path: String,
        #[source]
        source: BundleError,
    },

    #[error("packing `{0}` was cancelled")]
    Cancelled(String),

    #[error("{} components failed to pack", .0.len())]
    Many(Vec<PackError>),
}

impl PackError {
    /// Source path the failure belongs to, if it is a single failure.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Parse { path, .. } | Self::Bundle { path, .. } | Self::Cancelled(path) => Some(path),
            Self::Many(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled(_) => true,
            Self::Many(errors) => errors.iter().all(Self::is_cancelled),
            _ => false,
        }
    }

    /// One line per failure, including the underlying cause.
    pub fn detail(&self) -> String {
        match self {
            Self::Many(errors) => errors.iter().map(Self::detail).collect::<Vec<_>>().join("\n"),
            other => {
                let mut line = other.to_string();
                let mut source = std::error::Error::source(other);
                while let Some(cause) = source {
                    line.push_str(": ");
                    line.push_str(&cause.to_string());
                    source = cause.source();
                }
                line
            }
        }
    }

    /// Collapse a list of failures.
    pub(crate) fn collect(mut errors: Vec<PackError>) -> Result<(), PackError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Many(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_keeps_single_error_flat() {
        assert!(PackError::collect(Vec::new()).is_ok());

        let err = PackError::collect(vec![PackError::Cancelled("a.jsx".into())]).unwrap_err();
        assert_eq!(err.path(), Some("a.jsx"));

        let err = PackError::collect(vec![
            PackError::Cancelled("a.jsx".into()),
            PackError::Cancelled("b.jsx".into()),
        ])
        .unwrap_err();
        assert!(matches!(err, PackError::Many(ref v) if v.len() == 2));
        assert!(err.is_cancelled());
    }

    #[test]
    fn detail_includes_cause_chain() {
        let err = PackError::Parse {
            path: "pages/home.jsx".into(),
            source: ParseError::InvalidUtf8("pages/home.jsx".into()),
        };
        assert_eq!(
            err.detail(),
            "failed to parse `pages/home.jsx`: `pages/home.jsx` is not valid UTF-8"
        );
    }
}
