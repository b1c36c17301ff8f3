//! Serve target module
//!
//! Resolves the file given on the command line into an absolute path with a
//! known extension. This happens once, before any listener is bound.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::http::mime;

/// The single file returned on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeTarget {
    path: PathBuf,
    extension: String,
}

/// Why a path cannot be served
#[derive(Debug)]
pub enum TargetError {
    /// The path could not be made absolute
    Unresolvable { path: PathBuf, source: io::Error },
    /// The file name has no extension, or an empty one
    MissingExtension { path: PathBuf },
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolvable { path, source } => {
                write!(f, "unable to resolve path '{}': {source}", path.display())
            }
            Self::MissingExtension { path } => write!(
                f,
                "unable to verify extension of '{}', valid extensions are .json, .html, and .*",
                path.display()
            ),
        }
    }
}

impl std::error::Error for TargetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unresolvable { source, .. } => Some(source),
            Self::MissingExtension { .. } => None,
        }
    }
}

impl ServeTarget {
    /// Resolve `path` against the current directory and check its extension
    ///
    /// The file does not have to exist yet; it is read again on every request.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, TargetError> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|source| TargetError::Unresolvable {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = absolute
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| TargetError::MissingExtension {
                path: absolute.clone(),
            })?;

        Ok(Self {
            path: absolute,
            extension,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extension without the leading dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn content_type(&self) -> &'static str {
        mime::get_content_type(Some(&self.extension))
    }
}
