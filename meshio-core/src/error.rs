//! Error types for mesh reading and writing

use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by the STL and OBJ codecs
#[derive(Debug, Error)]
pub enum MeshError {
    /// The file (or its parent directory) does not exist
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Any other open/read/write failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Grammar violation, unexpected token or truncated record
    #[error("format error: {0}")]
    Format(String),

    /// Unrecognized selector passed by the caller
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the OBJ/MTL parser
    #[error("OBJ parser error: {0}")]
    Obj(tobj::LoadError),
}

impl MeshError {
    /// Classify an I/O error raised while working on `path`.
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            MeshError::FileNotFound(path.to_path_buf())
        } else {
            MeshError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        MeshError::Format(msg.into())
    }
}

impl From<Infallible> for MeshError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Result type for mesh operations
pub type Result<T> = std::result::Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_classified() {
        let err = MeshError::io(
            Path::new("/missing/cube.stl"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(
            matches!(err, MeshError::FileNotFound(ref p) if p == Path::new("/missing/cube.stl"))
        );

        let err = MeshError::io(
            Path::new("/locked/cube.stl"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, MeshError::Io { .. }));
        assert!(err.to_string().contains("/locked/cube.stl"));
    }
}
