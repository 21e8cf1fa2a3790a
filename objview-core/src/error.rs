/// Error types for mesh import, editing and buffer management
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors surfaced by the importer, the geometry store and buffer devices.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The input file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be tokenized or a numeric field failed to parse.
    #[error("format error on line {line}: {message}")]
    Format { line: usize, message: String },

    /// A vertex slot was left unpopulated after unification.
    #[error("inconsistent face references: vertex {vertex} was never populated")]
    InconsistentFaceReferences { vertex: usize },

    /// A rotation axis or reflection normal has near-zero length.
    #[error("degenerate {what}: length is near zero")]
    DegenerateAxis { what: &'static str },

    /// The buffer device failed to allocate or upload.
    #[error("buffer device error: {0}")]
    Device(String),
}

impl MeshError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        MeshError::Format {
            line,
            message: message.into(),
        }
    }

    /// True for every error that means the input text was malformed.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            MeshError::Format { .. } | MeshError::InconsistentFaceReferences { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_grouping() {
        assert!(MeshError::format(3, "bad float").is_format_error());
        assert!(MeshError::InconsistentFaceReferences { vertex: 0 }.is_format_error());
        assert!(!MeshError::DegenerateAxis { what: "axis" }.is_format_error());
    }

    #[test]
    fn test_messages_carry_line() {
        let err = MeshError::format(7, "expected 3 fields");
        assert_eq!(err.to_string(), "format error on line 7: expected 3 fields");
    }
}
