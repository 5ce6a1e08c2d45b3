//! Error types for the annotation engine.
//!
//! Geometry and invalid-commit errors are recovered inside the engine.
//! Persistence and precondition errors are reported to the user through a
//! [`Notifier`](crate::backend::Notifier).

use thiserror::Error;

/// Boolean-algebra or simplification failure on degenerate input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Input contained NaN or infinite coordinates
    #[error("Non-finite coordinate in ring {ring}")]
    NonFinite {
        /// Index of the offending ring
        ring: usize,
    },

    /// Boundary edges could not be linked into closed rings
    #[error("Open contour at ({x}, {y})")]
    OpenContour {
        /// X coordinate where the walk got stuck
        x: f64,
        /// Y coordinate where the walk got stuck
        y: f64,
    },

    /// Input is degenerate in a way the engine refuses to process
    #[error("Degenerate geometry: {message}")]
    Degenerate {
        /// Description of the problem
        message: String,
    },
}

impl GeometryError {
    /// Create a degenerate-geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::Degenerate {
            message: message.into(),
        }
    }
}

/// A commit would produce a shape violating the minimum-vertex invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidCommitError {
    /// Nothing to commit
    #[error("Nothing to commit")]
    Empty,

    /// A ring has fewer than three vertices
    #[error("Ring {ring} has {count} vertices, at least 3 required")]
    TooFewVertices {
        /// Index of the ring
        ring: usize,
        /// Number of vertices found
        count: usize,
    },

    /// A ring has zero area or non-finite vertices
    #[error("Ring {ring} is degenerate")]
    Degenerate {
        /// Index of the ring
        ring: usize,
    },

    /// A ring crosses itself
    #[error("Ring {ring} intersects itself")]
    SelfIntersecting {
        /// Index of the ring
        ring: usize,
    },
}

/// The asynchronous create/update call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The backend rejected the annotation
    #[error("Annotation rejected: {reason}")]
    Rejected {
        /// Reason given by the backend
        reason: String,
    },

    /// Transport or backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl PersistenceError {
    /// Create a rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// A tool was activated without the configuration it needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// The tool creates annotations but no class is selected
    #[error("Tool '{tool}' requires a selected annotation class")]
    NoClassSelected {
        /// Name of the tool
        tool: String,
    },

    /// The selected class does not support the tool's shape type
    #[error("Class '{class}' does not support shape type '{shape}'")]
    UnsupportedShapeType {
        /// Name of the class
        class: String,
        /// Shape type required by the tool
        shape: String,
    },

    /// No tool with this name is registered
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),
}

/// Interpolation between two keyframes failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    /// Algorithm identifier is not supported
    #[error("Unsupported interpolation algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    /// The two keyframes hold different shape variants
    #[error("Cannot interpolate between '{prev}' and '{next}'")]
    VariantMismatch {
        /// Type of the previous keyframe
        prev: &'static str,
        /// Type of the next keyframe
        next: &'static str,
    },
}

/// Shape data could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The type tag names no known shape variant
    #[error("Unknown shape type '{0}'")]
    UnknownType(String),

    /// A vertex index is out of range for the shape
    #[error("Vertex {index} out of range for {shape} with {count} vertices")]
    VertexOutOfRange {
        /// Shape type name
        shape: &'static str,
        /// Requested index
        index: usize,
        /// Number of vertices
        count: usize,
    },
}

/// Any error produced by the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    InvalidCommit(#[from] InvalidCommitError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = InvalidCommitError::TooFewVertices { ring: 1, count: 2 };
        assert_eq!(err.to_string(), "Ring 1 has 2 vertices, at least 3 required");

        let err = InterpolationError::UnsupportedAlgorithm("cubic".into());
        assert_eq!(err.to_string(), "Unsupported interpolation algorithm 'cubic'");
    }

    #[test]
    fn test_engine_error_is_transparent() {
        let err: EngineError = PersistenceError::rejected("quota").into();
        assert_eq!(err.to_string(), "Annotation rejected: quota");
    }
}
