use thiserror::Error;

#[derive(Debug, Error)]
pub enum RnnError {
    #[error("shape mismatch in {op}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("index ({row}, {col}) out of range for {height}x{width} buffer")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RnnError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for RnnError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RnnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = RnnError::ShapeMismatch {
            op: "add",
            expected: (2, 3),
            actual: (3, 2),
        };
        assert_eq!(e.to_string(), "shape mismatch in add: expected (2, 3), got (3, 2)");

        let e = RnnError::IndexOutOfRange {
            row: 4,
            col: 0,
            height: 2,
            width: 2,
        };
        assert_eq!(e.to_string(), "index (4, 0) out of range for 2x2 buffer");

        let e = RnnError::invalid("fan_in", "must be at least 2");
        assert_eq!(e.to_string(), "invalid fan_in: must be at least 2");

        let e = RnnError::Parse {
            line: 7,
            reason: "bad value".into(),
        };
        assert_eq!(e.to_string(), "line 7: bad value");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: RnnError = io.into();
        assert!(matches!(e, RnnError::Io(_)));
    }
}
