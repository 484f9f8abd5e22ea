//! Input-rejection errors.
//!
//! Every public test validates its inputs before any computation starts,
//! so an `Err` never carries a partial result. Numerically infeasible
//! exact computations are *not* errors: they report "unavailable"
//! internally and the test falls back to an asymptotic method.

/// Error type for malformed input or configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum TestError {
    /// A sample contains NaN or ±∞.
    NonFiniteValue {
        /// Name of the offending sample (`"x"`, `"y"`, `"z"`), or of a
        /// derived one such as `"x - y"` when a difference overflows.
        sample: &'static str,
        /// Index of the first non-finite value.
        index: usize,
    },
    /// A sample is smaller than the test requires.
    InsufficientData {
        sample: &'static str,
        required: usize,
        actual: usize,
    },
    /// Paired samples have different lengths.
    LengthMismatch { x: usize, y: usize },
    /// A configuration value is out of range or not finite.
    InvalidParameter(String),
    /// `PValueMethod::Estimate` was requested without a random source.
    MissingRandomSource,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::NonFiniteValue { sample, index } => {
                write!(f, "sample {sample} has a non-finite value at index {index}")
            }
            TestError::InsufficientData {
                sample,
                required,
                actual,
            } => write!(
                f,
                "sample {sample} requires at least {required} values, got {actual}"
            ),
            TestError::LengthMismatch { x, y } => {
                write!(f, "paired samples differ in length: {x} != {y}")
            }
            TestError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            TestError::MissingRandomSource => {
                write!(f, "p-value estimation requires a random source")
            }
        }
    }
}

impl std::error::Error for TestError {}

/// Convenience alias used by every test entry point.
pub type Result<T> = std::result::Result<T, TestError>;

/// Rejects samples that are too small or contain non-finite values.
pub(crate) fn check_sample(sample: &'static str, data: &[f64], required: usize) -> Result<()> {
    if data.len() < required {
        return Err(TestError::InsufficientData {
            sample,
            required,
            actual: data.len(),
        });
    }
    match data.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(TestError::NonFiniteValue { sample, index }),
        None => Ok(()),
    }
}

/// Rejects a non-finite location shift.
pub(crate) fn check_mu(mu: f64) -> Result<()> {
    if mu.is_finite() {
        Ok(())
    } else {
        Err(TestError::InvalidParameter(format!(
            "location shift mu must be finite, got {mu}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_sample_accepts_finite() {
        assert!(check_sample("x", &[1.0, 2.0], 2).is_ok());
    }

    #[test]
    fn test_check_sample_size() {
        assert_eq!(
            check_sample("y", &[1.0], 2),
            Err(TestError::InsufficientData {
                sample: "y",
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_check_sample_nan_position() {
        assert_eq!(
            check_sample("x", &[1.0, 2.0, f64::NAN, f64::INFINITY], 1),
            Err(TestError::NonFiniteValue {
                sample: "x",
                index: 2
            })
        );
    }

    #[test]
    fn test_check_mu() {
        assert!(check_mu(0.5).is_ok());
        assert!(matches!(
            check_mu(f64::NAN),
            Err(TestError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_display_messages() {
        let e = TestError::LengthMismatch { x: 3, y: 4 };
        assert_eq!(e.to_string(), "paired samples differ in length: 3 != 4");
        assert_eq!(
            TestError::MissingRandomSource.to_string(),
            "p-value estimation requires a random source"
        );
    }
}
