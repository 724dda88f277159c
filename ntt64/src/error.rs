use std::fmt;

/// Errors reported at the boundary of the engine.
///
/// The transforms themselves never return errors: these are produced by the
/// conversion and validation helpers that callers run before handing data to
/// the hot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NttError {
    /// A layer index outside `0..=7`.
    InvalidLayer(usize),
    /// A coefficient that is not reduced modulo the layer's modulus.
    CoefficientOutOfRange { index: usize, value: u32, modulus: u32 },
    /// A backend preference string that names no known backend.
    InvalidPreference(String),
    /// The modular inverse of zero was requested.
    ZeroInverse,
}

impl fmt::Display for NttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NttError::InvalidLayer(i) => write!(f, "invalid layer index {i}: expected 0..=7"),
            NttError::CoefficientOutOfRange { index, value, modulus } => {
                write!(f, "coefficient {index} = {value} is not reduced modulo {modulus}")
            }
            NttError::InvalidPreference(s) => {
                write!(f, "invalid backend preference {s:?}: expected auto, scalar, avx2 or neon")
            }
            NttError::ZeroInverse => write!(f, "zero has no modular inverse"),
        }
    }
}

impl std::error::Error for NttError {}
