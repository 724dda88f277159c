//! Seeded randomness for tests, benchmarks and timing measurements.
//!
//! Everything here is deterministic given a seed: a failing property test can
//! be replayed by constructing the same [`Source`].

pub mod source;

pub use source::Source;
