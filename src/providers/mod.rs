//! External collaborators.
//!
//! The reclaimer never inspects processes or memory itself. It consumes an
//! immutable snapshot from a [`ProcessProvider`], counters from a
//! [`MemoryProbe`], and sends kills through a [`Terminator`].
//!
//! - [`traits`]: the seams and their error type
//! - [`memory`]: in-memory implementations for tests and simulation

pub mod memory;
pub mod traits;

pub use memory::{FixedProbe, RecordingTerminator, StaticProvider};
pub use traits::{MemoryProbe, MemoryStats, ProcessProvider, TerminateError, Terminator};
