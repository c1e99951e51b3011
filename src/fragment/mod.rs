//! Fragment primitives consumed by the assembly pipeline.
//!
//! This module collects the domain types describing a single piece of an
//! event as it arrives from an upstream producer. Each sub-module focuses on
//! one concept so the types stay small and easy to audit.

pub mod error;
pub mod header;
pub mod id;
pub mod index;
pub mod packet;

pub use error::FragmentError;
pub use header::FragmentHeader;
pub use id::EventId;
pub use index::FragmentIndex;
pub use packet::Fragment;

#[cfg(test)]
mod tests;
