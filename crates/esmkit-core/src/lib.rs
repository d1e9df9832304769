//! Core vocabulary for esmkit.
//!
//! This crate defines the tags, dialects, header flags and error types shared by
//! the record codec and its front ends. It performs no I/O of its own.

pub mod error;
pub mod types;

pub use error::{DecodeError, EncodeError, Error, LengthRule};
pub use types::{flags, Dialect, Tag};
