//! Subcommands of the `esmkit` binary.

pub(crate) mod inspect;
pub(crate) mod roundtrip;
pub(crate) mod validate;
