//! Command handlers.

pub(crate) mod snapshot;
