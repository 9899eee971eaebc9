//! Test utilities: an in-memory editor host.
