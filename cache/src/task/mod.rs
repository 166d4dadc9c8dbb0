//! Background tasks for the cache. Currently only the janitor, which runs
//! periodic reap passes.

pub(crate) mod janitor;
