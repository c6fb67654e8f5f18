//! Shared test helpers for `koshflow-core` integration tests.

#![allow(dead_code)]

pub mod session;
