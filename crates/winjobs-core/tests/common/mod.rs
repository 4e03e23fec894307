//! Shared helpers for scheduler integration tests.

#![allow(dead_code)]

pub mod observer;
pub mod probe;
