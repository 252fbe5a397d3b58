//! Infrastructure

pub mod config;
