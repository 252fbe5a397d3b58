//! Domain model

pub mod mail;
pub mod text;
