//! Built-in rule packs.

pub mod python;
pub mod react;
pub mod security;
pub mod universal;
