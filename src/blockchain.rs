// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// block construction and hashing, chain management and integrity validation.

pub mod core;
pub use self::core::*;
