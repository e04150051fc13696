//! Cache Key Codec
//!
//! Maps a requested file name plus free-form query parameters onto a canonical
//! cache key, and parses such a key back into its parts.
//!
//! ## Key Grammar
//! `fileName?width=W&height=H&dpi=D`
//!
//! - Only whitelisted parameters are part of the key, always in whitelist order.
//! - Every whitelisted parameter is present. Missing or invalid values become `0`.
//! - Requests that differ only in parameter order or in unknown parameters share a key.

pub mod codec;

pub use codec::{CacheKey, KeyError, ParsedKey, generate, is_valid_file_name, parse};

#[cfg(test)]
mod tests;
