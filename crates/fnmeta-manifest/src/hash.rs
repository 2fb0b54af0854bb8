//! Stable function identity
//!
//! The identity is a 32-bit fingerprint of (function name, script file, entry point) that
//! must stay bit-for-bit identical across builds and platforms. It is a correlation id, not a
//! security token; collisions are accepted.

const FIELD_SEED: u32 = 23;
const COMBINED_SEED: u32 = 17;
const MULTIPLIER: u32 = 31;

/// Deterministic function id hasher
pub struct FunctionIdentityHasher;

impl FunctionIdentityHasher {
    /// Hash of one string over its UTF-16 code units
    pub fn stable_hash(value: &str) -> u32 {
        value.encode_utf16().fold(FIELD_SEED, |hash, unit| {
            hash.wrapping_mul(MULTIPLIER).wrapping_add(u32::from(unit))
        })
    }

    /// Combined hash of the present fields, `None` when every field is absent
    pub fn hash(
        function_name: Option<&str>,
        script_file: Option<&str>,
        entry_point: Option<&str>,
    ) -> Option<u32> {
        let fields = [function_name, script_file, entry_point];
        if fields.iter().all(Option::is_none) {
            return None;
        }

        Some(fields.iter().flatten().fold(COMBINED_SEED, |hash, field| {
            hash.wrapping_mul(MULTIPLIER)
                .wrapping_add(Self::stable_hash(field))
        }))
    }

    /// Decimal rendering used in emitted metadata
    pub fn function_id(
        function_name: Option<&str>,
        script_file: Option<&str>,
        entry_point: Option<&str>,
    ) -> Option<String> {
        Self::hash(function_name, script_file, entry_point).map(|hash| hash.to_string())
    }
}
