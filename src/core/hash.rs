//! Case-insensitive name hashing
//!
//! Every entry stores three independent hashes of its lower-cased name. The
//! first one places the entry in the hash index; all three together stand in
//! for the full name when deciding whether two names are equal.

pub const HASH_SEED0: u32 = 31;
pub const HASH_SEED1: u32 = 131;
pub const HASH_SEED2: u32 = 1313;

/// Hash a name with a single seed multiplier
///
/// Bytes are ASCII-lowercased before accumulation, so `"Readme.TXT"` and
/// `"readme.txt"` hash identically.
pub fn name_hash(name: &str, seed: u32) -> u32 {
    name.bytes().fold(0u32, |acc, byte| {
        acc.wrapping_mul(seed)
            .wrapping_add(byte.to_ascii_lowercase() as u32)
    })
}

/// The three hashes identifying a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NameHash {
    pub hash0: u32,
    pub hash1: u32,
    pub hash2: u32,
}

impl NameHash {
    pub fn of(name: &str) -> Self {
        NameHash {
            hash0: name_hash(name, HASH_SEED0),
            hash1: name_hash(name, HASH_SEED1),
            hash2: name_hash(name, HASH_SEED2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_hashes_to_zero() {
        assert_eq!(NameHash::of(""), NameHash::default());
    }

    #[test]
    fn test_accumulation() {
        // "ab" = 'a' * seed + 'b'
        assert_eq!(name_hash("ab", 31), 97 * 31 + 98);
        assert_eq!(name_hash("ab", 131), 97 * 131 + 98);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(NameHash::of("Textures/Grass.PNG"), NameHash::of("textures/grass.png"));
    }

    #[test]
    fn test_seeds_are_independent() {
        let h = NameHash::of("a.txt");
        assert_ne!(h.hash0, h.hash1);
        assert_ne!(h.hash1, h.hash2);
    }

    #[test]
    fn test_wrapping_on_long_names() {
        let long = "x".repeat(10_000);
        // Must not panic on overflow
        let _ = NameHash::of(&long);
    }
}
