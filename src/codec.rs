//! Transform between the website's public numeric ids and the private
//! mobile-API ids. The two namespaces differ by a fixed XOR seed, so the
//! same function maps in both directions.

use crate::constants::DEFAULT_ID_SEED;

#[derive(Debug, Clone, Copy)]
pub struct IdCodec {
    seed: u64,
}

impl IdCodec {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Map a public website id to its private-API counterpart.
    pub fn to_api_id(&self, id: u64) -> u64 {
        id ^ self.seed
    }

    /// Map a private-API id back to the public one. XOR is self-inverse, so
    /// this is the same operation under a second name for readable call sites.
    pub fn to_site_id(&self, id: u64) -> u64 {
        self.to_api_id(id)
    }
}

impl Default for IdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_ID_SEED)
    }
}

#[cfg(test)]
mod tests_codec {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let codec = IdCodec::default();
        for id in [0u64, 1, 561_495_556_818, u64::MAX, 42] {
            assert_eq!(codec.to_api_id(codec.to_api_id(id)), id);
            assert_eq!(codec.to_site_id(codec.to_api_id(id)), id);
        }
    }

    #[test]
    fn test_known_value() {
        let codec = IdCodec::new(0b1010);
        assert_eq!(codec.to_api_id(0b0110), 0b1100);
    }

    #[test]
    fn test_default_seed() {
        let codec = IdCodec::default();
        assert_eq!(codec.to_api_id(0), DEFAULT_ID_SEED);
    }

    #[test]
    fn test_distinct_seeds_disagree() {
        let a = IdCodec::new(7);
        let b = IdCodec::new(9);
        assert_ne!(a.to_api_id(100), b.to_api_id(100));
    }
}
