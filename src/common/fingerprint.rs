//! Deterministic hash helpers for correlating predictions in logs.
//!
//! Not a security primitive: FNV-1a over 32 bits.

/// Extremely small non-cryptographic hash over request inputs.
#[derive(Copy, Clone, Debug)]
pub struct Fingerprint(u32);

impl Fingerprint {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(2_166_136_261)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ u32::from(*b)).wrapping_mul(16_777_619);
        }
    }

    /// Feed every value's little-endian bit pattern.
    pub fn update_values(&mut self, values: &[f64]) {
        for v in values {
            self.update(&v.to_le_bytes());
        }
    }

    /// Finalise the hash and return a 32-bit value.
    pub fn finish32(&self) -> u32 {
        self.0
    }

    /// Finalise the hash and return an 8-character lowercase hex string.
    pub fn finish_hex(&self) -> String {
        format!("{:08x}", self.0)
    }

    /// One-shot fingerprint of a value slice.
    pub fn of_values(values: &[f64]) -> String {
        let mut fp = Self::new();
        fp.update_values(values);
        fp.finish_hex()
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}
