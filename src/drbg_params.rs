// CTR_DRBG parameter sets (SP 800-90A Table 3), no derivation function.
// seedlen = keylen + outlen for every AES key size.

use crate::drbg_error::DrbgError;

/// Block size of the underlying cipher in bytes (outlen).
pub const OUT_LEN: usize = 16;

pub const AES128_KEY_LEN: usize = 16;
pub const AES192_KEY_LEN: usize = 24;
pub const AES256_KEY_LEN: usize = 32;

/// Largest key / seed length over all supported key sizes.
pub const MAX_KEY_LEN: usize = AES256_KEY_LEN;
pub const MAX_SEED_LEN: usize = MAX_KEY_LEN + OUT_LEN;

/// Maximum number of generate requests between reseeds.
pub const MAX_RESEED_INTERVAL: u64 = 1 << 48;

pub type Block = [u8; OUT_LEN];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    pub const ALL: [KeySize; 3] = [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256];

    pub fn from_bits(bits: usize) -> Result<Self, DrbgError> {
        match bits {
            128 => Ok(KeySize::Aes128),
            192 => Ok(KeySize::Aes192),
            256 => Ok(KeySize::Aes256),
            _ => Err(DrbgError::InvalidConfiguration(format!(
                "unsupported key length: {bits} bits"
            ))),
        }
    }

    pub fn from_key_len(len: usize) -> Result<Self, DrbgError> {
        match len {
            AES128_KEY_LEN => Ok(KeySize::Aes128),
            AES192_KEY_LEN => Ok(KeySize::Aes192),
            AES256_KEY_LEN => Ok(KeySize::Aes256),
            _ => Err(DrbgError::InvalidConfiguration(format!(
                "unsupported key length: {len} bytes"
            ))),
        }
    }

    pub fn key_len(self) -> usize {
        match self {
            KeySize::Aes128 => AES128_KEY_LEN,
            KeySize::Aes192 => AES192_KEY_LEN,
            KeySize::Aes256 => AES256_KEY_LEN,
        }
    }

    pub fn seed_len(self) -> usize {
        self.key_len() + OUT_LEN
    }

    pub fn bits(self) -> usize {
        self.key_len() * 8
    }
}

/// Immutable parameters of one DRBG instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrbgParams {
    key_size: KeySize,
    reseed_interval: u64,
}

impl DrbgParams {
    pub fn new(key_size: KeySize) -> Self {
        Self { key_size, reseed_interval: MAX_RESEED_INTERVAL }
    }

    /// Lower the reseed interval. The standard caps it at 2^48 requests.
    pub fn with_reseed_interval(mut self, interval: u64) -> Result<Self, DrbgError> {
        if interval == 0 || interval > MAX_RESEED_INTERVAL {
            return Err(DrbgError::InvalidConfiguration(format!(
                "reseed interval must be in 1..=2^48, got {interval}"
            )));
        }
        self.reseed_interval = interval;
        Ok(self)
    }

    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    pub fn key_len(&self) -> usize {
        self.key_size.key_len()
    }

    pub fn seed_len(&self) -> usize {
        self.key_size.seed_len()
    }

    pub fn out_len(&self) -> usize {
        OUT_LEN
    }

    pub fn reseed_interval(&self) -> u64 {
        self.reseed_interval
    }
}

impl From<KeySize> for DrbgParams {
    fn from(key_size: KeySize) -> Self {
        DrbgParams::new(key_size)
    }
}
