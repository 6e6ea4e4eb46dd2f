//! CTR_DRBG (NIST SP 800-90A, no derivation function) over AES-128/192/256.
//!
//! ```
//! use ctr_drbg::{CtrDrbg, KeySize};
//!
//! let mut drbg = CtrDrbg::new(KeySize::Aes128);
//! drbg.instantiate(&[0u8; 32], b"example").unwrap();
//! let bytes = drbg.generate(32, &[]).unwrap();
//! assert_eq!(bytes.len(), 32);
//! ```

pub mod drbg_params;
pub mod drbg_error;
pub mod block_cipher;

pub mod ctr_drbg;
pub mod entropy;
pub mod drbg_shared;
pub mod drbg_rng;

pub mod drbg_kat;

pub use block_cipher::{Aes, BlockCipher};
pub use ctr_drbg::CtrDrbg;
pub use drbg_error::DrbgError;
pub use drbg_kat::{parse_vectors, run_all, KatCase, KatError};
pub use drbg_params::{DrbgParams, KeySize};
pub use drbg_rng::DrbgRng;
pub use drbg_shared::SharedCtrDrbg;
pub use entropy::{EntropySource, FixedEntropy, OsEntropy};
