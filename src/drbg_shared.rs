// One DRBG instance shared between threads.
// Every operation reads and rewrites the whole working state, so the lock is
// held for the full call; there is nothing finer-grained to lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::block_cipher::{Aes, BlockCipher};
use crate::ctr_drbg::CtrDrbg;
use crate::drbg_error::DrbgError;
use crate::drbg_params::{DrbgParams, KeySize};

/// Cloneable handle to a mutex-guarded [`CtrDrbg`].
pub struct SharedCtrDrbg<C: BlockCipher = Aes> {
    inner: Arc<Mutex<CtrDrbg<C>>>,
}

impl<C: BlockCipher> Clone for SharedCtrDrbg<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl SharedCtrDrbg<Aes> {
    pub fn new(key_size: KeySize) -> Self {
        Self::from_drbg(CtrDrbg::new(key_size))
    }

    pub fn with_params(params: DrbgParams) -> Self {
        Self::from_drbg(CtrDrbg::with_params(params))
    }
}

impl<C: BlockCipher> SharedCtrDrbg<C> {
    pub fn from_drbg(drbg: CtrDrbg<C>) -> Self {
        Self { inner: Arc::new(Mutex::new(drbg)) }
    }

    // State is only written after validation, so a poisoned lock still guards
    // a consistent DRBG.
    fn lock(&self) -> MutexGuard<'_, CtrDrbg<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn instantiate(&self, entropy_input: &[u8], personalization: &[u8]) -> Result<(), DrbgError> {
        self.lock().instantiate(entropy_input, personalization)
    }

    pub fn reseed(&self, entropy_input: &[u8], additional_input: &[u8]) -> Result<(), DrbgError> {
        self.lock().reseed(entropy_input, additional_input)
    }

    pub fn generate(&self, requested_bytes: usize, additional_input: &[u8]) -> Result<Vec<u8>, DrbgError> {
        self.lock().generate(requested_bytes, additional_input)
    }

    pub fn fill_bytes(&self, out: &mut [u8], additional_input: &[u8]) -> Result<(), DrbgError> {
        self.lock().fill_bytes(out, additional_input)
    }

    pub fn uninstantiate(&self) {
        self.lock().uninstantiate()
    }

    pub fn is_instantiated(&self) -> bool {
        self.lock().is_instantiated()
    }

    pub fn reseed_counter(&self) -> Option<u64> {
        self.lock().reseed_counter()
    }

    /// Run several operations under one lock, e.g. reseed-then-generate.
    pub fn with<R>(&self, f: impl FnOnce(&mut CtrDrbg<C>) -> R) -> R {
        f(&mut *self.lock())
    }
}
