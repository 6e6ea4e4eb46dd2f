// CTR_DRBG without derivation function (SP 800-90A, 10.2.1).
// State: Key (keylen bytes), V (16 bytes), reseed counter.
// Every public operation validates its inputs first and only then touches the
// working state, so an error never leaves a half-updated Key/V behind.

use core::fmt;

use log::{debug, trace, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::block_cipher::{Aes, BlockCipher};
use crate::drbg_error::DrbgError;
use crate::drbg_params::{Block, DrbgParams, KeySize, MAX_KEY_LEN, MAX_SEED_LEN, OUT_LEN};
use crate::entropy::EntropySource;

struct WorkingState {
    // only the first keylen bytes are live
    key: [u8; MAX_KEY_LEN],
    v: Block,
    reseed_counter: u64,
}

impl WorkingState {
    fn zero() -> Self {
        Self { key: [0u8; MAX_KEY_LEN], v: [0u8; OUT_LEN], reseed_counter: 0 }
    }
}

impl Drop for WorkingState {
    fn drop(&mut self) {
        self.key.zeroize();
        self.v.zeroize();
        self.reseed_counter = 0;
    }
}

enum DrbgState {
    Uninstantiated,
    Instantiated(WorkingState),
}

/// CTR_DRBG instance keyed by a block cipher `C` (AES by default).
///
/// A fresh instance is uninstantiated: [`reseed`](Self::reseed) and
/// [`generate`](Self::generate) fail with [`DrbgError::NotInstantiated`] until
/// [`instantiate`](Self::instantiate) succeeds.
///
/// ```
/// use ctr_drbg::{CtrDrbg, KeySize};
///
/// let mut drbg = CtrDrbg::new(KeySize::Aes256);
/// drbg.instantiate(&[0x42; 48], b"my app").unwrap();
/// let bytes = drbg.generate(32, &[]).unwrap();
/// assert_eq!(bytes.len(), 32);
/// ```
pub struct CtrDrbg<C: BlockCipher = Aes> {
    params: DrbgParams,
    cipher: C,
    state: DrbgState,
}

/// Big-endian increment of V modulo 2^128.
fn increment_counter(v: &mut Block) {
    for i in (0..OUT_LEN).rev() {
        let (nv, carry) = v[i].overflowing_add(1);
        v[i] = nv;
        if !carry {
            break;
        }
    }
}

/// Fill `out` with E(Key, V+1) || E(Key, V+2) || ..., truncating the last block.
fn keystream<C: BlockCipher>(cipher: &C, key: &[u8], v: &mut Block, out: &mut [u8]) {
    for chunk in out.chunks_mut(OUT_LEN) {
        increment_counter(v);
        let mut block = *v;
        cipher.encrypt_block(key, &mut block);
        chunk.copy_from_slice(&block[..chunk.len()]);
        block.zeroize();
    }
}

/// CTR_DRBG_Update: mix exactly seedlen bytes of `provided_data` into Key/V.
fn update<C: BlockCipher>(
    cipher: &C,
    params: &DrbgParams,
    state: &mut WorkingState,
    provided_data: &[u8],
) {
    let key_len = params.key_len();
    let seed_len = params.seed_len();
    debug_assert_eq!(provided_data.len(), seed_len);

    let mut temp = Zeroizing::new([0u8; MAX_SEED_LEN]);
    let temp = &mut temp[..seed_len];
    keystream(cipher, &state.key[..key_len], &mut state.v, temp);

    for (t, d) in temp.iter_mut().zip(provided_data) {
        *t ^= d;
    }

    // seedlen == keylen + outlen for every AES size, so the windows never overlap
    state.key[..key_len].copy_from_slice(&temp[..key_len]);
    state.v.copy_from_slice(&temp[seed_len - OUT_LEN..]);
}

/// Right-pad `input` with zero bytes to `seed_len`.
fn pad_to_seed_len(
    input: &[u8],
    seed_len: usize,
    too_long: fn(usize, usize) -> DrbgError,
) -> Result<Zeroizing<[u8; MAX_SEED_LEN]>, DrbgError> {
    if input.len() > seed_len {
        return Err(too_long(seed_len, input.len()));
    }
    let mut padded = Zeroizing::new([0u8; MAX_SEED_LEN]);
    padded[..input.len()].copy_from_slice(input);
    Ok(padded)
}

fn personalization_too_long(max: usize, got: usize) -> DrbgError {
    DrbgError::PersonalizationTooLong { max, got }
}

fn additional_input_too_long(max: usize, got: usize) -> DrbgError {
    DrbgError::AdditionalInputTooLong { max, got }
}

/// seed_material = entropy_input XOR pad(extra)
fn seed_material(
    entropy_input: &[u8],
    extra: &[u8],
    seed_len: usize,
    too_long: fn(usize, usize) -> DrbgError,
) -> Result<Zeroizing<[u8; MAX_SEED_LEN]>, DrbgError> {
    if entropy_input.len() != seed_len {
        return Err(DrbgError::InvalidEntropyLength { expected: seed_len, got: entropy_input.len() });
    }
    let mut material = pad_to_seed_len(extra, seed_len, too_long)?;
    for (m, e) in material.iter_mut().zip(entropy_input) {
        *m ^= e;
    }
    Ok(material)
}

impl CtrDrbg<Aes> {
    pub fn new(key_size: KeySize) -> Self {
        Self::with_params(DrbgParams::new(key_size))
    }

    pub fn with_params(params: DrbgParams) -> Self {
        Self::with_cipher(params, Aes)
    }
}

impl<C: BlockCipher> CtrDrbg<C> {
    pub fn with_cipher(params: DrbgParams, cipher: C) -> Self {
        Self { params, cipher, state: DrbgState::Uninstantiated }
    }

    pub fn params(&self) -> &DrbgParams {
        &self.params
    }

    pub fn is_instantiated(&self) -> bool {
        matches!(self.state, DrbgState::Instantiated(_))
    }

    /// Current Key, `None` while uninstantiated.
    pub fn key(&self) -> Option<&[u8]> {
        match &self.state {
            DrbgState::Instantiated(s) => Some(&s.key[..self.params.key_len()]),
            DrbgState::Uninstantiated => None,
        }
    }

    /// Current counter block V, `None` while uninstantiated.
    pub fn v(&self) -> Option<&Block> {
        match &self.state {
            DrbgState::Instantiated(s) => Some(&s.v),
            DrbgState::Uninstantiated => None,
        }
    }

    pub fn reseed_counter(&self) -> Option<u64> {
        match &self.state {
            DrbgState::Instantiated(s) => Some(s.reseed_counter),
            DrbgState::Uninstantiated => None,
        }
    }

    /// CTR_DRBG_Instantiate (10.2.1.3.1).
    ///
    /// `entropy_input` must be exactly seedlen bytes; `personalization` may be
    /// 0..=seedlen bytes. Any previous state is discarded.
    pub fn instantiate(&mut self, entropy_input: &[u8], personalization: &[u8]) -> Result<(), DrbgError> {
        let seed_len = self.params.seed_len();
        let material = seed_material(entropy_input, personalization, seed_len, personalization_too_long)?;

        let mut state = WorkingState::zero();
        update(&self.cipher, &self.params, &mut state, &material[..seed_len]);
        state.reseed_counter = 1;
        self.state = DrbgState::Instantiated(state);

        debug!(
            "ctr_drbg: instantiated AES-{} (personalization {} bytes)",
            self.params.key_size().bits(),
            personalization.len()
        );
        Ok(())
    }

    /// CTR_DRBG_Reseed (10.2.1.4.1). Mixes fresh entropy into the live Key/V.
    pub fn reseed(&mut self, entropy_input: &[u8], additional_input: &[u8]) -> Result<(), DrbgError> {
        let seed_len = self.params.seed_len();
        let state = match &mut self.state {
            DrbgState::Instantiated(s) => s,
            DrbgState::Uninstantiated => return Err(DrbgError::NotInstantiated),
        };
        let material = seed_material(entropy_input, additional_input, seed_len, additional_input_too_long)?;

        update(&self.cipher, &self.params, state, &material[..seed_len]);
        state.reseed_counter = 1;

        debug!(
            "ctr_drbg: reseeded AES-{} (additional input {} bytes)",
            self.params.key_size().bits(),
            additional_input.len()
        );
        Ok(())
    }

    /// CTR_DRBG_Generate (10.2.1.5.1), returning `requested_bytes` fresh bytes.
    pub fn generate(&mut self, requested_bytes: usize, additional_input: &[u8]) -> Result<Vec<u8>, DrbgError> {
        let mut out = vec![0u8; requested_bytes];
        self.fill_bytes(&mut out, additional_input)?;
        Ok(out)
    }

    /// One generate request writing `out.len()` bytes into `out`.
    ///
    /// Fails with [`DrbgError::ReseedRequired`] once the reseed interval is
    /// exhausted; nothing is written and the state is left untouched.
    pub fn fill_bytes(&mut self, out: &mut [u8], additional_input: &[u8]) -> Result<(), DrbgError> {
        let seed_len = self.params.seed_len();
        let key_len = self.params.key_len();
        let state = match &mut self.state {
            DrbgState::Instantiated(s) => s,
            DrbgState::Uninstantiated => return Err(DrbgError::NotInstantiated),
        };

        if state.reseed_counter > self.params.reseed_interval() {
            warn!(
                "ctr_drbg: generate refused, reseed counter {} exceeds interval {}",
                state.reseed_counter,
                self.params.reseed_interval()
            );
            return Err(DrbgError::ReseedRequired);
        }

        // all-zero block when no additional input was given
        let adin = pad_to_seed_len(additional_input, seed_len, additional_input_too_long)?;
        if !additional_input.is_empty() {
            update(&self.cipher, &self.params, state, &adin[..seed_len]);
        }

        keystream(&self.cipher, &state.key[..key_len], &mut state.v, out);

        update(&self.cipher, &self.params, state, &adin[..seed_len]);
        state.reseed_counter += 1;

        trace!(
            "ctr_drbg: generated {} bytes, reseed counter now {}",
            out.len(),
            state.reseed_counter
        );
        Ok(())
    }

    /// Pull seedlen bytes from `source` and instantiate with them.
    pub fn instantiate_from<E: EntropySource + ?Sized>(
        &mut self,
        source: &mut E,
        personalization: &[u8],
    ) -> Result<(), DrbgError> {
        let entropy = self.draw_entropy(source)?;
        self.instantiate(&entropy[..self.params.seed_len()], personalization)
    }

    /// Pull seedlen bytes from `source` and reseed with them.
    pub fn reseed_from<E: EntropySource + ?Sized>(
        &mut self,
        source: &mut E,
        additional_input: &[u8],
    ) -> Result<(), DrbgError> {
        if !self.is_instantiated() {
            return Err(DrbgError::NotInstantiated);
        }
        let entropy = self.draw_entropy(source)?;
        self.reseed(&entropy[..self.params.seed_len()], additional_input)
    }

    fn draw_entropy<E: EntropySource + ?Sized>(
        &self,
        source: &mut E,
    ) -> Result<Zeroizing<[u8; MAX_SEED_LEN]>, DrbgError> {
        let mut entropy = Zeroizing::new([0u8; MAX_SEED_LEN]);
        source.fill_entropy(&mut entropy[..self.params.seed_len()])?;
        Ok(entropy)
    }

    /// Wipe Key/V and return to the uninstantiated state.
    pub fn uninstantiate(&mut self) {
        self.state = DrbgState::Uninstantiated;
        debug!("ctr_drbg: uninstantiated AES-{}", self.params.key_size().bits());
    }
}

impl<C: BlockCipher> fmt::Debug for CtrDrbg<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtrDrbg")
            .field("params", &self.params)
            .field("reseed_counter", &self.reseed_counter())
            .finish_non_exhaustive()
    }
}
