// rand_core front end: a DRBG bundled with its own entropy source.
// Requests larger than 64 KiB are split into several generate calls
// (SP 800-90A caps one CTR_DRBG request at 2^19 bits).

use log::debug;
use rand_core::{impls, CryptoRng, RngCore};

use crate::block_cipher::{Aes, BlockCipher};
use crate::ctr_drbg::CtrDrbg;
use crate::drbg_error::DrbgError;
use crate::drbg_params::{DrbgParams, KeySize};
use crate::entropy::{EntropySource, OsEntropy};

pub const MAX_REQUEST_BYTES: usize = 1 << 16;

/// Self-reseeding DRBG usable wherever a `rand_core` RNG is expected.
///
/// When the reseed interval runs out the generator pulls fresh entropy from
/// its source and retries the request once.
pub struct DrbgRng<E: EntropySource = OsEntropy, C: BlockCipher = Aes> {
    drbg: CtrDrbg<C>,
    entropy: E,
}

impl DrbgRng<OsEntropy, Aes> {
    /// AES CTR_DRBG seeded from the operating system.
    pub fn from_os(key_size: KeySize, personalization: &[u8]) -> Result<Self, DrbgError> {
        Self::new(DrbgParams::new(key_size), OsEntropy, personalization)
    }
}

impl<E: EntropySource> DrbgRng<E, Aes> {
    pub fn new(params: DrbgParams, entropy: E, personalization: &[u8]) -> Result<Self, DrbgError> {
        Self::with_drbg(CtrDrbg::with_params(params), entropy, personalization)
    }
}

impl<E: EntropySource, C: BlockCipher> DrbgRng<E, C> {
    /// Instantiate `drbg` from `entropy` and take ownership of both.
    pub fn with_drbg(mut drbg: CtrDrbg<C>, mut entropy: E, personalization: &[u8]) -> Result<Self, DrbgError> {
        drbg.instantiate_from(&mut entropy, personalization)?;
        Ok(Self { drbg, entropy })
    }

    pub fn drbg(&self) -> &CtrDrbg<C> {
        &self.drbg
    }

    /// Reseed now from the bundled source.
    pub fn reseed(&mut self, additional_input: &[u8]) -> Result<(), DrbgError> {
        self.drbg.reseed_from(&mut self.entropy, additional_input)
    }

    /// Fill `dest`, reseeding from the bundled source when required.
    pub fn generate_into(&mut self, dest: &mut [u8], additional_input: &[u8]) -> Result<(), DrbgError> {
        for chunk in dest.chunks_mut(MAX_REQUEST_BYTES) {
            match self.drbg.fill_bytes(chunk, additional_input) {
                Err(DrbgError::ReseedRequired) => {
                    debug!("drbg_rng: reseed interval reached, reseeding from entropy source");
                    self.reseed(&[])?;
                    self.drbg.fill_bytes(chunk, additional_input)?;
                }
                result => result?,
            }
        }
        Ok(())
    }
}

impl<E: EntropySource, C: BlockCipher> RngCore for DrbgRng<E, C> {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    /// # Panics
    ///
    /// Panics if the entropy source fails while a reseed is due.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(e) = self.try_fill_bytes(dest) {
            panic!("drbg_rng: {e}");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.generate_into(dest, &[]).map_err(rand_core::Error::new)
    }
}

impl<E: EntropySource, C: BlockCipher> CryptoRng for DrbgRng<E, C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::FixedEntropy;

    fn seeds(count: usize, seed_len: usize) -> Vec<u8> {
        (0..count * seed_len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn reseeds_automatically_at_interval() {
        let seed = seeds(2, 32);
        let params = DrbgParams::new(KeySize::Aes128).with_reseed_interval(2).unwrap();
        let mut rng = DrbgRng::new(params, FixedEntropy::new(seed.clone()), b"rng").unwrap();

        let mut manual = CtrDrbg::with_params(params);
        manual.instantiate(&seed[..32], b"rng").unwrap();
        let mut expected = manual.generate(24, &[]).unwrap();
        expected.extend(manual.generate(24, &[]).unwrap());
        manual.reseed(&seed[32..], &[]).unwrap();
        expected.extend(manual.generate(24, &[]).unwrap());

        let mut got = vec![0u8; 72];
        for chunk in got.chunks_mut(24) {
            rng.try_fill_bytes(chunk).unwrap();
        }
        assert_eq!(got, expected);
        assert_eq!(rng.drbg().reseed_counter(), Some(2));
    }

    #[test]
    fn exhausted_entropy_surfaces_as_error() {
        let params = DrbgParams::new(KeySize::Aes128).with_reseed_interval(1).unwrap();
        let mut rng = DrbgRng::new(params, FixedEntropy::new(seeds(1, 32)), &[]).unwrap();
        let mut buf = [0u8; 8];
        rng.try_fill_bytes(&mut buf).unwrap();
        assert!(rng.try_fill_bytes(&mut buf).is_err());
    }

    #[test]
    fn large_requests_are_split() {
        let seed = seeds(1, 48);
        let mut rng = DrbgRng::new(DrbgParams::new(KeySize::Aes256), FixedEntropy::new(seed), &[]).unwrap();
        let mut buf = vec![0u8; MAX_REQUEST_BYTES * 2 + 5];
        rng.fill_bytes(&mut buf);
        assert_eq!(rng.drbg().reseed_counter(), Some(4));
    }

    #[test]
    fn os_seeded_rng_produces_words() {
        let mut rng = DrbgRng::from_os(KeySize::Aes256, b"test").unwrap();
        let a = rng.next_u64();
        let b = rng.next_u64();
        assert_ne!(a, b);
        let _ = rng.next_u32();
    }
}
