// Single-block cipher seam used by the DRBG.
// The DRBG supplies all chaining through its counter, so the cipher only ever
// sees one 16-byte block at a time.

use aes::{Aes128Enc, Aes192Enc, Aes256Enc};
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, KeyInit};

use crate::drbg_params::{Block, AES128_KEY_LEN, AES192_KEY_LEN, AES256_KEY_LEN};

/// Keyed single-block encryption: `block = E(key, block)`.
///
/// Implementations must not keep state between calls: the DRBG re-keys after
/// every update, so the expanded key is built from `key` on each call.
///
/// The DRBG only ever passes keys of its configured key length. An
/// implementation may panic when called directly with a key length it does
/// not support.
pub trait BlockCipher {
    fn encrypt_block(&self, key: &[u8], block: &mut Block);
}

/// AES-128/192/256 selected by key length.
///
/// # Panics
///
/// [`BlockCipher::encrypt_block`] panics if `key` is not 16, 24 or 32 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aes;

fn encrypt_with<E: KeyInit + BlockEncrypt>(key: &[u8], block: &mut Block) {
    let cipher = E::new(GenericArray::from_slice(key));
    cipher.encrypt_block(GenericArray::from_mut_slice(block));
}

impl BlockCipher for Aes {
    fn encrypt_block(&self, key: &[u8], block: &mut Block) {
        match key.len() {
            AES128_KEY_LEN => encrypt_with::<Aes128Enc>(key, block),
            AES192_KEY_LEN => encrypt_with::<Aes192Enc>(key, block),
            AES256_KEY_LEN => encrypt_with::<Aes256Enc>(key, block),
            len => panic!("AES key must be 16, 24 or 32 bytes, got {len}"),
        }
    }
}

impl<C: BlockCipher + ?Sized> BlockCipher for &C {
    fn encrypt_block(&self, key: &[u8], block: &mut Block) {
        (**self).encrypt_block(key, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAINTEXT: &str = "00112233445566778899aabbccddeeff";

    fn fips197(key_len: usize) -> String {
        let key: Vec<u8> = (0..key_len as u8).collect();
        let mut block: Block = hex::decode(PLAINTEXT).unwrap().try_into().unwrap();
        Aes.encrypt_block(&key, &mut block);
        hex::encode(block)
    }

    // FIPS 197 Appendix C example vectors.
    #[test]
    fn aes128_matches_fips197() {
        assert_eq!(fips197(16), "69c4e0d86a7b0430d8cdb78070b4c55a");
    }

    #[test]
    fn aes192_matches_fips197() {
        assert_eq!(fips197(24), "dda97ca4864cdfe06eaf70a0ec0d7191");
    }

    #[test]
    fn aes256_matches_fips197() {
        assert_eq!(fips197(32), "8ea2b7ca516745bfeafc49904b496089");
    }

    #[test]
    #[should_panic(expected = "AES key must be 16, 24 or 32 bytes, got 20")]
    fn unsupported_key_length_panics() {
        let mut block = [0u8; 16];
        Aes.encrypt_block(&[0u8; 20], &mut block);
    }
}
