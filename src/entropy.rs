// Entropy sources feeding instantiate / reseed.
// The DRBG does not judge entropy quality: a source hands over exactly the
// number of bytes asked for, or fails.

use log::debug;
use zeroize::Zeroizing;

use crate::drbg_error::DrbgError;

pub trait EntropySource {
    /// Fill `dest` completely with full-entropy bytes.
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), DrbgError>;
}

impl<E: EntropySource + ?Sized> EntropySource for &mut E {
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), DrbgError> {
        (**self).fill_entropy(dest)
    }
}

/// Operating system CSPRNG via `getrandom`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), DrbgError> {
        getrandom::getrandom(dest).map_err(|e| DrbgError::Entropy(e.to_string()))?;
        debug!("entropy: drew {} bytes from the OS", dest.len());
        Ok(())
    }
}

/// Replays a fixed byte string, front to back. Used for known-answer runs.
pub struct FixedEntropy {
    bytes: Zeroizing<Vec<u8>>,
    pos: usize,
}

impl FixedEntropy {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Zeroizing::new(bytes), pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl EntropySource for FixedEntropy {
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), DrbgError> {
        if dest.len() > self.remaining() {
            return Err(DrbgError::Entropy(format!(
                "fixed entropy exhausted: need {} bytes, {} left",
                dest.len(),
                self.remaining()
            )));
        }
        dest.copy_from_slice(&self.bytes[self.pos..self.pos + dest.len()]);
        self.pos += dest.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_entropy_replays_in_order() {
        let mut source = FixedEntropy::new((0..10).collect());
        let mut a = [0u8; 4];
        let mut b = [0u8; 6];
        source.fill_entropy(&mut a).unwrap();
        source.fill_entropy(&mut b).unwrap();
        assert_eq!(a, [0, 1, 2, 3]);
        assert_eq!(b, [4, 5, 6, 7, 8, 9]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn fixed_entropy_refuses_short_reads() {
        let mut source = FixedEntropy::new(vec![1, 2, 3]);
        let mut dest = [0u8; 4];
        assert!(matches!(source.fill_entropy(&mut dest), Err(DrbgError::Entropy(_))));
        assert_eq!(source.remaining(), 3);
        assert_eq!(dest, [0u8; 4]);
    }

    #[test]
    fn os_entropy_fills_buffer() {
        let mut a = [0u8; 48];
        let mut b = [0u8; 48];
        OsEntropy.fill_entropy(&mut a).unwrap();
        OsEntropy.fill_entropy(&mut b).unwrap();
        assert_ne!(a, b);
    }
}
