//! Random sources for secrets and client identities.
//!
//! The daemon holds a single [`SystemSecretSource`] for its whole lifetime.
//! Tests substitute a [`SequenceSecretSource`] to get reproducible secrets.

use std::sync::Mutex;

use ring::rand::{SecureRandom, SystemRandom};

use crate::error::GateError;

/// Produces numeric secrets and raw identity bytes.
pub trait SecretSource: Send + Sync {
    /// Draw a value uniformly from `[0, bound)`.
    ///
    /// `bound` must be non-zero.
    fn next_below(&self, bound: u32) -> Result<u32, GateError>;

    /// Fill `dest` with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), GateError>;
}

/// Secret source backed by the operating system CSPRNG.
pub struct SystemSecretSource {
    rng: SystemRandom,
}

impl SystemSecretSource {
    /// Create the source and make sure the OS generator is usable.
    pub fn new() -> Result<Self, GateError> {
        let rng = SystemRandom::new();
        let mut probe = [0u8; 8];
        rng.fill(&mut probe).map_err(|_| GateError::Random {
            message: "system random generator unavailable".to_string(),
        })?;
        Ok(Self { rng })
    }

    fn next_u64(&self) -> Result<u64, GateError> {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}

impl SecretSource for SystemSecretSource {
    fn next_below(&self, bound: u32) -> Result<u32, GateError> {
        if bound == 0 {
            return Err(GateError::Random {
                message: "secret bound must be non-zero".to_string(),
            });
        }
        let bound = u64::from(bound);
        // Reject the tail of the u64 range so the modulo stays unbiased.
        let zone = u64::MAX - (u64::MAX % bound);
        loop {
            let v = self.next_u64()?;
            if v < zone {
                return Ok((v % bound) as u32);
            }
        }
    }

    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), GateError> {
        self.rng.fill(dest).map_err(|_| GateError::Random {
            message: "failed to fill random buffer".to_string(),
        })
    }
}

/// Deterministic source that cycles through a fixed list of values.
///
/// Each value is reduced modulo the requested bound. Byte requests consume
/// one value and repeat its big-endian bytes across the buffer.
#[derive(Debug)]
pub struct SequenceSecretSource {
    values: Vec<u32>,
    next: Mutex<usize>,
}

impl SequenceSecretSource {
    /// Create a source that yields `values` in order, wrapping around.
    ///
    /// An empty list behaves like `[0]`.
    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        let mut values = values.into();
        if values.is_empty() {
            values.push(0);
        }
        Self {
            values,
            next: Mutex::new(0),
        }
    }

    fn take(&self) -> u32 {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let value = self.values[*next % self.values.len()];
        *next += 1;
        value
    }
}

impl SecretSource for SequenceSecretSource {
    fn next_below(&self, bound: u32) -> Result<u32, GateError> {
        if bound == 0 {
            return Err(GateError::Random {
                message: "secret bound must be non-zero".to_string(),
            });
        }
        Ok(self.take() % bound)
    }

    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), GateError> {
        let bytes = self.take().to_be_bytes();
        for (i, b) in dest.iter_mut().enumerate() {
            *b = bytes[i % bytes.len()];
        }
        Ok(())
    }
}
