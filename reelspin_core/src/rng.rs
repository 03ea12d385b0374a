use hmac::{Hmac, Mac};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Source of uniform floats in [0,1). Everything random in a spin goes through this.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

// Deterministic RNG using provably-fair HMAC construction
// server_seed (secret) + client_seed + nonce -> HMAC-SHA256 -> bytes -> floats in [0,1)

pub type HmacSha256 = Hmac<Sha256>;

pub fn derive_hash_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

/// Lazily expands a byte buffer into floats: successive big-endian u32 chunks over 2^32,
/// rehashing the buffer with SHA-256 when it runs dry.
#[derive(Debug, Clone)]
pub struct FairStream {
    buffer: Vec<u8>,
    cursor: usize,
}

impl FairStream {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buffer: bytes.to_vec(),
            cursor: 0,
        }
    }
}

impl RandomSource for FairStream {
    fn next_f64(&mut self) -> f64 {
        if self.cursor + 4 > self.buffer.len() {
            self.buffer = Sha256::digest(&self.buffer).to_vec();
            self.cursor = 0;
        }
        let chunk = &self.buffer[self.cursor..self.cursor + 4];
        let v = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        self.cursor += 4;
        (v as f64) / (u32::MAX as f64 + 1.0)
    }
}

/// 32 random bytes from the OS-seeded thread rng, hex encoded.
pub fn random_server_seed() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

pub fn derive_floats(hmac_bytes: &[u8], count: usize) -> Vec<f64> {
    let mut stream = FairStream::from_bytes(hmac_bytes);
    (0..count).map(|_| stream.next_f64()).collect()
}

#[derive(Debug, Clone)]
pub struct ProvablyFairRng {
    pub server_seed: String, // secret
    pub client_seed: String,
    pub nonce: u64,
}

impl ProvablyFairRng {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>, nonce: u64) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
            nonce,
        }
    }

    pub fn server_seed_hash_hex(&self) -> String {
        derive_hash_hex(self.server_seed.as_bytes())
    }

    /// `HMAC-SHA256(server_seed, "client_seed:nonce")`, the first block of a spin's stream.
    pub fn hmac_bytes(&self) -> [u8; 32] {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.server_seed.as_bytes())
            .expect("HMAC takes keys of any length");
        mac.update(self.client_seed.as_bytes());
        mac.update(b":");
        mac.update(self.nonce.to_string().as_bytes());
        let mut block = [0u8; 32];
        block.copy_from_slice(&mac.finalize().into_bytes());
        block
    }

    pub fn stream(&self) -> FairStream {
        FairStream::from_bytes(&self.hmac_bytes())
    }

    pub fn next_floats(&self, count: usize) -> Vec<f64> {
        derive_floats(&self.hmac_bytes(), count)
    }

    /// Nonce and stream the next spin would use, without advancing.
    pub fn peek_spin(&self) -> (u64, FairStream) {
        let next = Self {
            nonce: self.nonce + 1,
            ..self.clone()
        };
        (next.nonce, next.stream())
    }

    /// Advances the nonce and returns the stream for the new spin.
    pub fn next_spin(&mut self) -> (u64, FairStream) {
        let (nonce, stream) = self.peek_spin();
        self.nonce = nonce;
        (nonce, stream)
    }
}

/// Non-reproducible play backed by `rand`.
#[derive(Debug, Clone)]
pub struct EntropySource {
    inner: StdRng,
}

impl EntropySource {
    pub fn from_os() -> Self {
        Self {
            inner: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for EntropySource {
    fn next_f64(&mut self) -> f64 {
        self.inner.random::<f64>()
    }
}

/// Replays a fixed list of floats, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "scripted source needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
