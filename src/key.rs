// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Replica identity and content hashing.
//!
//! Every replica is named by an ed25519 public key. The key only has to be
//! unique and totally ordered: it is the second half of every element id
//! and breaks ties between concurrent inserts with equal counters.

use blake3::Hasher;
use ed25519_dalek::SigningKey;
use rand_core::OsRng;

/// A public key, 32 bytes on the ed25519 curve.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyPub(pub [u8; 32]);

/// A blake3 hash, 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash(pub [u8; 32]);

/// Hash a message using blake3.
pub fn hash(message: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(message);
    let result = hasher.finalize();
    return Hash(*result.as_bytes());
}

impl KeyPub {
    /// A fresh random replica identity.
    ///
    /// Only the public half of the generated ed25519 key is kept.
    pub fn generate() -> KeyPub {
        let signing = SigningKey::generate(&mut OsRng);
        return KeyPub(signing.verifying_key().to_bytes());
    }

    /// Wrap raw key bytes, e.g. ones received from a peer.
    pub fn from_bytes(bytes: [u8; 32]) -> KeyPub {
        return KeyPub(bytes);
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        return &self.0;
    }
}

fn hex(bytes: &[u8]) -> String {
    return bytes.iter().map(|b| format!("{:02x}", b)).collect();
}

impl std::fmt::Debug for KeyPub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Eight hex digits are plenty to tell replicas apart in logs.
        return write!(f, "KeyPub({})", hex(&self.0[..4]));
    }
}

impl std::fmt::Display for KeyPub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", hex(&self.0));
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Hash({})", hex(&self.0));
    }
}
