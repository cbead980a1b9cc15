use blake2::{Blake2b, Digest, digest::consts::U32};
use ed25519_dalek::Signer as _;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use tezos_multisig_coordinator_utils::{Address, Curve, PubKey, Signature};

/// A deterministic key pair on one of the three curves.
///
/// Signatures follow the node's scheme: the message is hashed with BLAKE2b-256, Ed25519 signs
/// the digest, the ECDSA curves sign it as a prehash.
pub enum TestSigner {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
    P256(p256::ecdsa::SigningKey),
}

impl TestSigner {
    /// An Ed25519 key whose secret is `seed` repeated.
    pub fn ed25519(seed: u8) -> Self {
        Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]))
    }

    /// A Secp256k1 key whose secret is `seed` repeated; `seed` must be non-zero.
    pub fn secp256k1(seed: u8) -> Self {
        Self::Secp256k1(k256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap())
    }

    /// A P-256 key whose secret is `seed` repeated; `seed` must be non-zero.
    pub fn p256(seed: u8) -> Self {
        Self::P256(p256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap())
    }

    pub fn pub_key(&self) -> PubKey {
        match self {
            Self::Ed25519(key) => PubKey::new(Curve::Ed25519, key.verifying_key().to_bytes().to_vec()),
            Self::Secp256k1(key) => {
                PubKey::new(Curve::Secp256k1, key.verifying_key().to_sec1_bytes().to_vec())
            },
            Self::P256(key) => PubKey::new(Curve::P256, key.verifying_key().to_sec1_bytes().to_vec()),
        }
        .unwrap()
    }

    /// The implicit account of this key.
    pub fn address(&self) -> Address {
        self.pub_key().address()
    }

    /// Signs `message` with a curve-specific signature prefix.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let digest = Blake2b::<U32>::digest(message);

        let (curve, bytes) = match self {
            Self::Ed25519(key) => (Curve::Ed25519, key.sign(&digest).to_bytes()),
            Self::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature = key.sign_prehash(&digest).unwrap();
                (Curve::Secp256k1, raw(&signature.to_bytes()))
            },
            Self::P256(key) => {
                let signature: p256::ecdsa::Signature = key.sign_prehash(&digest).unwrap();
                (Curve::P256, raw(&signature.to_bytes()))
            },
        };

        Signature::new(Some(curve), bytes)
    }
}

fn raw(bytes: &[u8]) -> [u8; 64] {
    let mut raw = [0; 64];
    raw.copy_from_slice(bytes);
    raw
}
