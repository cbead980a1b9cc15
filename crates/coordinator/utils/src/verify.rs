//! Signature verification over BLAKE2b-256 digests.

use blake2::{Blake2b, Digest, digest::consts::U32};
use ed25519_dalek::Verifier as _;
use k256::ecdsa::signature::hazmat::PrehashVerifier as _;

use crate::{Curve, PubKey, Signature, VerifyError};

/// Checks that `signature` was produced by `key` over `message`.
///
/// The message is hashed with BLAKE2b-256 first. Ed25519 signs the digest as a message, the two
/// ECDSA curves sign it as a prehash with the signature laid out as `R ‖ S`. A signature with a
/// curve-specific prefix must match the key's curve; a generic `sig` signature is tried against
/// whatever curve the key uses.
///
/// # Errors
///
/// When the curves differ, when key or signature bytes are malformed, or when the signature does
/// not verify.
pub fn verify(message: &[u8], signature: &Signature, key: &PubKey) -> Result<(), VerifyError> {
    if let Some(curve) = signature.curve()
        && curve != key.curve()
    {
        return Err(VerifyError::CurveMismatch { signature: curve.into(), key: key.curve().into() });
    }

    let digest = Blake2b::<U32>::digest(message);

    match key.curve() {
        Curve::Ed25519 => {
            let key = <&[u8; 32]>::try_from(key.key()).map_err(|_| VerifyError::MalformedKey)?;
            let key = ed25519_dalek::VerifyingKey::from_bytes(key).map_err(|_| VerifyError::MalformedKey)?;
            let signature = ed25519_dalek::Signature::from_bytes(signature.as_bytes());

            key.verify(&digest, &signature).map_err(|_| VerifyError::Invalid)
        },
        Curve::Secp256k1 => {
            let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(key.key())
                .map_err(|_| VerifyError::MalformedKey)?;
            let signature = k256::ecdsa::Signature::from_slice(signature.as_bytes())
                .map_err(|_| VerifyError::MalformedSignature)?;

            key.verify_prehash(&digest, &signature).map_err(|_| VerifyError::Invalid)
        },
        Curve::P256 => {
            let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(key.key())
                .map_err(|_| VerifyError::MalformedKey)?;
            let signature = p256::ecdsa::Signature::from_slice(signature.as_bytes())
                .map_err(|_| VerifyError::MalformedSignature)?;

            key.verify_prehash(&digest, &signature).map_err(|_| VerifyError::Invalid)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "616e7920737472696e6720746861742077696c6c206265207369676e6564";
    const ED_KEY: &str = "edpkv13wgJVsEQGiQmw6M2gt9SCu55ajuZDiS9Xyxq375tBUtv8Fjh";
    const ED_SIG: &str = "edsigu7CP5oCEFGGJC1ixnUK85NkZ449coGeFpitcvC267r81jwoinkX5DKSrfemwJS97bmejSnkm5Nrfdmrsqpri4VCQrEs3Bz";

    #[test]
    fn verifies_known_ed25519_signature() {
        let message = const_hex::decode(MESSAGE).unwrap();
        let key: PubKey = ED_KEY.parse().unwrap();
        let signature: Signature = ED_SIG.parse().unwrap();

        verify(&message, &signature, &key).unwrap();

        let generic = Signature::new(None, *signature.as_bytes());
        verify(&message, &generic, &key).unwrap();

        assert!(matches!(verify(b"other message", &signature, &key), Err(VerifyError::Invalid)));
    }

    #[test]
    fn declared_curve_must_match_key() {
        let message = const_hex::decode(MESSAGE).unwrap();
        let key: PubKey = "sppk7d8CHGV9SCVDi9ciUVAyGTSLExWRSBAJN4vcFpqWEYbWf9ZNr8D".parse().unwrap();
        let signature: Signature = ED_SIG.parse().unwrap();

        assert!(matches!(
            verify(&message, &signature, &key),
            Err(VerifyError::CurveMismatch { signature: "ed25519", key: "secp256k1" })
        ));
    }

    fn raw(bytes: &[u8]) -> [u8; 64] {
        let mut raw = [0; 64];
        raw.copy_from_slice(bytes);
        raw
    }

    #[test]
    fn ecdsa_signatures_verify_over_the_digest() {
        use k256::ecdsa::signature::hazmat::PrehashSigner;

        let message = b"payload";
        let digest = Blake2b::<U32>::digest(message);

        let secp = k256::ecdsa::SigningKey::from_slice(&[0x11; 32]).unwrap();
        let secp_key =
            PubKey::new(Curve::Secp256k1, secp.verifying_key().to_sec1_bytes().to_vec()).unwrap();
        let secp_sig: k256::ecdsa::Signature = secp.sign_prehash(&digest).unwrap();
        let secp_sig = Signature::new(Some(Curve::Secp256k1), raw(&secp_sig.to_bytes()));
        verify(message, &secp_sig, &secp_key).unwrap();

        let p256 = p256::ecdsa::SigningKey::from_slice(&[0x22; 32]).unwrap();
        let p256_key = PubKey::new(Curve::P256, p256.verifying_key().to_sec1_bytes().to_vec()).unwrap();
        let p256_sig: p256::ecdsa::Signature = p256.sign_prehash(&digest).unwrap();
        let p256_sig = Signature::new(Some(Curve::P256), raw(&p256_sig.to_bytes()));
        verify(message, &p256_sig, &p256_key).unwrap();

        assert!(matches!(verify(b"tampered", &p256_sig, &p256_key), Err(VerifyError::Invalid)));
    }
}
