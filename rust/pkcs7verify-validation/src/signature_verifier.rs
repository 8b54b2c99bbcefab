// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signature verification against a certificate's public key.
//!
//! The message is hashed once with the declared digest algorithm and the
//! prehash is handed to the per-algorithm verifier. Every failure, including
//! an unusable key or a signature that does not decode, is reported as
//! `false`; the reason is only logged.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs7verify_common::{Certificate, DigestAlgorithm, EcCurve, PublicKeyAlgorithm, SignatureAlgorithm};
use rsa::pkcs8::DecodePublicKey as _;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::PrehashVerifier;

use crate::digest::digest;

const LOG_TARGET: &str = "pkcs7verify::signature";

/// Verify `signature` over `message` with the key in `signer`.
///
/// Returns `false` when the signature algorithm's key type differs from the
/// certificate's key, or when the algorithm is bound to a digest other than
/// `digest_algorithm`.
pub fn verify_signature(
    signer: &Certificate,
    algorithm: SignatureAlgorithm,
    digest_algorithm: DigestAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> bool {
    let key_algorithm = signer.public_key_algorithm();
    if algorithm.key_type() != key_algorithm.key_type() {
        tracing::trace!(
            target: LOG_TARGET,
            ?algorithm,
            ?key_algorithm,
            "signature algorithm does not fit the signer key"
        );
        return false;
    }
    if let Some(bound) = algorithm.digest() {
        if bound != digest_algorithm {
            tracing::trace!(
                target: LOG_TARGET,
                ?bound,
                declared = ?digest_algorithm,
                "signature algorithm digest disagrees with digestAlgorithm"
            );
            return false;
        }
    }

    let prehash = digest(digest_algorithm, message);
    let result = match key_algorithm {
        PublicKeyAlgorithm::Rsa => verify_rsa_pkcs1(signer.spki_der(), digest_algorithm, &prehash, signature),
        PublicKeyAlgorithm::Ec(EcCurve::P256) => verify_ecdsa_p256(signer.spki_der(), &prehash, signature),
        PublicKeyAlgorithm::Ec(EcCurve::P384) => verify_ecdsa_p384(signer.spki_der(), &prehash, signature),
        PublicKeyAlgorithm::Ec(EcCurve::P521) => verify_ecdsa_p521(signer.spki_der(), &prehash, signature),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::trace!(target: LOG_TARGET, subject = %signer.subject(), error = %e, "signature rejected");
            false
        }
    }
}

/// Check that `issuer`'s key signed `subject`'s TBSCertificate.
pub fn verify_certificate_signature(subject: &Certificate, issuer: &Certificate) -> bool {
    let algorithm = subject.signature_algorithm();
    let Some(digest_algorithm) = algorithm.digest() else {
        return false;
    };
    verify_signature(issuer, algorithm, digest_algorithm, subject.tbs_der(), subject.signature())
}

/// RSASSA-PKCS1-v1_5 over a precomputed digest.
fn verify_rsa_pkcs1(
    spki: &[u8],
    digest_algorithm: DigestAlgorithm,
    prehash: &[u8],
    sig: &[u8],
) -> Result<(), String> {
    let key = RsaPublicKey::from_public_key_der(spki).map_err(|e| format!("bad RSA public key: {e}"))?;
    let scheme = match digest_algorithm {
        DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    };
    key.verify(scheme, prehash, sig)
        .map_err(|_| "RSA signature verification failed".to_string())
}

fn verify_ecdsa_p256(spki: &[u8], prehash: &[u8], sig: &[u8]) -> Result<(), String> {
    let pk = p256::PublicKey::from_public_key_der(spki).map_err(|e| format!("bad P-256 public key: {e}"))?;
    let ep = pk.to_encoded_point(false);
    let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
        .map_err(|e| format!("bad P-256 public key: {e}"))?;

    // CMS carries ECDSA signatures as DER `SEQUENCE { r INTEGER, s INTEGER }`.
    let signature = p256::ecdsa::Signature::from_der(sig).map_err(|e| format!("bad P-256 signature: {e}"))?;
    vk.verify_prehash(prehash, &signature)
        .map_err(|_| "P-256 signature verification failed".to_string())
}

fn verify_ecdsa_p384(spki: &[u8], prehash: &[u8], sig: &[u8]) -> Result<(), String> {
    let pk = p384::PublicKey::from_public_key_der(spki).map_err(|e| format!("bad P-384 public key: {e}"))?;
    let ep = pk.to_encoded_point(false);
    let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
        .map_err(|e| format!("bad P-384 public key: {e}"))?;
    let signature = p384::ecdsa::Signature::from_der(sig).map_err(|e| format!("bad P-384 signature: {e}"))?;
    vk.verify_prehash(prehash, &signature)
        .map_err(|_| "P-384 signature verification failed".to_string())
}

fn verify_ecdsa_p521(spki: &[u8], prehash: &[u8], sig: &[u8]) -> Result<(), String> {
    let pk = p521::PublicKey::from_public_key_der(spki).map_err(|e| format!("bad P-521 public key: {e}"))?;
    let ep = pk.to_encoded_point(false);
    let vk = p521::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
        .map_err(|e| format!("bad P-521 public key: {e}"))?;
    let signature = p521::ecdsa::Signature::from_der(sig).map_err(|e| format!("bad P-521 signature: {e}"))?;
    vk.verify_prehash(prehash, &signature)
        .map_err(|_| "P-521 signature verification failed".to_string())
}
