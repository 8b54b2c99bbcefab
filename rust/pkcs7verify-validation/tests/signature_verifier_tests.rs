// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signature checks against generated EC and RSA keys.

use pkcs7verify_common::{Certificate, DigestAlgorithm, SignatureAlgorithm};
use pkcs7verify_test_utils::{Identity, RsaIdentity, TestSigner};
use pkcs7verify_validation::{verify_certificate_signature, verify_signature};

const ECDSA_SHA256: SignatureAlgorithm = SignatureAlgorithm::Ecdsa {
    digest: Some(DigestAlgorithm::Sha256),
};

fn decode(der: &[u8]) -> Certificate {
    Certificate::from_der(der).expect("fixture decodes")
}

#[test]
fn p256_signature_verifies_and_tampering_is_detected() {
    let id = Identity::root("P-256 Signer");
    let cert = decode(id.der());
    let sig = id.sign(b"message");

    assert!(verify_signature(&cert, ECDSA_SHA256, DigestAlgorithm::Sha256, b"message", &sig));
    assert!(!verify_signature(&cert, ECDSA_SHA256, DigestAlgorithm::Sha256, b"messagE", &sig));

    let mut flipped = sig.clone();
    let last = flipped.len() - 1;
    flipped[last] ^= 0x01;
    assert!(!verify_signature(&cert, ECDSA_SHA256, DigestAlgorithm::Sha256, b"message", &flipped));
}

#[test]
fn bare_key_algorithm_takes_the_digest_from_the_signer_info() {
    let id = Identity::root("P-256 Signer");
    let cert = decode(id.der());
    let sig = id.sign(b"message");
    let bare = SignatureAlgorithm::Ecdsa { digest: None };

    assert!(verify_signature(&cert, bare, DigestAlgorithm::Sha256, b"message", &sig));
    assert!(!verify_signature(&cert, bare, DigestAlgorithm::Sha512, b"message", &sig));
}

#[test]
fn p384_signature_verifies() {
    let id = Identity::root_p384("P-384 Signer");
    let cert = decode(id.der());
    let sig = id.sign(b"message");
    let alg = SignatureAlgorithm::Ecdsa {
        digest: Some(DigestAlgorithm::Sha384),
    };
    assert!(verify_signature(&cert, alg, DigestAlgorithm::Sha384, b"message", &sig));
}

#[test]
fn rsa_pkcs1v15_signature_verifies() {
    let id = RsaIdentity::self_signed("RSA Signer");
    let cert = decode(id.der());
    let sig = id.sign(b"message");
    let alg = SignatureAlgorithm::RsaPkcs1v15 {
        digest: Some(DigestAlgorithm::Sha256),
    };

    assert!(verify_signature(&cert, alg, DigestAlgorithm::Sha256, b"message", &sig));
    assert!(verify_signature(
        &cert,
        SignatureAlgorithm::RsaPkcs1v15 { digest: None },
        DigestAlgorithm::Sha256,
        b"message",
        &sig
    ));

    let mut flipped = sig.clone();
    flipped[10] ^= 0x80;
    assert!(!verify_signature(&cert, alg, DigestAlgorithm::Sha256, b"message", &flipped));
}

#[test]
fn rsa_self_signed_certificate_signature_verifies() {
    let cert = decode(RsaIdentity::self_signed("RSA Root").der());
    assert!(verify_certificate_signature(&cert, &cert));
}

#[test]
fn key_type_mismatch_is_rejected() {
    let id = Identity::root("P-256 Signer");
    let cert = decode(id.der());
    let sig = id.sign(b"message");
    let rsa = SignatureAlgorithm::RsaPkcs1v15 {
        digest: Some(DigestAlgorithm::Sha256),
    };
    assert!(!verify_signature(&cert, rsa, DigestAlgorithm::Sha256, b"message", &sig));
}

#[test]
fn bound_digest_must_agree_with_digest_algorithm() {
    let id = Identity::root("P-256 Signer");
    let cert = decode(id.der());
    let sig = id.sign(b"message");
    let alg = SignatureAlgorithm::Ecdsa {
        digest: Some(DigestAlgorithm::Sha384),
    };
    assert!(!verify_signature(&cert, alg, DigestAlgorithm::Sha256, b"message", &sig));
}

#[test]
fn garbage_signatures_are_rejected_without_panicking() {
    let cert = decode(Identity::root("P-256 Signer").der());
    for sig in [&[][..], &[0x30, 0x00][..], &[0xFF; 72][..]] {
        assert!(!verify_signature(&cert, ECDSA_SHA256, DigestAlgorithm::Sha256, b"m", sig));
    }
}

#[test]
fn certificate_signatures_follow_the_issuer() {
    let root = Identity::root("Issuer Root");
    let other = Identity::root("Other Root");
    let leaf = Identity::leaf("Issued Leaf", &root);

    let root_cert = decode(root.der());
    let leaf_cert = decode(leaf.der());
    let other_cert = decode(other.der());

    assert!(verify_certificate_signature(&leaf_cert, &root_cert));
    assert!(verify_certificate_signature(&root_cert, &root_cert));
    assert!(!verify_certificate_signature(&leaf_cert, &other_cert));
    assert!(!verify_certificate_signature(&root_cert, &leaf_cert));
}
