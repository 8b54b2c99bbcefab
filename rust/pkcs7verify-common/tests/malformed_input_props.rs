// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoders must fail cleanly on truncated or arbitrary input.

use pkcs7verify_common::{Certificate, SignatureContainer, VerifyError};
use der::Tag;
use pkcs7verify_test_utils::asn1;
use pkcs7verify_test_utils::{Identity, SignedDataBuilder};
use proptest::prelude::*;

fn sample_container() -> Vec<u8> {
    let root = Identity::root("Prop Root");
    let leaf = Identity::leaf("Prop Leaf", &root);
    SignedDataBuilder::new(b"property payload")
        .certificate(root.der())
        .signer(&leaf)
        .build()
}

#[test]
fn every_truncated_prefix_is_malformed() {
    let bytes = sample_container();
    for len in 0..bytes.len() {
        match SignatureContainer::from_der(&bytes[..len]) {
            Err(VerifyError::MalformedContainer(_)) => {}
            other => panic!("prefix of {len} bytes: {other:?}"),
        }
    }
}

proptest! {
    #[test]
    fn random_noise_is_malformed(noise in prop::collection::vec(any::<u8>(), 0..512)) {
        let result = SignatureContainer::from_der(&noise);
        prop_assert!(matches!(result, Err(VerifyError::MalformedContainer(_))), "{:?}", result);

        let result = Certificate::from_der(&noise);
        prop_assert!(matches!(result, Err(VerifyError::MalformedCertificate(_))), "{:?}", result);
    }

    #[test]
    fn noise_behind_a_plausible_header_never_panics(body in prop::collection::vec(any::<u8>(), 0..300)) {
        // SEQUENCE { OID signedData, [0] { <noise> } } with consistent lengths.
        let oid = asn1::encode(&asn1::oid("1.2.840.113549.1.7.2"));
        let inner = asn1::element(asn1::CONTEXT_0, &body);
        let bytes = asn1::element(Tag::Sequence, &[oid, inner].concat());
        prop_assert!(SignatureContainer::from_der(&bytes).is_err());
    }
}

#[test]
fn single_byte_mutations_never_panic() {
    let bytes = sample_container();
    for i in 0..bytes.len() {
        let mut mutated = bytes.clone();
        mutated[i] ^= 0xFF;
        let _ = SignatureContainer::from_der(&mutated);
    }
}
