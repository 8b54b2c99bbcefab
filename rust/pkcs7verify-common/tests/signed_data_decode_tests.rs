// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `SignedData` container decoding.
//!
//! Containers are produced by the test-utils builder; these tests check what
//! the decoder recovers from them and which encodings it refuses.

use pkcs7verify_common::algorithms::oid;
use pkcs7verify_common::{
    DigestAlgorithm, SignatureAlgorithm, SignatureContainer, SignerIdentifier, VerifyError,
};
use der::Tag;
use pkcs7verify_test_utils::asn1;
use pkcs7verify_test_utils::cms::{OID_ATTR_CONTENT_TYPE, OID_ATTR_MESSAGE_DIGEST, OID_ATTR_SIGNING_TIME};
use pkcs7verify_test_utils::{Identity, SignedDataBuilder, SignerConfig, TestSigner};

#[test]
fn enveloped_container_exposes_payload_certificates_and_signer() {
    let root = Identity::root("Container Root");
    let bytes = SignedDataBuilder::new(b"hello").signer(&root).build();

    let container = SignatureContainer::from_der(&bytes).expect("decode");
    assert_eq!(container.version(), 1);
    assert_eq!(container.content_type(), oid::DATA);
    assert_eq!(container.payload(), Some(b"hello".as_slice()));
    assert!(!container.is_detached());
    assert_eq!(container.certificates().len(), 1);
    assert_eq!(container.certificates()[0].as_der(), root.der());

    let signers = container.signer_infos();
    assert_eq!(signers.len(), 1);
    let si = &signers[0];
    assert_eq!(si.version(), 1);
    assert_eq!(si.digest_algorithm(), Ok(DigestAlgorithm::Sha256));
    assert_eq!(
        si.signature_algorithm(),
        Ok(SignatureAlgorithm::Ecdsa {
            digest: Some(DigestAlgorithm::Sha256)
        })
    );

    let (issuer, serial) = root.issuer_and_serial();
    assert_eq!(si.signer_id(), &SignerIdentifier::IssuerAndSerial { issuer, serial });
    let found = container.find_certificate(si.signer_id()).expect("signer certificate");
    assert_eq!(found.as_der(), root.der());
}

#[test]
fn signed_attributes_keep_the_original_encoding() {
    let root = Identity::root("Container Root");
    let bytes = SignedDataBuilder::new(b"hello").signer(&root).build();
    let container = SignatureContainer::from_der(&bytes).unwrap();
    let attrs = container.signer_infos()[0].signed_attributes().expect("signed attributes");

    assert_eq!(attrs.content_type(), oid::DATA);
    assert_eq!(attrs.message_digest(), root.digest(b"hello").as_slice());

    let raw = attrs.raw();
    let tbs = attrs.to_be_signed();
    assert_eq!(raw[0], 0xA0);
    assert_eq!(tbs[0], 0x31);
    assert_eq!(&raw[1..], &tbs[1..]);

    // The retained slice is found verbatim in the input.
    assert!(bytes.windows(raw.len()).any(|w| w == raw));
}

#[test]
fn detached_container_has_no_payload() {
    let root = Identity::root("Container Root");
    let bytes = SignedDataBuilder::new(b"payload-v1").detached().signer(&root).build();
    let container = SignatureContainer::from_der(&bytes).unwrap();
    assert!(container.is_detached());
    assert_eq!(container.payload(), None);
}

#[test]
fn signer_without_attributes_decodes() {
    let root = Identity::root("Container Root");
    let bytes = SignedDataBuilder::new(b"payload-v1")
        .certificate(root.der())
        .signer_with(SignerConfig::new(&root).without_signed_attributes())
        .build();
    let container = SignatureContainer::from_der(&bytes).unwrap();
    assert!(container.signer_infos()[0].signed_attributes().is_none());
}

#[test]
fn subject_key_identifier_signer_is_resolved() {
    let root = Identity::root("SKI Root");
    let bytes = SignedDataBuilder::new(b"hello")
        .certificate(root.der())
        .signer_with(SignerConfig::new(&root).by_subject_key_identifier())
        .build();
    let container = SignatureContainer::from_der(&bytes).unwrap();
    let si = &container.signer_infos()[0];

    assert_eq!(si.version(), 3);
    assert!(matches!(si.signer_id(), SignerIdentifier::SubjectKeyIdentifier(_)));
    assert_eq!(container.find_certificate(si.signer_id()).unwrap().as_der(), root.der());
}

#[test]
fn signer_order_is_preserved() {
    let a = Identity::root("Signer A");
    let b = Identity::root_p384("Signer B");
    let bytes = SignedDataBuilder::new(b"two signers").signer(&a).signer(&b).build();
    let container = SignatureContainer::from_der(&bytes).unwrap();

    let signers = container.signer_infos();
    assert_eq!(signers.len(), 2);
    assert_eq!(signers[0].digest_algorithm(), Ok(DigestAlgorithm::Sha256));
    assert_eq!(signers[1].digest_algorithm(), Ok(DigestAlgorithm::Sha384));
    assert_eq!(container.find_certificate(signers[1].signer_id()).unwrap().as_der(), b.der());
}

#[test]
fn unknown_digest_is_reported_per_signer() {
    let root = Identity::root("Container Root");
    let md5 = "1.2.840.113549.2.5";
    let bytes = SignedDataBuilder::new(b"hello")
        .certificate(root.der())
        .signer_with(SignerConfig::new(&root).with_digest_oid(md5))
        .build();

    let container = SignatureContainer::from_der(&bytes).expect("decode still succeeds");
    let si = &container.signer_infos()[0];
    assert_eq!(si.digest_algorithm_oid(), md5);
    assert!(matches!(si.digest_algorithm(), Err(VerifyError::UnsupportedAlgorithm(_))));
}

#[test]
fn long_payload_uses_long_form_lengths() {
    let root = Identity::root("Container Root");
    let payload = vec![0x5Au8; 70_000];
    let bytes = SignedDataBuilder::new(&payload).signer(&root).build();
    let container = SignatureContainer::from_der(&bytes).unwrap();
    assert_eq!(container.payload(), Some(payload.as_slice()));
}

#[test]
fn zero_signer_infos_is_malformed() {
    let bytes = SignedDataBuilder::new(b"nobody").build();
    match SignatureContainer::from_der(&bytes) {
        Err(VerifyError::MalformedContainer(msg)) => assert!(msg.contains("no signer"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn other_content_types_are_unsupported() {
    let enveloped_data = "1.2.840.113549.1.7.3";
    let content = asn1::element(Tag::Sequence, &asn1::encode(&0u8));
    let bytes = asn1::encode(&asn1::ContentInfo {
        content_type: asn1::oid(enveloped_data),
        content: asn1::any(&content),
    });
    assert_eq!(
        SignatureContainer::from_der(&bytes),
        Err(VerifyError::UnsupportedContentType(enveloped_data.to_string()))
    );
}

#[test]
fn broken_embedded_certificate_is_malformed_container() {
    let root = Identity::root("Container Root");
    let bogus_cert = asn1::element(Tag::Sequence, &asn1::encode(&1u8));
    let bytes = SignedDataBuilder::new(b"hello")
        .certificate(&bogus_cert)
        .signer(&root)
        .build();
    assert!(matches!(
        SignatureContainer::from_der(&bytes),
        Err(VerifyError::MalformedContainer(_))
    ));
}

#[test]
fn trailing_bytes_are_malformed() {
    let root = Identity::root("Container Root");
    let mut bytes = SignedDataBuilder::new(b"hello").signer(&root).build();
    bytes.push(0x00);
    assert!(matches!(
        SignatureContainer::from_der(&bytes),
        Err(VerifyError::MalformedContainer(_))
    ));
}

fn assert_malformed(bytes: &[u8], expected: &str) {
    match SignatureContainer::from_der(bytes) {
        Err(VerifyError::MalformedContainer(msg)) => assert!(msg.contains(expected), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn duplicate_signed_attribute_is_malformed() {
    let root = Identity::root("Container Root");
    for attr in [OID_ATTR_CONTENT_TYPE, OID_ATTR_MESSAGE_DIGEST, OID_ATTR_SIGNING_TIME] {
        let bytes = SignedDataBuilder::new(b"hello")
            .certificate(root.der())
            .signer_with(SignerConfig::new(&root).duplicate_attribute(attr))
            .build();
        assert_malformed(&bytes, "duplicate signed attribute");
    }
}

#[test]
fn missing_content_type_attribute_is_malformed() {
    let root = Identity::root("Container Root");
    let bytes = SignedDataBuilder::new(b"hello")
        .certificate(root.der())
        .signer_with(SignerConfig::new(&root).omit_attribute(OID_ATTR_CONTENT_TYPE))
        .build();
    assert_malformed(&bytes, "lack contentType");
}

#[test]
fn missing_message_digest_attribute_is_malformed() {
    let root = Identity::root("Container Root");
    let bytes = SignedDataBuilder::new(b"hello")
        .certificate(root.der())
        .signer_with(SignerConfig::new(&root).omit_attribute(OID_ATTR_MESSAGE_DIGEST))
        .build();
    assert_malformed(&bytes, "lack messageDigest");
}

#[test]
fn signing_time_is_optional() {
    let root = Identity::root("Container Root");
    let bytes = SignedDataBuilder::new(b"hello")
        .certificate(root.der())
        .signer_with(SignerConfig::new(&root).omit_attribute(OID_ATTR_SIGNING_TIME))
        .build();
    let container = SignatureContainer::from_der(&bytes).expect("decode");
    assert!(container.signer_infos()[0].signed_attributes().is_some());
}

#[test]
fn deeply_nested_constructed_octet_string_is_rejected() {
    let root = Identity::root("Container Root");
    let nested = asn1::nested_constructed_octet_string(20_000, b"x");
    let bytes = SignedDataBuilder::new(b"x")
        .raw_econtent(&nested)
        .signer(&root)
        .build();
    assert!(matches!(
        SignatureContainer::from_der(&bytes),
        Err(VerifyError::MalformedContainer(_))
    ));
}

#[test]
fn legacy_sequence_content_is_used_as_is() {
    let root = Identity::root("Container Root");
    let inner = asn1::encode(&7u8);
    let bytes = SignedDataBuilder::new(&inner)
        .raw_econtent(&asn1::element(Tag::Sequence, &inner))
        .signer(&root)
        .build();
    let container = SignatureContainer::from_der(&bytes).expect("decode");
    assert_eq!(container.payload(), Some(inner.as_slice()));
}
