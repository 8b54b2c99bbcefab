// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! ASN.1 shapes the fixture builders encode with the `der` crate.
//!
//! Only encoding matters here; the derives also generate decoders, which the
//! fixtures never call.

// The `Sequence` derive generates impls that trip this lint.
#![allow(single_use_lifetimes)]

use der::asn1::{AnyRef, BitStringRef, ObjectIdentifier, OctetStringRef, SetOfVec, UtcTime};
use der::{Decode, Encode, Header, Length, Reader, Sequence, Tag, TagNumber, ValueOrd, Writer};

pub const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
pub const OID_SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// `[0]` constructed, as used for explicit `eContent`, `certificates` and `signedAttrs`.
pub const CONTEXT_0: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

/// `[0]` primitive, as used for a `subjectKeyIdentifier` signer identifier.
pub const CONTEXT_0_PRIMITIVE: Tag = Tag::ContextSpecific {
    constructed: false,
    number: TagNumber::N0,
};

/// Parse a dotted OID literal used by a fixture.
pub fn oid(dotted: &str) -> ObjectIdentifier {
    ObjectIdentifier::new(dotted).unwrap_or_else(|e| panic!("fixture OID {dotted}: {e}"))
}

/// Encode any `der` value, panicking on failure.
pub fn encode(value: &impl Encode) -> Vec<u8> {
    value.to_der().expect("DER encoding of fixture")
}

/// A `tag`ged element with the given contents octets.
pub fn element(tag: Tag, contents: &[u8]) -> Vec<u8> {
    encode(&AnyRef::new(tag, contents).expect("fixture element length"))
}

/// Re-borrow encoded DER as an [`AnyRef`] for embedding in a larger structure.
pub fn any(der: &[u8]) -> AnyRef<'_> {
    AnyRef::from_der(der).expect("fixture element is well-formed DER")
}

/// `ContentInfo ::= SEQUENCE { contentType, content [0] EXPLICIT ANY }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ContentInfo<'a> {
    pub content_type: ObjectIdentifier,
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    pub content: AnyRef<'a>,
}

/// `SignedData`, with `certificates` and `signerInfos` kept in insertion order.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SignedData<'a> {
    pub version: u8,
    pub digest_algorithms: SetInOrder<AlgorithmIdentifier<'a>>,
    pub encap_content_info: EncapsulatedContentInfo<'a>,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub certificates: Option<SetInOrder<AnyRef<'a>>>,
    pub signer_infos: SetInOrder<AnyRef<'a>>,
}

/// `eContent` is carried as the complete `[0]` element so fixtures can put
/// anything inside it.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EncapsulatedContentInfo<'a> {
    pub econtent_type: ObjectIdentifier,
    pub econtent: Option<AnyRef<'a>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SignerInfo<'a> {
    pub version: u8,
    pub sid: AnyRef<'a>,
    pub digest_algorithm: AlgorithmIdentifier<'a>,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub signed_attrs: Option<SetInOrder<Attribute<'a>>>,
    pub signature_algorithm: AlgorithmIdentifier<'a>,
    pub signature: OctetStringRef<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct IssuerAndSerialNumber<'a> {
    pub issuer: AnyRef<'a>,
    pub serial_number: der::asn1::IntRef<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Attribute<'a> {
    pub oid: ObjectIdentifier,
    pub values: SetInOrder<AnyRef<'a>>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Sequence, ValueOrd)]
pub struct AlgorithmIdentifier<'a> {
    pub oid: ObjectIdentifier,
    pub parameters: Option<AnyRef<'a>>,
}

impl<'a> AlgorithmIdentifier<'a> {
    pub fn new(oid: ObjectIdentifier) -> Self {
        Self { oid, parameters: None }
    }

    /// Algorithm identifier with explicit NULL parameters, as RSA uses.
    pub fn with_null(oid: ObjectIdentifier) -> Self {
        Self {
            oid,
            parameters: Some(AnyRef::NULL),
        }
    }
}

/// `TBSCertificate` without unique identifiers or extensions.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TbsCertificate<'a> {
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    pub version: u8,
    pub serial_number: der::asn1::IntRef<'a>,
    pub signature: AlgorithmIdentifier<'a>,
    pub issuer: AnyRef<'a>,
    pub validity: Validity,
    pub subject: AnyRef<'a>,
    pub subject_public_key_info: SubjectPublicKeyInfo<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Validity {
    pub not_before: UtcTime,
    pub not_after: UtcTime,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SubjectPublicKeyInfo<'a> {
    pub algorithm: AlgorithmIdentifier<'a>,
    pub subject_public_key: BitStringRef<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Certificate<'a> {
    pub tbs_certificate: AnyRef<'a>,
    pub signature_algorithm: AlgorithmIdentifier<'a>,
    pub signature: BitStringRef<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence, ValueOrd)]
pub struct AttributeTypeAndValue<'a> {
    pub oid: ObjectIdentifier,
    pub value: AnyRef<'a>,
}

/// DER of a `Name` holding a single UTF8String common name.
pub fn common_name(cn: &str) -> Vec<u8> {
    let atv = AttributeTypeAndValue {
        oid: OID_COMMON_NAME,
        value: AnyRef::new(Tag::Utf8String, cn.as_bytes()).expect("common name length"),
    };
    let rdn = SetOfVec::try_from(vec![atv]).expect("single-element RDN");
    encode(&vec![rdn])
}

/// `SET OF T` encoded in insertion order.
///
/// DER wants `SET OF` sorted; fixtures need control over the order to test
/// how the verifier treats it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetInOrder<T>(pub Vec<T>);

impl<'a, T: Decode<'a>> der::DecodeValue<'a> for SetInOrder<T> {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let mut items = Vec::new();
            while !reader.is_finished() {
                items.push(reader.decode()?);
            }
            Ok(Self(items))
        })
    }
}

impl<T: Encode> der::EncodeValue for SetInOrder<T> {
    fn value_len(&self) -> der::Result<Length> {
        self.0
            .iter()
            .try_fold(Length::ZERO, |len, item| len + item.encoded_len()?)
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        for item in &self.0 {
            item.encode(writer)?;
        }
        Ok(())
    }
}

impl<T> der::FixedTag for SetInOrder<T> {
    const TAG: Tag = Tag::Set;
}

/// `depth` levels of BER constructed OCTET STRING (tag `0x24`) around one
/// primitive OCTET STRING holding `leaf`.
///
/// DER forbids this form; decoders must reject it without recursing once per level.
pub fn nested_constructed_octet_string(depth: usize, leaf: &[u8]) -> Vec<u8> {
    let leaf = element(Tag::OctetString, leaf);

    // Contents length of each level, innermost first.
    let mut lengths = Vec::with_capacity(depth);
    let mut inner = leaf.len();
    for _ in 0..depth {
        lengths.push(inner);
        let header_len = Length::try_from(inner)
            .and_then(|len| len.encoded_len())
            .and_then(usize::try_from)
            .expect("nested length");
        inner += 1 + header_len;
    }

    let mut out = Vec::with_capacity(inner);
    for len in lengths.iter().rev() {
        out.push(0x24);
        Length::try_from(*len)
            .and_then(|len| len.encode_to_vec(&mut out))
            .expect("nested length");
    }
    out.extend_from_slice(&leaf);
    out
}
