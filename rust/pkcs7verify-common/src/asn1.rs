// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! RFC 5652 structures as they appear on the wire.
//!
//! Everything borrows from the input buffer. Fields the verifier does not
//! inspect are kept as [`AnyRef`]. `SET OF` fields whose element order is
//! meaningful to callers (signer infos, embedded certificates) are decoded
//! with [`SetInOrder`] rather than `SetOfVec`, which re-sorts its elements.

// The `Sequence` derive generates impls that trip this lint.
#![allow(single_use_lifetimes)]

use der::asn1::{AnyRef, IntRef, ObjectIdentifier, OctetStringRef, SetOfVec};
use der::{Choice, Decode, Encode, Header, Length, Reader, Sequence, Tag, TagNumber, Writer};

use crate::algorithms::oid;

pub(crate) const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap(oid::SIGNED_DATA);
pub(crate) const ID_CONTENT_TYPE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap(oid::ATTR_CONTENT_TYPE);
pub(crate) const ID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap(oid::ATTR_MESSAGE_DIGEST);

/// ```text
/// ContentInfo ::= SEQUENCE {
///     contentType ContentType,
///     content     [0] EXPLICIT ANY DEFINED BY contentType }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct ContentInfo<'a> {
    pub content_type: ObjectIdentifier,
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    pub content: AnyRef<'a>,
}

/// ```text
/// SignedData ::= SEQUENCE {
///     version          CMSVersion,
///     digestAlgorithms SET OF DigestAlgorithmIdentifier,
///     encapContentInfo EncapsulatedContentInfo,
///     certificates     [0] IMPLICIT CertificateSet OPTIONAL,
///     crls             [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///     signerInfos      SET OF SignerInfo }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct SignedData<'a> {
    pub version: u8,
    pub digest_algorithms: SetInOrder<AlgorithmIdentifierRef<'a>>,
    pub encap_content_info: EncapsulatedContentInfo<'a>,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub certificates: Option<CertificateSet<'a>>,
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub crls: Option<AnyRef<'a>>,
    pub signer_infos: SetInOrder<SignerInfo<'a>>,
}

/// ```text
/// EncapsulatedContentInfo ::= SEQUENCE {
///     eContentType ContentType,
///     eContent     [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct EncapsulatedContentInfo<'a> {
    pub econtent_type: ObjectIdentifier,
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", optional = "true")]
    pub econtent: Option<AnyRef<'a>>,
}

/// ```text
/// SignerInfo ::= SEQUENCE {
///     version            CMSVersion,
///     sid                SignerIdentifier,
///     digestAlgorithm    DigestAlgorithmIdentifier,
///     signedAttrs        [0] IMPLICIT SignedAttributes OPTIONAL,
///     signatureAlgorithm SignatureAlgorithmIdentifier,
///     signature          SignatureValue,
///     unsignedAttrs      [1] IMPLICIT UnsignedAttributes OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct SignerInfo<'a> {
    pub version: u8,
    pub sid: SignerIdentifier<'a>,
    pub digest_alg: AlgorithmIdentifierRef<'a>,
    #[asn1(
        context_specific = "0",
        tag_mode = "IMPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub signed_attrs: Option<SignedAttrs<'a>>,
    pub signature_algorithm: AlgorithmIdentifierRef<'a>,
    pub signature: OctetStringRef<'a>,
    #[asn1(
        context_specific = "1",
        tag_mode = "IMPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub unsigned_attrs: Option<AnyRef<'a>>,
}

/// ```text
/// SignerIdentifier ::= CHOICE {
///     issuerAndSerialNumber IssuerAndSerialNumber,
///     subjectKeyIdentifier  [0] SubjectKeyIdentifier }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub(crate) enum SignerIdentifier<'a> {
    IssuerAndSerialNumber(IssuerAndSerialNumber<'a>),

    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    SubjectKeyIdentifier(OctetStringRef<'a>),
}

/// ```text
/// IssuerAndSerialNumber ::= SEQUENCE {
///     issuer       Name,
///     serialNumber CertificateSerialNumber }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct IssuerAndSerialNumber<'a> {
    pub issuer: AnyRef<'a>,
    pub serial_number: IntRef<'a>,
}

/// ```text
/// AlgorithmIdentifier ::= SEQUENCE {
///     algorithm  OBJECT IDENTIFIER,
///     parameters ANY DEFINED BY algorithm OPTIONAL }
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct AlgorithmIdentifierRef<'a> {
    pub oid: ObjectIdentifier,
    pub parameters: Option<AnyRef<'a>>,
}

/// ```text
/// Attribute ::= SEQUENCE {
///     attrType   OBJECT IDENTIFIER,
///     attrValues SET OF AttributeValue }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct AttributeRef<'a> {
    pub oid: ObjectIdentifier,
    pub values: SetOfVec<AnyRef<'a>>,
}

/// Signed attributes together with the exact contents octets they were decoded from.
///
/// The signature covers these octets under a `SET` header, so they are kept
/// as a slice of the input rather than re-encoded from `attrs`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SignedAttrs<'a> {
    pub attrs: Vec<AttributeRef<'a>>,
    pub value: &'a [u8],
}

impl<'a> der::DecodeValue<'a> for SignedAttrs<'a> {
    fn decode_value<R: Reader<'a>>(decoder: &mut R, header: Header) -> der::Result<Self> {
        let mut attrs = Vec::new();
        decoder.read_nested(header.length, |decoder| {
            let value = decoder.read_slice(decoder.remaining_len())?;
            let mut decoder = der::SliceReader::new(value)?;

            while !decoder.is_finished() {
                attrs.push(decoder.decode()?);
            }

            Ok(Self { attrs, value })
        })
    }
}

impl der::EncodeValue for SignedAttrs<'_> {
    fn value_len(&self) -> der::Result<Length> {
        Length::try_from(self.value.len())
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        writer.write(self.value)
    }
}

impl der::FixedTag for SignedAttrs<'_> {
    const TAG: Tag = Tag::Set;
}

/// `SET OF T` decoded in encoding order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SetInOrder<T>(pub Vec<T>);

impl<'a, T: Decode<'a>> der::DecodeValue<'a> for SetInOrder<T> {
    fn decode_value<R: Reader<'a>>(decoder: &mut R, header: Header) -> der::Result<Self> {
        decoder.read_nested(header.length, |decoder| {
            let mut items = Vec::new();
            while !decoder.is_finished() {
                items.push(decoder.decode()?);
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

/// One `CertificateChoices` element, undecoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct CertificateChoice<'a> {
    pub tag: Tag,
    pub der: &'a [u8],
}

/// `CertificateSet ::= SET OF CertificateChoices`, kept as raw elements so the
/// certificate decoder sees the exact bytes that were signed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CertificateSet<'a>(pub Vec<CertificateChoice<'a>>);

impl<'a> der::DecodeValue<'a> for CertificateSet<'a> {
    fn decode_value<R: Reader<'a>>(decoder: &mut R, header: Header) -> der::Result<Self> {
        decoder.read_nested(header.length, |decoder| {
            let mut res = Vec::new();
            while !decoder.is_finished() {
                let tag = decoder.peek_tag()?;
                let der = decoder.tlv_bytes()?;
                res.push(CertificateChoice { tag, der });
            }
            Ok(Self(res))
        })
    }
}

impl der::EncodeValue for CertificateSet<'_> {
    fn value_len(&self) -> der::Result<Length> {
        self.0
            .iter()
            .try_fold(Length::ZERO, |len, c| len + Length::try_from(c.der.len())?)
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        for c in &self.0 {
            writer.write(c.der)?;
        }
        Ok(())
    }
}

impl der::FixedTag for CertificateSet<'_> {
    const TAG: Tag = Tag::Set;
}

/// Prefix `contents` with a definite-length header carrying `tag`.
pub(crate) fn with_header(tag: Tag, contents: &[u8]) -> der::Result<Vec<u8>> {
    let mut out = Header::new(tag, contents.len())?.to_der()?;
    out.extend_from_slice(contents);
    Ok(out)
}

/// The `[0]` constructed tag that carries signed attributes inside a `SignerInfo`.
pub(crate) const SIGNED_ATTRS_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_minimal_der() {
        assert_eq!(with_header(Tag::Set, &[1, 2, 3]).unwrap(), vec![0x31, 0x03, 1, 2, 3]);

        let long = with_header(Tag::OctetString, &[0xAB; 300]).unwrap();
        assert_eq!(&long[..4], &[0x04, 0x82, 0x01, 0x2C]);
        assert_eq!(long.len(), 304);
    }

    #[test]
    fn signed_attrs_keep_their_contents_octets() {
        // [0] { SEQUENCE { contentType, SET { id-data } } }
        let der = [
            0xA0, 0x18, 0x30, 0x16, 0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09,
            0x03, 0x31, 0x09, 0x06, 0x07, 0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01,
        ];
        let mut reader = der::SliceReader::new(&der).unwrap();
        let header = Header::decode(&mut reader).unwrap();
        let attrs = <SignedAttrs<'_> as der::DecodeValue>::decode_value(&mut reader, header).unwrap();

        assert_eq!(attrs.value, &der[2..]);
        assert_eq!(attrs.attrs.len(), 1);
        assert_eq!(attrs.attrs[0].oid, ID_CONTENT_TYPE);
    }

    #[test]
    fn set_in_order_keeps_encoding_order() {
        // SET { INTEGER 2, INTEGER 1 } is not sorted; order must survive.
        let der = [0x31, 0x06, 0x02, 0x01, 0x02, 0x02, 0x01, 0x01];
        let set = SetInOrder::<u8>::from_der(&der).unwrap();
        assert_eq!(set.0, vec![2, 1]);
    }
}
