// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! PKCS#7 / CMS `SignedData` decoding (RFC 5652).
//!
//! The ASN.1 structures live in [`crate::asn1`] and are decoded with the
//! `der` crate; this module turns them into owned values and applies the
//! checks `der` cannot express (required attributes, non-empty signer set).
//! The signed-attributes element is kept as the exact bytes found in the
//! input; see [`SignedAttributes::to_be_signed`].

use der::asn1::AnyRef;
use der::{Decode, Encode, Tag, Tagged};

use crate::algorithms::{DigestAlgorithm, SignatureAlgorithm};
use crate::asn1::{self, SIGNED_ATTRS_TAG};
use crate::certificate::Certificate;
use crate::error::{VerifyError, VerifyResult};
/// How a signer info names its certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerIdentifier {
    /// Issuer name DER and serial number INTEGER content octets.
    IssuerAndSerial { issuer: Vec<u8>, serial: Vec<u8> },
    SubjectKeyIdentifier(Vec<u8>),
}

impl SignerIdentifier {
    pub fn matches(&self, cert: &Certificate) -> bool {
        match self {
            SignerIdentifier::IssuerAndSerial { issuer, serial } => {
                cert.issuer().as_der() == issuer.as_slice() && cert.serial_number() == serial.as_slice()
            }
            SignerIdentifier::SubjectKeyIdentifier(kid) => {
                cert.subject_key_identifier() == Some(kid.as_slice())
            }
        }
    }
}

/// The authenticated attributes of one signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAttributes {
    raw: Vec<u8>,
    to_be_signed: Vec<u8>,
    content_type: String,
    message_digest: Vec<u8>,
}

impl SignedAttributes {
    /// The `[0] IMPLICIT` element exactly as it appeared in the container.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Bytes covered by the signature.
    ///
    /// RFC 5652 §5.4: the signature is computed over the DER of the
    /// attributes as an explicit `SET OF`. That is the retained contents
    /// octets under a `SET` header; they are never re-encoded.
    pub fn to_be_signed(&self) -> &[u8] {
        &self.to_be_signed
    }

    /// Value of the `contentType` attribute.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Value of the `messageDigest` attribute.
    pub fn message_digest(&self) -> &[u8] {
        &self.message_digest
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerInfo {
    version: u32,
    signer_id: SignerIdentifier,
    digest_algorithm: String,
    signed_attributes: Option<SignedAttributes>,
    signature_algorithm: String,
    signature: Vec<u8>,
}

impl SignerInfo {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn signer_id(&self) -> &SignerIdentifier {
        &self.signer_id
    }

    pub fn digest_algorithm_oid(&self) -> &str {
        &self.digest_algorithm
    }

    pub fn signature_algorithm_oid(&self) -> &str {
        &self.signature_algorithm
    }

    /// The declared digest algorithm, if it is one this workspace implements.
    pub fn digest_algorithm(&self) -> VerifyResult<DigestAlgorithm> {
        DigestAlgorithm::from_oid(&self.digest_algorithm).ok_or_else(|| {
            VerifyError::UnsupportedAlgorithm(format!("digest algorithm {}", self.digest_algorithm))
        })
    }

    /// The declared signature algorithm, if it is one this workspace implements.
    pub fn signature_algorithm(&self) -> VerifyResult<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(&self.signature_algorithm).ok_or_else(|| {
            VerifyError::UnsupportedAlgorithm(format!(
                "signature algorithm {}",
                self.signature_algorithm
            ))
        })
    }

    pub fn signed_attributes(&self) -> Option<&SignedAttributes> {
        self.signed_attributes.as_ref()
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// A decoded `SignedData` container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureContainer {
    version: u32,
    content_type: String,
    payload: Option<Vec<u8>>,
    certificates: Vec<Certificate>,
    signer_infos: Vec<SignerInfo>,
}

impl SignatureContainer {
    /// Decode a DER `ContentInfo` wrapping `SignedData`.
    pub fn from_der(input: &[u8]) -> VerifyResult<Self> {
        if input.is_empty() {
            return Err(malformed("empty input"));
        }

        let content_info =
            asn1::ContentInfo::from_der(input).map_err(|e| malformed(format!("ContentInfo: {e}")))?;
        if content_info.content_type != asn1::ID_SIGNED_DATA {
            return Err(VerifyError::UnsupportedContentType(
                content_info.content_type.to_string(),
            ));
        }
        let signed_data: asn1::SignedData<'_> = content_info
            .content
            .decode_as()
            .map_err(|e| malformed(format!("SignedData: {e}")))?;

        convert_signed_data(signed_data)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// `eContentType` of the encapsulated content.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The enveloped payload, `None` for a detached signature.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn is_detached(&self) -> bool {
        self.payload.is_none()
    }

    /// Certificates carried in the container, decoded but not validated.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn signer_infos(&self) -> &[SignerInfo] {
        &self.signer_infos
    }

    pub fn find_certificate(&self, id: &SignerIdentifier) -> Option<&Certificate> {
        self.certificates.iter().find(|c| id.matches(c))
    }
}

fn malformed(e: impl Into<String>) -> VerifyError {
    VerifyError::MalformedContainer(e.into())
}

fn convert_signed_data(sd: asn1::SignedData<'_>) -> VerifyResult<SignatureContainer> {
    let payload = match sd.encap_content_info.econtent {
        None => None,
        Some(content) => Some(content_octets(content)?),
    };

    let mut certificates = Vec::new();
    for choice in sd.certificates.map(|set| set.0).unwrap_or_default() {
        if choice.tag != Tag::Sequence {
            // Attribute certificates and other choices are not used for chain building.
            tracing::trace!(target: "pkcs7verify::signed_data", tag = %choice.tag, "skipping certificate choice");
            continue;
        }
        match Certificate::from_der(choice.der) {
            Ok(cert) => certificates.push(cert),
            Err(VerifyError::UnsupportedAlgorithm(alg)) => {
                tracing::debug!(
                    target: "pkcs7verify::signed_data",
                    algorithm = %alg,
                    "skipping embedded certificate with unsupported algorithm"
                );
            }
            Err(e) => return Err(malformed(format!("embedded certificate: {e}"))),
        }
    }

    // CRLs are not consulted.

    let signer_infos = sd
        .signer_infos
        .0
        .into_iter()
        .map(convert_signer_info)
        .collect::<VerifyResult<Vec<_>>>()?;
    if signer_infos.is_empty() {
        return Err(malformed("SignedData has no signer infos"));
    }

    tracing::trace!(
        target: "pkcs7verify::signed_data",
        signers = signer_infos.len(),
        certificates = certificates.len(),
        detached = payload.is_none(),
        "decoded SignedData"
    );

    Ok(SignatureContainer {
        version: u32::from(sd.version),
        content_type: sd.encap_content_info.econtent_type.to_string(),
        payload,
        certificates,
        signer_infos,
    })
}

/// The octets the message digest is computed over.
///
/// `der` rejects the BER-only constructed OCTET STRING form, so there is no
/// segmented content to reassemble here.
fn content_octets(content: AnyRef<'_>) -> VerifyResult<Vec<u8>> {
    match content.tag() {
        Tag::OctetString => Ok(content.value().to_vec()),
        // PKCS#7 v1.5 allows non-data content types to be embedded directly;
        // their digest covers the contents octets of the element.
        Tag::Sequence | Tag::Set => Ok(content.value().to_vec()),
        other => Err(malformed(format!("unexpected eContent tag {other}"))),
    }
}

fn convert_signer_info(si: asn1::SignerInfo<'_>) -> VerifyResult<SignerInfo> {
    let signer_id = match si.sid {
        asn1::SignerIdentifier::IssuerAndSerialNumber(ias) => SignerIdentifier::IssuerAndSerial {
            issuer: ias.issuer.to_der().map_err(|e| malformed(format!("issuer name: {e}")))?,
            serial: ias.serial_number.as_bytes().to_vec(),
        },
        asn1::SignerIdentifier::SubjectKeyIdentifier(kid) => {
            SignerIdentifier::SubjectKeyIdentifier(kid.as_bytes().to_vec())
        }
    };

    let signed_attributes = si.signed_attrs.map(convert_signed_attributes).transpose()?;

    let signature = si.signature.as_bytes();
    if signature.is_empty() {
        return Err(malformed("empty signature value"));
    }

    Ok(SignerInfo {
        version: u32::from(si.version),
        signer_id,
        digest_algorithm: si.digest_alg.oid.to_string(),
        signed_attributes,
        signature_algorithm: si.signature_algorithm.oid.to_string(),
        signature: signature.to_vec(),
    })
}

fn convert_signed_attributes(attrs: asn1::SignedAttrs<'_>) -> VerifyResult<SignedAttributes> {
    let mut content_type = None;
    let mut message_digest = None;

    for (i, attr) in attrs.attrs.iter().enumerate() {
        if attrs.attrs[..i].iter().any(|a| a.oid == attr.oid) {
            return Err(malformed(format!("duplicate signed attribute {}", attr.oid)));
        }

        if attr.oid == asn1::ID_CONTENT_TYPE {
            let value = single_value(attr, "contentType")?;
            let oid = value
                .decode_as::<der::asn1::ObjectIdentifier>()
                .map_err(|e| malformed(format!("contentType attribute: {e}")))?;
            content_type = Some(oid.to_string());
        } else if attr.oid == asn1::ID_MESSAGE_DIGEST {
            let value = single_value(attr, "messageDigest")?;
            let digest = value
                .decode_as::<der::asn1::OctetStringRef<'_>>()
                .map_err(|e| malformed(format!("messageDigest attribute: {e}")))?;
            message_digest = Some(digest.as_bytes().to_vec());
        }
    }

    let raw = asn1::with_header(SIGNED_ATTRS_TAG, attrs.value)
        .map_err(|e| malformed(format!("signed attributes: {e}")))?;
    let to_be_signed = asn1::with_header(Tag::Set, attrs.value)
        .map_err(|e| malformed(format!("signed attributes: {e}")))?;

    Ok(SignedAttributes {
        raw,
        to_be_signed,
        content_type: content_type.ok_or_else(|| malformed("signed attributes lack contentType"))?,
        message_digest: message_digest
            .ok_or_else(|| malformed("signed attributes lack messageDigest"))?,
    })
}

fn single_value<'a>(attr: &asn1::AttributeRef<'a>, name: &str) -> VerifyResult<AnyRef<'a>> {
    match attr.values.as_slice() {
        [value] => Ok(*value),
        values => Err(malformed(format!(
            "{name} attribute has {} values, expected 1",
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(
            SignatureContainer::from_der(&[]),
            Err(VerifyError::MalformedContainer(_))
        ));
    }

    #[test]
    fn non_signed_data_content_type_is_unsupported() {
        // ContentInfo { id-data, [0] { OCTET STRING "hi" } }
        let der = [
            0x30, 0x11, 0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01, 0xA0, 0x04,
            0x04, 0x02, b'h', b'i',
        ];
        match SignatureContainer::from_der(&der) {
            Err(VerifyError::UnsupportedContentType(ct)) => assert_eq!(ct, crate::algorithms::oid::DATA),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn trailing_bytes_after_content_info_are_rejected() {
        let der = [0x30, 0x00, 0x00];
        assert!(matches!(
            SignatureContainer::from_der(&der),
            Err(VerifyError::MalformedContainer(_))
        ));
    }

    #[test]
    fn legacy_content_uses_the_contents_octets() {
        let der = [0x30, 0x03, 0x02, 0x01, 0x07];
        let content = AnyRef::from_der(&der).unwrap();
        assert_eq!(content_octets(content).unwrap(), vec![0x02, 0x01, 0x07]);

        let der = [0x04, 0x02, b'h', b'i'];
        let content = AnyRef::from_der(&der).unwrap();
        assert_eq!(content_octets(content).unwrap(), b"hi".to_vec());

        let der = [0x02, 0x01, 0x07];
        let content = AnyRef::from_der(&der).unwrap();
        assert!(matches!(content_octets(content), Err(VerifyError::MalformedContainer(_))));
    }

    #[test]
    fn constructed_octet_string_is_rejected_without_recursion() {
        // BER segmented form: [0x24 { OCTET STRING "he", OCTET STRING "y!" }]
        let der = [0x24, 0x08, 0x04, 0x02, b'h', b'e', 0x04, 0x02, b'y', b'!'];
        assert!(AnyRef::from_der(&der).is_err());
    }

    #[test]
    fn to_be_signed_swaps_only_the_tag() {
        // [0] { SEQUENCE { contentType, SET { id-data } }, SEQUENCE { messageDigest, SET { OCTET STRING 0xAB } } }
        let value = [
            0x30, 0x18, 0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x03, 0x31, 0x0B,
            0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01, 0x30, 0x10, 0x06, 0x09,
            0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x04, 0x31, 0x03, 0x04, 0x01, 0xAB,
        ];
        let mut der = vec![0xA0, value.len() as u8];
        der.extend_from_slice(&value);

        let mut reader = der::SliceReader::new(&der).unwrap();
        let header = der::Header::decode(&mut reader).unwrap();
        let attrs = <asn1::SignedAttrs<'_> as der::DecodeValue>::decode_value(&mut reader, header).unwrap();
        let attrs = convert_signed_attributes(attrs).unwrap();

        assert_eq!(attrs.raw(), der.as_slice());
        assert_eq!(attrs.to_be_signed()[0], 0x31);
        assert_eq!(&attrs.to_be_signed()[1..], &der[1..]);
        assert_eq!(attrs.content_type(), crate::algorithms::oid::DATA);
        assert_eq!(attrs.message_digest(), &[0xAB]);
    }
}
