// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `SignedData` container builder.

use der::asn1::OctetStringRef;
use der::Tag;

use crate::asn1::{
    self, AlgorithmIdentifier, Attribute, ContentInfo, EncapsulatedContentInfo,
    IssuerAndSerialNumber, SetInOrder, SignedData, SignerInfo,
};
use crate::pki::TestSigner;

pub const OID_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
pub const OID_DATA: &str = "1.2.840.113549.1.7.1";
pub const OID_ATTR_CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";
pub const OID_ATTR_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";
pub const OID_ATTR_SIGNING_TIME: &str = "1.2.840.113549.1.9.5";

/// One signer info to emit.
pub struct SignerConfig<'a> {
    pub signer: &'a dyn TestSigner,
    /// Identify the signer by subject key identifier instead of issuer and serial.
    pub by_subject_key_identifier: bool,
    pub signed_attributes: bool,
    /// Replaces the computed messageDigest attribute value.
    pub message_digest: Option<Vec<u8>>,
    /// Replaces the contentType attribute value.
    pub attribute_content_type: Option<&'static str>,
    /// Signed attributes, by OID, to leave out.
    pub omitted_attributes: Vec<&'static str>,
    /// Signed attributes, by OID, to emit twice.
    pub duplicated_attributes: Vec<&'static str>,
    pub digest_oid: Option<&'static str>,
    pub signature_oid: Option<&'static str>,
    /// Flip the low bit of the last signature byte after signing.
    pub corrupt_signature: bool,
}

impl<'a> SignerConfig<'a> {
    pub fn new(signer: &'a dyn TestSigner) -> Self {
        Self {
            signer,
            by_subject_key_identifier: false,
            signed_attributes: true,
            message_digest: None,
            attribute_content_type: None,
            omitted_attributes: Vec::new(),
            duplicated_attributes: Vec::new(),
            digest_oid: None,
            signature_oid: None,
            corrupt_signature: false,
        }
    }

    pub fn without_signed_attributes(mut self) -> Self {
        self.signed_attributes = false;
        self
    }

    pub fn by_subject_key_identifier(mut self) -> Self {
        self.by_subject_key_identifier = true;
        self
    }

    pub fn with_message_digest(mut self, digest: Vec<u8>) -> Self {
        self.message_digest = Some(digest);
        self
    }

    pub fn with_attribute_content_type(mut self, oid: &'static str) -> Self {
        self.attribute_content_type = Some(oid);
        self
    }

    pub fn omit_attribute(mut self, oid: &'static str) -> Self {
        self.omitted_attributes.push(oid);
        self
    }

    pub fn duplicate_attribute(mut self, oid: &'static str) -> Self {
        self.duplicated_attributes.push(oid);
        self
    }

    pub fn with_digest_oid(mut self, oid: &'static str) -> Self {
        self.digest_oid = Some(oid);
        self
    }

    pub fn with_signature_oid(mut self, oid: &'static str) -> Self {
        self.signature_oid = Some(oid);
        self
    }

    pub fn corrupt_signature(mut self) -> Self {
        self.corrupt_signature = true;
        self
    }

    fn digest_oid(&self) -> &'static str {
        self.digest_oid.unwrap_or_else(|| self.signer.digest_oid())
    }

    /// DER of this signer info.
    fn encode(&self, content: &[u8]) -> Vec<u8> {
        let signer = self.signer;

        let (issuer, serial) = signer.issuer_and_serial();
        let kid = if self.by_subject_key_identifier {
            signer
                .subject_key_identifier()
                .expect("fixture certificate has a subject key identifier")
        } else {
            Vec::new()
        };
        let (version, sid) = if self.by_subject_key_identifier {
            (3, asn1::element(asn1::CONTEXT_0_PRIMITIVE, &kid))
        } else {
            let ias = IssuerAndSerialNumber {
                issuer: asn1::any(&issuer),
                serial_number: der::asn1::IntRef::new(&serial).expect("fixture serial"),
            };
            (1, asn1::encode(&ias))
        };

        let digest = self.message_digest.clone().unwrap_or_else(|| signer.digest(content));
        let content_type = asn1::oid(self.attribute_content_type.unwrap_or(OID_DATA));
        let content_type_value = asn1::element(Tag::ObjectIdentifier, content_type.as_bytes());
        let digest_value = asn1::element(Tag::OctetString, &digest);
        let signing_time_value = asn1::element(Tag::UtcTime, b"231114221320Z");

        let mut attrs = Vec::new();
        for (oid, value) in [
            (OID_ATTR_CONTENT_TYPE, &content_type_value),
            (OID_ATTR_SIGNING_TIME, &signing_time_value),
            (OID_ATTR_MESSAGE_DIGEST, &digest_value),
        ] {
            if self.omitted_attributes.contains(&oid) {
                continue;
            }
            let attr = Attribute {
                oid: asn1::oid(oid),
                values: SetInOrder(vec![asn1::any(value)]),
            };
            if self.duplicated_attributes.contains(&oid) {
                attrs.push(attr.clone());
            }
            attrs.push(attr);
        }
        let attrs = SetInOrder(attrs);

        let (signed_attrs, mut signature) = if self.signed_attributes {
            // Signed over the attributes with their universal SET tag.
            let signature = signer.sign(&asn1::encode(&attrs));
            (Some(attrs), signature)
        } else {
            (None, signer.sign(content))
        };

        if self.corrupt_signature {
            if let Some(last) = signature.last_mut() {
                *last ^= 0x01;
            }
        }

        let info = SignerInfo {
            version,
            sid: asn1::any(&sid),
            digest_algorithm: AlgorithmIdentifier::new(asn1::oid(self.digest_oid())),
            signed_attrs,
            signature_algorithm: AlgorithmIdentifier::new(asn1::oid(
                self.signature_oid.unwrap_or_else(|| signer.signature_oid()),
            )),
            signature: OctetStringRef::new(&signature).expect("fixture signature length"),
        };
        asn1::encode(&info)
    }
}

/// Assembles a DER `ContentInfo { signedData }`.
pub struct SignedDataBuilder<'a> {
    content: Vec<u8>,
    detached: bool,
    raw_econtent: Option<Vec<u8>>,
    certificates: Vec<Vec<u8>>,
    signers: Vec<SignerConfig<'a>>,
}

impl<'a> SignedDataBuilder<'a> {
    pub fn new(content: &[u8]) -> Self {
        Self {
            content: content.to_vec(),
            detached: false,
            raw_econtent: None,
            certificates: Vec::new(),
            signers: Vec::new(),
        }
    }

    /// Leave `eContent` out of the container.
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Emit `element` verbatim inside `eContent [0]` instead of an OCTET
    /// STRING holding the content. Signatures still cover the content.
    pub fn raw_econtent(mut self, element: &[u8]) -> Self {
        self.raw_econtent = Some(element.to_vec());
        self
    }

    pub fn certificate(mut self, der: &[u8]) -> Self {
        self.certificates.push(der.to_vec());
        self
    }

    /// Add a signer with default settings and embed its certificate.
    pub fn signer(self, signer: &'a dyn TestSigner) -> Self {
        let der = signer.certificate_der().to_vec();
        self.certificate(&der).signer_with(SignerConfig::new(signer))
    }

    /// Add a signer info as described; certificates are not embedded.
    pub fn signer_with(mut self, config: SignerConfig<'a>) -> Self {
        self.signers.push(config);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let econtent = match (&self.raw_econtent, self.detached) {
            (_, true) => None,
            (Some(raw), false) => Some(raw.clone()),
            (None, false) => Some(asn1::element(Tag::OctetString, &self.content)),
        }
        .map(|inner| asn1::element(asn1::CONTEXT_0, &inner));

        let signer_infos: Vec<Vec<u8>> = self.signers.iter().map(|s| s.encode(&self.content)).collect();

        let signed_data = SignedData {
            version: 1,
            digest_algorithms: SetInOrder(
                self.signers
                    .iter()
                    .map(|s| AlgorithmIdentifier::new(asn1::oid(s.digest_oid())))
                    .collect(),
            ),
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: asn1::oid(OID_DATA),
                econtent: econtent.as_deref().map(asn1::any),
            },
            certificates: (!self.certificates.is_empty())
                .then(|| SetInOrder(self.certificates.iter().map(|c| asn1::any(c)).collect())),
            signer_infos: SetInOrder(signer_infos.iter().map(|si| asn1::any(si)).collect()),
        };
        let signed_data = asn1::encode(&signed_data);

        asn1::encode(&ContentInfo {
            content_type: asn1::oid(OID_SIGNED_DATA),
            content: asn1::any(&signed_data),
        })
    }
}

/// Replace the first occurrence of `needle` in `haystack`.
pub fn replace_once_in_place(haystack: &mut [u8], needle: &[u8], replacement: &[u8]) -> bool {
    assert_eq!(needle.len(), replacement.len());
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }

    for i in 0..=(haystack.len() - needle.len()) {
        if &haystack[i..i + needle.len()] == needle {
            haystack[i..i + needle.len()].copy_from_slice(replacement);
            return true;
        }
    }
    false
}
