// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! X.509 certificate decoding.
//!
//! Structural parsing is delegated to `x509-parser`; this module keeps the
//! pieces later stages need (exact TBS and SPKI encodings, names as DER) and
//! rejects keys and algorithms the verifier cannot use.

use std::fmt;

use x509_parser::extensions::ParsedExtension;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use crate::algorithms::{oid, EcCurve, PublicKeyAlgorithm, SignatureAlgorithm};
use crate::error::{VerifyError, VerifyResult};

/// A distinguished name: exact DER plus a display rendering.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
    der: Vec<u8>,
    display: String,
}

impl Name {
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.display)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Canonical identity of a certificate: issuer DER + serial number bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertificateId {
    pub issuer: Vec<u8>,
    pub serial: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    serial_number: Vec<u8>,
    issuer: Name,
    subject: Name,
    not_before: i64,
    not_after: i64,
    public_key_algorithm: PublicKeyAlgorithm,
    public_key: Vec<u8>,
    spki: Vec<u8>,
    signature_algorithm: SignatureAlgorithm,
    signature: Vec<u8>,
    tbs: Vec<u8>,
    subject_key_identifier: Option<Vec<u8>>,
    is_ca: Option<bool>,
    raw: Vec<u8>,
}

impl Certificate {
    /// Decode a DER certificate.
    ///
    /// Fails with [`VerifyError::MalformedCertificate`] for anything that is
    /// not exactly one well-formed certificate with a usable public key, and
    /// with [`VerifyError::UnsupportedAlgorithm`] when the key or signature
    /// algorithm is outside the supported table.
    pub fn from_der(der: &[u8]) -> VerifyResult<Self> {
        if der.is_empty() {
            return Err(VerifyError::MalformedCertificate("empty input".to_string()));
        }

        let (rest, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| VerifyError::MalformedCertificate(format!("invalid cert DER: {e}")))?;
        if !rest.is_empty() {
            return Err(VerifyError::MalformedCertificate(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        let signature_oid = cert.signature_algorithm.algorithm.to_id_string();
        let signature_algorithm = SignatureAlgorithm::from_oid(&signature_oid)
            .filter(|a| a.digest().is_some())
            .ok_or_else(|| {
                VerifyError::UnsupportedAlgorithm(format!(
                    "certificate signature algorithm {signature_oid}"
                ))
            })?;

        let tbs = &cert.tbs_certificate;
        let (public_key_algorithm, public_key) = decode_public_key(&tbs.subject_pki)?;

        let mut subject_key_identifier = None;
        let mut is_ca = None;
        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::SubjectKeyIdentifier(kid) => {
                    subject_key_identifier = Some(kid.0.to_vec());
                }
                ParsedExtension::BasicConstraints(bc) => is_ca = Some(bc.ca),
                _ => {}
            }
        }

        Ok(Self {
            serial_number: tbs.raw_serial().to_vec(),
            issuer: Name {
                der: tbs.issuer.as_raw().to_vec(),
                display: tbs.issuer.to_string(),
            },
            subject: Name {
                der: tbs.subject.as_raw().to_vec(),
                display: tbs.subject.to_string(),
            },
            not_before: tbs.validity.not_before.timestamp(),
            not_after: tbs.validity.not_after.timestamp(),
            public_key_algorithm,
            public_key,
            spki: tbs.subject_pki.raw.to_vec(),
            signature_algorithm,
            signature: cert.signature_value.data.to_vec(),
            tbs: tbs.as_ref().to_vec(),
            subject_key_identifier,
            is_ca,
            raw: der.to_vec(),
        })
    }

    /// Serial number as the big-endian INTEGER content octets.
    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    /// Start of the validity window, Unix seconds.
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// End of the validity window, Unix seconds.
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    pub fn public_key_algorithm(&self) -> PublicKeyAlgorithm {
        self.public_key_algorithm
    }

    /// Contents of the `subjectPublicKey` BIT STRING.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// DER of the complete SubjectPublicKeyInfo.
    pub fn spki_der(&self) -> &[u8] {
        &self.spki
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// DER of the TBSCertificate, the bytes the issuer signed.
    pub fn tbs_der(&self) -> &[u8] {
        &self.tbs
    }

    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        self.subject_key_identifier.as_deref()
    }

    /// `cA` flag of basicConstraints, `None` when the extension is absent.
    pub fn is_ca(&self) -> Option<bool> {
        self.is_ca
    }

    pub fn as_der(&self) -> &[u8] {
        &self.raw
    }

    pub fn id(&self) -> CertificateId {
        CertificateId {
            issuer: self.issuer.der.clone(),
            serial: self.serial_number.clone(),
        }
    }

    pub fn is_self_issued(&self) -> bool {
        self.issuer.der == self.subject.der
    }

    pub fn is_valid_at(&self, unix_seconds: i64) -> bool {
        self.not_before <= unix_seconds && unix_seconds <= self.not_after
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("serial_len", &self.serial_number.len())
            .field("key", &self.public_key_algorithm)
            .finish()
    }
}

fn decode_public_key(spki: &SubjectPublicKeyInfo<'_>) -> VerifyResult<(PublicKeyAlgorithm, Vec<u8>)> {
    let malformed = |e: String| VerifyError::MalformedCertificate(format!("subject public key: {e}"));

    let key_oid = spki.algorithm.algorithm.to_id_string();
    let key = spki.subject_public_key.data.as_ref();
    if key.is_empty() {
        return Err(malformed("empty public key".to_string()));
    }

    let algorithm = match key_oid.as_str() {
        oid::RSA_ENCRYPTION => match spki.parsed() {
            Ok(PublicKey::RSA(rsa)) if !rsa.modulus.is_empty() && !rsa.exponent.is_empty() => {
                PublicKeyAlgorithm::Rsa
            }
            Ok(_) => return Err(malformed("empty RSA key component".to_string())),
            Err(e) => return Err(malformed(format!("invalid RSAPublicKey: {e}"))),
        },
        oid::EC_PUBLIC_KEY => {
            let curve_oid = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.as_oid().ok())
                .map(|o| o.to_id_string())
                .ok_or_else(|| malformed("EC key without a named curve".to_string()))?;
            let curve = EcCurve::from_oid(&curve_oid).ok_or_else(|| {
                VerifyError::UnsupportedAlgorithm(format!("elliptic curve {curve_oid}"))
            })?;
            match spki.parsed() {
                Ok(PublicKey::EC(point)) => check_ec_point(curve, point.data()).map_err(malformed)?,
                Ok(_) => return Err(malformed("EC key did not decode as a point".to_string())),
                Err(e) => return Err(malformed(format!("invalid EC point: {e}"))),
            }
            PublicKeyAlgorithm::Ec(curve)
        }
        other => {
            return Err(VerifyError::UnsupportedAlgorithm(format!(
                "public key algorithm {other}"
            )))
        }
    };

    Ok((algorithm, key.to_vec()))
}

fn check_ec_point(curve: EcCurve, point: &[u8]) -> Result<(), String> {
    let n = curve.field_len();
    let ok = match point.first() {
        Some(0x04) => point.len() == 1 + 2 * n,
        Some(0x02) | Some(0x03) => point.len() == 1 + n,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("EC point of {} bytes does not fit {curve:?}", point.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(
            Certificate::from_der(&[]),
            Err(VerifyError::MalformedCertificate(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            Certificate::from_der(b"12121\0"),
            Err(VerifyError::MalformedCertificate(_))
        ));
    }

    #[test]
    fn ec_point_length_must_match_curve() {
        let mut p = vec![0x04];
        p.extend([1u8; 64]);
        assert!(check_ec_point(EcCurve::P256, &p).is_ok());
        assert!(check_ec_point(EcCurve::P384, &p).is_err());
        assert!(check_ec_point(EcCurve::P256, &[0x05; 65]).is_err());
        assert!(check_ec_point(EcCurve::P256, &[0x02; 33]).is_ok());
    }
}
