// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate and key fixtures.
//!
//! P-256 and P-384 identities are issued with `rcgen`. `rcgen` cannot
//! generate RSA keys, so [`RsaIdentity`] imports one generated with the `rsa`
//! crate. Its default backend has no P-521 support at all, so
//! [`P521Identity`] encodes its certificate with `der` and has it signed by
//! an rcgen-issued CA key.

use std::time::Duration;

use der::asn1::{BitStringRef, UtcTime};
use p256::pkcs8::DecodePrivateKey as _;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    PKCS_ECDSA_P256_SHA256, PKCS_ECDSA_P384_SHA384,
};
use rsa::pkcs8::EncodePrivateKey as _;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use signature::Signer as _;
use x509_parser::extensions::ParsedExtension;

use crate::asn1::{
    self, AlgorithmIdentifier, SubjectPublicKeyInfo, TbsCertificate, Validity,
};

pub const OID_SHA256: &str = "2.16.840.1.101.3.4.2.1";
pub const OID_SHA384: &str = "2.16.840.1.101.3.4.2.2";
pub const OID_SHA512: &str = "2.16.840.1.101.3.4.2.3";
pub const OID_ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
pub const OID_ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
pub const OID_ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
pub const OID_SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
pub const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";

/// Something that can sign a fixture: a certificate plus its private key.
pub trait TestSigner {
    fn certificate_der(&self) -> &[u8];

    /// Sign `message`, hashing it with [`TestSigner::digest`].
    fn sign(&self, message: &[u8]) -> Vec<u8>;

    fn digest(&self, data: &[u8]) -> Vec<u8>;

    fn digest_oid(&self) -> &'static str;

    fn signature_oid(&self) -> &'static str;

    /// Issuer name DER and serial number content octets of the certificate.
    fn issuer_and_serial(&self) -> (Vec<u8>, Vec<u8>) {
        let (_, cert) = x509_parser::parse_x509_certificate(self.certificate_der())
            .expect("fixture certificate parses");
        (cert.tbs_certificate.issuer.as_raw().to_vec(), cert.tbs_certificate.raw_serial().to_vec())
    }

    fn subject_key_identifier(&self) -> Option<Vec<u8>> {
        let (_, cert) = x509_parser::parse_x509_certificate(self.certificate_der())
            .expect("fixture certificate parses");
        cert.extensions().iter().find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(kid) => Some(kid.0.to_vec()),
            _ => None,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Curve {
    P256,
    P384,
}

/// An EC certificate issued with `rcgen`, together with its key.
pub struct Identity {
    common_name: String,
    curve: Curve,
    key: KeyPair,
    cert: rcgen::Certificate,
    der: Vec<u8>,
}

impl Identity {
    /// Self-signed P-256 CA.
    pub fn root(cn: &str) -> Self {
        Self::issue(cn, ca_params(cn), Curve::P256, None)
    }

    /// Self-signed P-384 CA.
    pub fn root_p384(cn: &str) -> Self {
        Self::issue(cn, ca_params(cn), Curve::P384, None)
    }

    /// P-256 CA issued by `issuer`.
    pub fn intermediate(cn: &str, issuer: &Identity) -> Self {
        Self::issue(cn, ca_params(cn), Curve::P256, Some(issuer))
    }

    /// P-256 end-entity certificate issued by `issuer`, without basicConstraints.
    pub fn leaf(cn: &str, issuer: &Identity) -> Self {
        Self::issue(cn, leaf_params(cn), Curve::P256, Some(issuer))
    }

    /// End-entity certificate carrying basicConstraints with `cA` false.
    pub fn explicit_leaf(cn: &str, issuer: &Identity) -> Self {
        let mut params = leaf_params(cn);
        params.is_ca = IsCa::ExplicitNoCa;
        Self::issue(cn, params, Curve::P256, Some(issuer))
    }

    /// End-entity certificate whose validity ended on 2000-01-01.
    pub fn expired_leaf(cn: &str, issuer: &Identity) -> Self {
        Self::issue(cn, expired(leaf_params(cn)), Curve::P256, Some(issuer))
    }

    /// Self-signed P-256 CA whose validity ended on 2000-01-01.
    pub fn expired_root(cn: &str) -> Self {
        Self::issue(cn, expired(ca_params(cn)), Curve::P256, None)
    }

    /// P-256 CA issued by `issuer` whose validity ended on 2000-01-01.
    pub fn expired_intermediate(cn: &str, issuer: &Identity) -> Self {
        Self::issue(cn, expired(ca_params(cn)), Curve::P256, Some(issuer))
    }

    /// End-entity certificate with a chosen serial number, for building
    /// certificates that share an issuer and serial.
    pub fn leaf_with_serial(cn: &str, issuer: &Identity, serial: &[u8]) -> Self {
        let mut params = leaf_params(cn);
        params.serial_number = Some(rcgen::SerialNumber::from_slice(serial));
        Self::issue(cn, params, Curve::P256, Some(issuer))
    }

    /// A second certificate for `original`'s subject and key, issued by `issuer`.
    pub fn cross_signed(original: &Identity, issuer: &Identity) -> Self {
        let key = KeyPair::try_from(original.key.serialize_der().as_slice()).expect("re-import fixture key");
        let cert = ca_params(&original.common_name)
            .signed_by(&key, &issuer.cert, &issuer.key)
            .expect("rcgen cross-sign");
        Self::from_parts(original.common_name.clone(), original.curve, key, cert)
    }

    /// Issue a certificate from explicit parameters; `cn` must match the subject in `params`.
    pub fn issue(cn: &str, params: CertificateParams, curve: Curve, issuer: Option<&Identity>) -> Self {
        let alg = match curve {
            Curve::P256 => &PKCS_ECDSA_P256_SHA256,
            Curve::P384 => &PKCS_ECDSA_P384_SHA384,
        };
        let key = KeyPair::generate_for(alg).expect("rcgen key generation");
        let cert = match issuer {
            None => params.self_signed(&key).expect("rcgen self-sign"),
            Some(issuer) => params
                .signed_by(&key, &issuer.cert, &issuer.key)
                .expect("rcgen sign"),
        };
        Self::from_parts(cn.to_string(), curve, key, cert)
    }

    fn from_parts(common_name: String, curve: Curve, key: KeyPair, cert: rcgen::Certificate) -> Self {
        let der = cert.der().to_vec();
        Self {
            common_name,
            curve,
            key,
            cert,
            der,
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn common_name(&self) -> &str {
        &self.common_name
    }
}

impl TestSigner for Identity {
    fn certificate_der(&self) -> &[u8] {
        &self.der
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let pkcs8 = self.key.serialize_der();
        match self.curve {
            Curve::P256 => {
                let sk = p256::ecdsa::SigningKey::from_pkcs8_der(&pkcs8).expect("P-256 key");
                let sig: p256::ecdsa::Signature = sk.sign(message);
                sig.to_der().as_bytes().to_vec()
            }
            Curve::P384 => {
                let sk = p384::ecdsa::SigningKey::from_pkcs8_der(&pkcs8).expect("P-384 key");
                let sig: p384::ecdsa::Signature = sk.sign(message);
                sig.to_der().as_bytes().to_vec()
            }
        }
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self.curve {
            Curve::P256 => Sha256::digest(data).to_vec(),
            Curve::P384 => Sha384::digest(data).to_vec(),
        }
    }

    fn digest_oid(&self) -> &'static str {
        match self.curve {
            Curve::P256 => OID_SHA256,
            Curve::P384 => OID_SHA384,
        }
    }

    fn signature_oid(&self) -> &'static str {
        match self.curve {
            Curve::P256 => OID_ECDSA_WITH_SHA256,
            Curve::P384 => OID_ECDSA_WITH_SHA384,
        }
    }
}

pub fn ca_params(cn: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

fn expired(mut params: CertificateParams) -> CertificateParams {
    params.not_before = rcgen::date_time_ymd(1990, 1, 1);
    params.not_after = rcgen::date_time_ymd(2000, 1, 1);
    params
}

pub fn leaf_params(cn: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    params.is_ca = IsCa::NoCa;
    params
}

/// Self-signed RSA-2048 CA certificate signed with sha256WithRSAEncryption.
pub struct RsaIdentity {
    key: RsaPrivateKey,
    der: Vec<u8>,
}

impl RsaIdentity {
    pub fn self_signed(cn: &str) -> Self {
        let key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, 2048).expect("RSA key generation");
        let pkcs8 = key.to_pkcs8_der().expect("RSA PKCS#8 export");
        // rcgen picks PKCS_RSA_SHA256 for an imported RSA key.
        let key_pair = KeyPair::try_from(pkcs8.as_bytes()).expect("rcgen RSA key import");
        let cert = ca_params(cn).self_signed(&key_pair).expect("rcgen RSA self-sign");
        Self {
            key,
            der: cert.der().to_vec(),
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

impl TestSigner for RsaIdentity {
    fn certificate_der(&self) -> &[u8] {
        &self.der
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(message))
            .expect("RSA sign")
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn digest_oid(&self) -> &'static str {
        OID_SHA256
    }

    fn signature_oid(&self) -> &'static str {
        OID_SHA256_WITH_RSA
    }
}

/// P-521 end-entity certificate issued by a P-256 [`Identity`].
pub struct P521Identity {
    key: p521::ecdsa::SigningKey,
    der: Vec<u8>,
}

impl P521Identity {
    pub fn leaf(cn: &str, issuer: &Identity) -> Self {
        assert_eq!(issuer.curve, Curve::P256, "P-521 fixtures are issued by P-256 CAs");

        let key = p521::ecdsa::SigningKey::random(&mut rsa::rand_core::OsRng);
        let point = p521::ecdsa::VerifyingKey::from(&key).to_encoded_point(false);
        let curve = asn1::encode(&asn1::OID_SECP521R1);
        let issuer_name = issuer_subject(issuer.der());
        let subject_name = asn1::common_name(cn);
        let serial = [0x52, 0x10];
        let signature_algorithm = AlgorithmIdentifier::new(asn1::oid(OID_ECDSA_WITH_SHA256));

        let tbs = TbsCertificate {
            version: 2,
            serial_number: der::asn1::IntRef::new(&serial).expect("fixture serial"),
            signature: signature_algorithm,
            issuer: asn1::any(&issuer_name),
            validity: Validity {
                not_before: utc(1_577_836_800),
                not_after: utc(2_524_607_999),
            },
            subject: asn1::any(&subject_name),
            subject_public_key_info: SubjectPublicKeyInfo {
                algorithm: AlgorithmIdentifier {
                    oid: asn1::OID_EC_PUBLIC_KEY,
                    parameters: Some(asn1::any(&curve)),
                },
                subject_public_key: BitStringRef::from_bytes(point.as_bytes()).expect("EC point"),
            },
        };
        let tbs = asn1::encode(&tbs);
        let signature = issuer.sign(&tbs);

        let der = asn1::encode(&asn1::Certificate {
            tbs_certificate: asn1::any(&tbs),
            signature_algorithm,
            signature: BitStringRef::from_bytes(&signature).expect("certificate signature"),
        });
        Self { key, der }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

impl TestSigner for P521Identity {
    fn certificate_der(&self) -> &[u8] {
        &self.der
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: p521::ecdsa::Signature = self.key.sign(message);
        sig.to_der().as_bytes().to_vec()
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        Sha512::digest(data).to_vec()
    }

    fn digest_oid(&self) -> &'static str {
        OID_SHA512
    }

    fn signature_oid(&self) -> &'static str {
        OID_ECDSA_WITH_SHA512
    }
}

fn issuer_subject(cert_der: &[u8]) -> Vec<u8> {
    let (_, cert) = x509_parser::parse_x509_certificate(cert_der).expect("fixture certificate parses");
    cert.tbs_certificate.subject.as_raw().to_vec()
}

fn utc(unix_seconds: u64) -> UtcTime {
    UtcTime::from_unix_duration(Duration::from_secs(unix_seconds)).expect("fixture time in UTCTime range")
}
