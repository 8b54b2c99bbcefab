// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Object identifiers and the algorithm table this workspace supports.

pub mod oid {
    pub const SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
    pub const DATA: &str = "1.2.840.113549.1.7.1";

    pub const ATTR_CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";
    pub const ATTR_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";

    pub const SHA1: &str = "1.3.14.3.2.26";
    pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";
    pub const SHA384: &str = "2.16.840.1.101.3.4.2.2";
    pub const SHA512: &str = "2.16.840.1.101.3.4.2.3";

    pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
    pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
    pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
    pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
    pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";

    pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
    pub const ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";
    pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
    pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
    pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";

    pub const CURVE_P256: &str = "1.2.840.10045.3.1.7";
    pub const CURVE_P384: &str = "1.3.132.0.34";
    pub const CURVE_P521: &str = "1.3.132.0.35";
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            oid::SHA1 => Some(Self::Sha1),
            oid::SHA256 => Some(Self::Sha256),
            oid::SHA384 => Some(Self::Sha384),
            oid::SHA512 => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn oid(&self) -> &'static str {
        match self {
            Self::Sha1 => oid::SHA1,
            Self::Sha256 => oid::SHA256,
            Self::Sha384 => oid::SHA384,
            Self::Sha512 => oid::SHA512,
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyType {
    Rsa,
    Ec,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            oid::CURVE_P256 => Some(Self::P256),
            oid::CURVE_P384 => Some(Self::P384),
            oid::CURVE_P521 => Some(Self::P521),
            _ => None,
        }
    }

    /// Size in bytes of one field element (one affine coordinate).
    pub fn field_len(&self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

/// Algorithm of a certificate's subject public key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PublicKeyAlgorithm {
    Rsa,
    Ec(EcCurve),
}

impl PublicKeyAlgorithm {
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa => KeyType::Rsa,
            Self::Ec(_) => KeyType::Ec,
        }
    }
}

/// Signature algorithm, optionally bound to a digest.
///
/// CMS signer infos commonly carry the bare key algorithm (`rsaEncryption`,
/// `id-ecPublicKey`) and take the digest from `digestAlgorithm`; those map to
/// `digest: None`. Certificates always use a digest-bound identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    RsaPkcs1v15 { digest: Option<DigestAlgorithm> },
    Ecdsa { digest: Option<DigestAlgorithm> },
}

impl SignatureAlgorithm {
    pub fn from_oid(oid: &str) -> Option<Self> {
        use DigestAlgorithm::*;
        let alg = match oid {
            oid::RSA_ENCRYPTION => Self::RsaPkcs1v15 { digest: None },
            oid::SHA1_WITH_RSA => Self::RsaPkcs1v15 { digest: Some(Sha1) },
            oid::SHA256_WITH_RSA => Self::RsaPkcs1v15 { digest: Some(Sha256) },
            oid::SHA384_WITH_RSA => Self::RsaPkcs1v15 { digest: Some(Sha384) },
            oid::SHA512_WITH_RSA => Self::RsaPkcs1v15 { digest: Some(Sha512) },
            oid::EC_PUBLIC_KEY => Self::Ecdsa { digest: None },
            oid::ECDSA_WITH_SHA1 => Self::Ecdsa { digest: Some(Sha1) },
            oid::ECDSA_WITH_SHA256 => Self::Ecdsa { digest: Some(Sha256) },
            oid::ECDSA_WITH_SHA384 => Self::Ecdsa { digest: Some(Sha384) },
            oid::ECDSA_WITH_SHA512 => Self::Ecdsa { digest: Some(Sha512) },
            _ => return None,
        };
        Some(alg)
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Self::RsaPkcs1v15 { .. } => KeyType::Rsa,
            Self::Ecdsa { .. } => KeyType::Ec,
        }
    }

    pub fn digest(&self) -> Option<DigestAlgorithm> {
        match self {
            Self::RsaPkcs1v15 { digest } | Self::Ecdsa { digest } => *digest,
        }
    }
}
