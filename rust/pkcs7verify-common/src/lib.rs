// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoding layer for PKCS#7 / CMS signed messages.
//!
//! Nothing in this crate checks a signature or a trust relationship; it turns
//! untrusted DER into typed values or a [`VerifyError`] describing why it
//! could not.

pub mod algorithms;
mod asn1;
pub mod certificate;
pub mod error;
pub mod signed_data;

pub use algorithms::{DigestAlgorithm, EcCurve, KeyType, PublicKeyAlgorithm, SignatureAlgorithm};
pub use certificate::{Certificate, CertificateId, Name};
pub use error::{ErrorCategory, UntrustedReason, VerifyError, VerifyResult};
pub use signed_data::{SignatureContainer, SignedAttributes, SignerIdentifier, SignerInfo};
