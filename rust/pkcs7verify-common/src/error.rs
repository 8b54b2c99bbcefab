// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error taxonomy shared by every stage of verification.
//!
//! Each variant belongs to exactly one [`ErrorCategory`], so callers can tell
//! corrupt or hostile input apart from trust-policy failures and from
//! cryptographic mismatches when writing audit records.

use std::fmt;

use thiserror::Error;

/// Result type used across the pkcs7verify crates.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Why a certificate path could not be anchored in the trust store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UntrustedReason {
    /// No issuer could be found for some certificate on the path.
    NoPath,
    /// A certificate already on the path was selected again as an issuer.
    Cycle,
    /// A certificate on the path is outside its validity window at the reference time.
    Expired,
    /// The path exceeded the configured maximum depth.
    TooLong,
}

impl UntrustedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UntrustedReason::NoPath => "no path",
            UntrustedReason::Cycle => "cycle",
            UntrustedReason::Expired => "expired",
            UntrustedReason::TooLong => "too long",
        }
    }
}

impl fmt::Display for UntrustedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`VerifyError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The input bytes are corrupt, truncated or structurally wrong.
    MalformedInput,
    /// The input is well formed but uses an algorithm or content type this crate does not implement.
    Unsupported,
    /// The signer could not be tied to a trusted root.
    UntrustedChain,
    /// A digest or signature did not match: tampering or the wrong key.
    CryptographicMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("untrusted: {0}")]
    Untrusted(UntrustedReason),

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("message digest does not match content")]
    DigestMismatch,

    #[error("signer certificate not found")]
    SignerCertificateNotFound,

    #[error("detached signature requires content bytes")]
    MissingContent,

    #[error("no valid signer")]
    NoValidSigner,
}

impl VerifyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            VerifyError::MalformedCertificate(_)
            | VerifyError::MalformedContainer(_)
            | VerifyError::SignerCertificateNotFound
            | VerifyError::MissingContent => ErrorCategory::MalformedInput,
            VerifyError::UnsupportedAlgorithm(_) | VerifyError::UnsupportedContentType(_) => {
                ErrorCategory::Unsupported
            }
            VerifyError::Untrusted(_) | VerifyError::NoValidSigner => ErrorCategory::UntrustedChain,
            VerifyError::SignatureMismatch | VerifyError::DigestMismatch => {
                ErrorCategory::CryptographicMismatch
            }
        }
    }

    /// Stable machine-readable code for this failure.
    pub fn error_code(&self) -> &'static str {
        match self {
            VerifyError::MalformedCertificate(_) => "MALFORMED_CERTIFICATE",
            VerifyError::MalformedContainer(_) => "MALFORMED_CONTAINER",
            VerifyError::UnsupportedAlgorithm(_) => "UNSUPPORTED_ALGORITHM",
            VerifyError::UnsupportedContentType(_) => "UNSUPPORTED_CONTENT_TYPE",
            VerifyError::Untrusted(_) => "UNTRUSTED",
            VerifyError::SignatureMismatch => "SIGNATURE_MISMATCH",
            VerifyError::DigestMismatch => "DIGEST_MISMATCH",
            VerifyError::SignerCertificateNotFound => "SIGNER_CERT_NOT_FOUND",
            VerifyError::MissingContent => "MISSING_CONTENT",
            VerifyError::NoValidSigner => "NO_VALID_SIGNER",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrusted_reasons_render_short_phrases() {
        assert_eq!(VerifyError::Untrusted(UntrustedReason::Cycle).to_string(), "untrusted: cycle");
        assert_eq!(VerifyError::Untrusted(UntrustedReason::TooLong).to_string(), "untrusted: too long");
        assert_eq!(UntrustedReason::NoPath.as_str(), "no path");
        assert_eq!(UntrustedReason::Expired.as_str(), "expired");
    }

    #[test]
    fn categories_separate_input_policy_and_crypto_failures() {
        assert_eq!(
            VerifyError::MalformedContainer("x".into()).category(),
            ErrorCategory::MalformedInput
        );
        assert_eq!(
            VerifyError::Untrusted(UntrustedReason::NoPath).category(),
            ErrorCategory::UntrustedChain
        );
        assert_eq!(VerifyError::SignatureMismatch.category(), ErrorCategory::CryptographicMismatch);
        assert_eq!(VerifyError::DigestMismatch.category(), ErrorCategory::CryptographicMismatch);
        assert_eq!(
            VerifyError::UnsupportedAlgorithm("1.2.3".into()).category(),
            ErrorCategory::Unsupported
        );
    }
}
