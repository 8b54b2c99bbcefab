// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Outcome of a verification call.

use pkcs7verify_common::{Certificate, VerifyError, VerifyResult};

/// Result of [`crate::verify`].
///
/// `Invalid` carries the reason for the last signer that failed, or the
/// decode error when the container could not be read at all.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid {
        signer: Certificate,
        /// Signer first, trust anchor last.
        chain: Vec<Certificate>,
        /// The signed content: the detached bytes or the enveloped payload.
        payload: Vec<u8>,
    },
    Invalid(VerifyError),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Verdict::Valid { payload, .. } => Some(payload.as_slice()),
            Verdict::Invalid(_) => None,
        }
    }

    pub fn signer(&self) -> Option<&Certificate> {
        match self {
            Verdict::Valid { signer, .. } => Some(signer),
            Verdict::Invalid(_) => None,
        }
    }

    pub fn chain(&self) -> Option<&[Certificate]> {
        match self {
            Verdict::Valid { chain, .. } => Some(chain.as_slice()),
            Verdict::Invalid(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&VerifyError> {
        match self {
            Verdict::Valid { .. } => None,
            Verdict::Invalid(e) => Some(e),
        }
    }

    /// The signer and payload, or the failure as an error.
    pub fn into_result(self) -> VerifyResult<(Certificate, Vec<u8>)> {
        match self {
            Verdict::Valid { signer, payload, .. } => Ok((signer, payload)),
            Verdict::Invalid(e) => Err(e),
        }
    }
}

impl From<VerifyError> for Verdict {
    fn from(e: VerifyError) -> Self {
        Verdict::Invalid(e)
    }
}
