// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate path building from a signer to a trust anchor.
//!
//! The walk starts at the signer and repeatedly looks for an issuer, first
//! among the certificates supplied with the message and then among the
//! anchors. A candidate must carry the current certificate's issuer name as
//! its subject and its key must verify the current certificate's signature.
//! The walk ends successfully at the first certificate that is itself in the
//! trust store.
//!
//! Every step is bounded: the path can never be longer than `max_depth`, and
//! a certificate can appear on it only once.

use std::time::{SystemTime, UNIX_EPOCH};

use pkcs7verify_common::{Certificate, UntrustedReason, VerifyError, VerifyResult};
use pkcs7verify_validation::verify_certificate_signature;

use crate::trust_store::TrustStore;

/// Longest path accepted by default, signer and anchor included.
pub const MAX_CHAIN_DEPTH: usize = 10;

const LOG_TARGET: &str = "pkcs7verify::chain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainResult {
    /// Signer first, anchor last.
    Trusted(Vec<Certificate>),
    Untrusted(UntrustedReason),
}

impl ChainResult {
    pub fn is_trusted(&self) -> bool {
        matches!(self, ChainResult::Trusted(_))
    }

    pub fn into_result(self) -> VerifyResult<Vec<Certificate>> {
        match self {
            ChainResult::Trusted(path) => Ok(path),
            ChainResult::Untrusted(reason) => Err(VerifyError::Untrusted(reason)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChainValidator<'s> {
    store: &'s TrustStore,
    reference_time: Option<i64>,
    max_depth: usize,
}

impl<'s> ChainValidator<'s> {
    pub fn new(store: &'s TrustStore) -> Self {
        Self {
            store,
            reference_time: None,
            max_depth: MAX_CHAIN_DEPTH,
        }
    }

    /// Check validity windows at `unix_seconds` instead of the current time.
    pub fn with_reference_time(mut self, unix_seconds: i64) -> Self {
        self.reference_time = Some(unix_seconds);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build a path from `signer` to an anchor, using `available` as intermediates.
    pub fn validate(&self, signer: &Certificate, available: &[Certificate]) -> ChainResult {
        let now = self.reference_time.unwrap_or_else(now_unix_seconds);
        let result = self.walk(signer, available, now);

        match &result {
            ChainResult::Trusted(path) => tracing::debug!(
                target: LOG_TARGET,
                signer = %signer.subject(),
                depth = path.len(),
                "certificate path built"
            ),
            ChainResult::Untrusted(reason) => tracing::debug!(
                target: LOG_TARGET,
                signer = %signer.subject(),
                %reason,
                "certificate path rejected"
            ),
        }
        result
    }

    fn walk(&self, signer: &Certificate, available: &[Certificate], now: i64) -> ChainResult {
        let mut path: Vec<Certificate> = Vec::new();
        let mut current = signer.clone();

        loop {
            if path.iter().any(|c| c.as_der() == current.as_der()) {
                return ChainResult::Untrusted(UntrustedReason::Cycle);
            }
            if path.len() >= self.max_depth {
                return ChainResult::Untrusted(UntrustedReason::TooLong);
            }
            if !current.is_valid_at(now) {
                tracing::trace!(
                    target: LOG_TARGET,
                    subject = %current.subject(),
                    not_before = current.not_before(),
                    not_after = current.not_after(),
                    now,
                    "certificate outside its validity window"
                );
                return ChainResult::Untrusted(UntrustedReason::Expired);
            }

            let anchored = self.store.contains(&current);
            path.push(current);
            if anchored {
                return ChainResult::Trusted(path);
            }

            let Some(last) = path.last() else {
                return ChainResult::Untrusted(UntrustedReason::NoPath);
            };
            current = match self.find_issuer(last, available, &path) {
                Ok(issuer) => issuer,
                Err(reason) => return ChainResult::Untrusted(reason),
            };
        }
    }

    fn find_issuer(
        &self,
        current: &Certificate,
        available: &[Certificate],
        path: &[Certificate],
    ) -> Result<Certificate, UntrustedReason> {
        let issuer_name = current.issuer().as_der();
        let candidates = available
            .iter()
            .filter(|c| c.subject().as_der() == issuer_name)
            .chain(self.store.issuers_of(current));

        let mut only_visited = false;
        for candidate in candidates {
            // A self-signed certificate that is not an anchor cannot extend the path.
            if candidate.as_der() == current.as_der() {
                continue;
            }
            if candidate.is_ca() == Some(false) {
                tracing::trace!(
                    target: LOG_TARGET,
                    candidate = %candidate.subject(),
                    "skipping issuer candidate with cA=false"
                );
                continue;
            }
            if !verify_certificate_signature(current, candidate) {
                continue;
            }
            if path.iter().any(|p| p.as_der() == candidate.as_der()) {
                only_visited = true;
                continue;
            }
            return Ok(candidate.clone());
        }

        Err(if only_visited {
            UntrustedReason::Cycle
        } else {
            UntrustedReason::NoPath
        })
    }
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
