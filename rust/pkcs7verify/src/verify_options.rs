// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use pkcs7verify_x509::MAX_CHAIN_DEPTH;

/// How many signer infos must verify for the container to be accepted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SignerPolicy {
    /// The first signer that fully verifies makes the container valid.
    #[default]
    AnyOf,
    /// Every signer must verify; the verdict reports the first one.
    AllOf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Time used for certificate validity checks, Unix seconds. `None` means now.
    pub reference_time: Option<i64>,
    /// Longest accepted certificate path, signer and anchor included.
    pub max_chain_depth: usize,
    pub signer_policy: SignerPolicy,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            reference_time: None,
            max_chain_depth: MAX_CHAIN_DEPTH,
            signer_policy: SignerPolicy::AnyOf,
        }
    }
}
