// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use pkcs7verify_x509::TrustStore;

use crate::{verifier, Verdict, VerifyOptions};

/// Verify a DER PKCS#7 / CMS `SignedData` container against `trust_store`.
///
/// `detached_content` is required when the container carries no payload and
/// must be `None` when it does; supplying both is a malformed input.
pub fn verify(container: &[u8], trust_store: &TrustStore, detached_content: Option<&[u8]>) -> Verdict {
    verifier::verify_container(container, trust_store, detached_content, &VerifyOptions::default())
}

/// [`verify`] with explicit reference time, depth limit and signer policy.
pub fn verify_with_options(
    container: &[u8],
    trust_store: &TrustStore,
    detached_content: Option<&[u8]>,
    options: &VerifyOptions,
) -> Verdict {
    verifier::verify_container(container, trust_store, detached_content, options)
}
