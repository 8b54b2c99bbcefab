// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! High-level PKCS#7 / CMS signed-message verification facade.
//!
//! This crate is the primary entry point: decode a `SignedData` container,
//! anchor each signer in an explicit [`TrustStore`], check the signature and
//! return a [`Verdict`] with the recovered payload.
//!
//! Design note: there is no process-wide trust state. Every call takes the
//! trust store it should use.

// Internal implementation modules.
mod verifier;

// Public API organization (lib.rs is a publisher).
mod api;
mod verdict;
mod verify_options;

pub use api::{verify, verify_with_options};
pub use verdict::Verdict;
pub use verify_options::{SignerPolicy, VerifyOptions};

pub use pkcs7verify_common::{
    Certificate, ErrorCategory, SignatureContainer, UntrustedReason, VerifyError, VerifyResult,
};
pub use pkcs7verify_x509::{ChainResult, ChainValidator, TrustStore, TrustStoreBuilder};
