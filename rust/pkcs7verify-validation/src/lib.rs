// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod digest;
pub mod signature_verifier;

pub use digest::{digest, digests_match};
pub use signature_verifier::{verify_certificate_signature, verify_signature};
