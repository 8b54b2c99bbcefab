// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test-only fixtures for the pkcs7verify crates.
//!
//! Everything here produces plain DER bytes so the crates under test decode
//! fixtures through their own public entry points. Nothing in this crate is
//! meant for production use.

pub mod asn1;
pub mod cms;
pub mod pki;

pub use cms::{replace_once_in_place, SignedDataBuilder, SignerConfig};
pub use pki::{Identity, P521Identity, RsaIdentity, TestSigner};

/// Reference time inside the validity window of every non-expired fixture
/// (2023-11-14T22:13:20Z).
pub const REFERENCE_TIME: i64 = 1_700_000_000;
