// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod chain;
pub mod trust_store;

pub use chain::{ChainResult, ChainValidator, MAX_CHAIN_DEPTH};
pub use trust_store::{TrustStore, TrustStoreBuilder};
