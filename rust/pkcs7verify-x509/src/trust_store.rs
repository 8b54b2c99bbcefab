// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Explicit set of trusted root certificates.
//!
//! A [`TrustStore`] is assembled with a [`TrustStoreBuilder`] and frozen
//! before any verification starts. The frozen store has no mutating methods,
//! so one instance can be shared across threads by reference or `Arc`.

use std::collections::HashMap;

use pkcs7verify_common::{Certificate, CertificateId, VerifyResult};

const LOG_TARGET: &str = "pkcs7verify::trust_store";

#[derive(Debug, Default)]
pub struct TrustStoreBuilder {
    certificates: Vec<Certificate>,
}

impl TrustStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `der` and add it as a trust anchor.
    ///
    /// Fails with `MalformedCertificate` or `UnsupportedAlgorithm` when the
    /// bytes cannot be used as a root; the builder is left unchanged.
    pub fn add_trusted_root(&mut self, der: &[u8]) -> VerifyResult<()> {
        let cert = Certificate::from_der(der)?;
        self.add_trusted_certificate(cert);
        Ok(())
    }

    /// Add an already decoded certificate as a trust anchor.
    pub fn add_trusted_certificate(&mut self, cert: Certificate) {
        if self.certificates.iter().any(|c| c.as_der() == cert.as_der()) {
            tracing::debug!(target: LOG_TARGET, subject = %cert.subject(), "ignoring duplicate trust anchor");
            return;
        }
        self.certificates.push(cert);
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn freeze(self) -> TrustStore {
        let mut by_identity = HashMap::with_capacity(self.certificates.len());
        let mut by_subject: HashMap<Vec<u8>, Vec<usize>> = HashMap::new();
        for (i, cert) in self.certificates.iter().enumerate() {
            // Two anchors may share issuer and serial; the first one keeps the identity slot.
            by_identity.entry(cert.id()).or_insert(i);
            by_subject.entry(cert.subject().as_der().to_vec()).or_default().push(i);
        }

        tracing::debug!(target: LOG_TARGET, anchors = self.certificates.len(), "trust store frozen");

        TrustStore {
            certificates: self.certificates,
            by_identity,
            by_subject,
        }
    }
}

/// Read-only set of trust anchors, keyed by issuer and serial number.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    certificates: Vec<Certificate>,
    by_identity: HashMap<CertificateId, usize>,
    by_subject: HashMap<Vec<u8>, Vec<usize>>,
}

impl TrustStore {
    pub fn builder() -> TrustStoreBuilder {
        TrustStoreBuilder::new()
    }

    /// Convenience constructor from DER roots.
    pub fn from_roots<I, B>(roots: I) -> VerifyResult<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut builder = TrustStoreBuilder::new();
        for root in roots {
            builder.add_trusted_root(root.as_ref())?;
        }
        Ok(builder.freeze())
    }

    /// True when `cert` is one of the anchors, byte for byte.
    pub fn contains(&self, cert: &Certificate) -> bool {
        if let Some(&i) = self.by_identity.get(&cert.id()) {
            if self.certificates[i].as_der() == cert.as_der() {
                return true;
            }
        }
        // Identity collision with a different encoding: fall back to the subject index.
        self.with_subject(cert.subject().as_der())
            .any(|c| c.as_der() == cert.as_der())
    }

    pub fn find_by_issuer_and_serial(&self, issuer: &[u8], serial: &[u8]) -> Option<&Certificate> {
        let id = CertificateId {
            issuer: issuer.to_vec(),
            serial: serial.to_vec(),
        };
        self.by_identity.get(&id).map(|&i| &self.certificates[i])
    }

    /// Anchors whose subject matches `cert`'s issuer name.
    pub fn issuers_of<'a>(&'a self, cert: &Certificate) -> impl Iterator<Item = &'a Certificate> + 'a {
        self.with_subject(cert.issuer().as_der())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.iter()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    fn with_subject<'a>(&'a self, subject: &[u8]) -> impl Iterator<Item = &'a Certificate> + 'a {
        self.by_subject
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.certificates[i])
    }
}
