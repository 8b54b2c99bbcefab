// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signed-message verification pipeline.
//!
//! - Decode the container.
//! - Pick the content: detached bytes or the enveloped payload, never both.
//! - For each signer info: try each matching certificate in turn; build a
//!   trusted path, cross-check signed attributes, verify the signature.
//! - Apply the signer policy.

use pkcs7verify_common::{
    Certificate, SignatureContainer, SignerIdentifier, SignerInfo, VerifyError, VerifyResult,
};
use pkcs7verify_validation::{digest, digests_match, verify_signature};
use pkcs7verify_x509::{ChainValidator, TrustStore};

use crate::{SignerPolicy, Verdict, VerifyOptions};

const LOG_TARGET: &str = "pkcs7verify::verifier";

pub(crate) fn verify_container(
    container: &[u8],
    trust_store: &TrustStore,
    detached_content: Option<&[u8]>,
    options: &VerifyOptions,
) -> Verdict {
    let verdict = evaluate(container, trust_store, detached_content, options);
    match &verdict {
        Verdict::Valid { signer, chain, .. } => tracing::debug!(
            target: LOG_TARGET,
            signer = %signer.subject(),
            depth = chain.len(),
            "container verified"
        ),
        Verdict::Invalid(e) => tracing::debug!(
            target: LOG_TARGET,
            error = %e,
            code = e.error_code(),
            "container rejected"
        ),
    }
    verdict
}

fn evaluate(
    container: &[u8],
    trust_store: &TrustStore,
    detached_content: Option<&[u8]>,
    options: &VerifyOptions,
) -> Verdict {
    let container = match SignatureContainer::from_der(container) {
        Ok(c) => c,
        Err(e) => return Verdict::Invalid(e),
    };

    let content = match (detached_content, container.payload()) {
        (Some(_), Some(_)) => {
            tracing::debug!(target: LOG_TARGET, "content supplied both detached and enveloped");
            return Verdict::Invalid(VerifyError::MalformedContainer(
                "detached content supplied for a container that carries its own payload".to_string(),
            ));
        }
        (Some(content), None) | (None, Some(content)) => content,
        (None, None) => {
            tracing::debug!(target: LOG_TARGET, "detached container without content");
            return Verdict::Invalid(VerifyError::MissingContent);
        }
    };

    let mut validator = ChainValidator::new(trust_store).with_max_depth(options.max_chain_depth);
    if let Some(t) = options.reference_time {
        validator = validator.with_reference_time(t);
    }

    let mut accepted: Option<(Certificate, Vec<Certificate>)> = None;
    let mut last_error: Option<VerifyError> = None;

    for (index, signer_info) in container.signer_infos().iter().enumerate() {
        match verify_signer(&container, signer_info, content, trust_store, &validator) {
            Ok((signer, chain)) => {
                tracing::debug!(target: LOG_TARGET, index, signer = %signer.subject(), "signer verified");
                if options.signer_policy == SignerPolicy::AnyOf {
                    return valid(signer, chain, content);
                }
                if accepted.is_none() {
                    accepted = Some((signer, chain));
                }
            }
            Err(e) => {
                tracing::debug!(
                    target: LOG_TARGET,
                    index,
                    error = %e,
                    code = e.error_code(),
                    "signer rejected"
                );
                if options.signer_policy == SignerPolicy::AllOf {
                    return Verdict::Invalid(e);
                }
                last_error = Some(e);
            }
        }
    }

    match accepted {
        Some((signer, chain)) => valid(signer, chain, content),
        None => Verdict::Invalid(last_error.unwrap_or(VerifyError::NoValidSigner)),
    }
}

fn valid(signer: Certificate, chain: Vec<Certificate>, content: &[u8]) -> Verdict {
    Verdict::Valid {
        signer,
        chain,
        payload: content.to_vec(),
    }
}

fn verify_signer(
    container: &SignatureContainer,
    signer_info: &SignerInfo,
    content: &[u8],
    trust_store: &TrustStore,
    validator: &ChainValidator<'_>,
) -> VerifyResult<(Certificate, Vec<Certificate>)> {
    let mut first_error = None;
    for (attempt, candidate) in signer_candidates(container, signer_info.signer_id(), trust_store)
        .into_iter()
        .enumerate()
    {
        match verify_with_certificate(container, signer_info, candidate, content, validator) {
            Ok(verified) => return Ok(verified),
            Err(e) => {
                tracing::trace!(
                    target: LOG_TARGET,
                    attempt,
                    subject = %candidate.subject(),
                    error = %e,
                    "candidate signer certificate rejected"
                );
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(VerifyError::SignerCertificateNotFound))
}

fn verify_with_certificate(
    container: &SignatureContainer,
    signer_info: &SignerInfo,
    signer: &Certificate,
    content: &[u8],
    validator: &ChainValidator<'_>,
) -> VerifyResult<(Certificate, Vec<Certificate>)> {
    let chain = validator.validate(signer, container.certificates()).into_result()?;

    let digest_algorithm = signer_info.digest_algorithm()?;
    let signature_algorithm = signer_info.signature_algorithm()?;

    let signed_bytes: &[u8] = match signer_info.signed_attributes() {
        Some(attrs) => {
            if attrs.content_type() != container.content_type() {
                return Err(VerifyError::MalformedContainer(format!(
                    "contentType attribute {} does not match eContentType {}",
                    attrs.content_type(),
                    container.content_type()
                )));
            }
            let actual = digest(digest_algorithm, content);
            if !digests_match(attrs.message_digest(), &actual) {
                return Err(VerifyError::DigestMismatch);
            }
            attrs.to_be_signed()
        }
        None => content,
    };

    if !verify_signature(
        signer,
        signature_algorithm,
        digest_algorithm,
        signed_bytes,
        signer_info.signature(),
    ) {
        return Err(VerifyError::SignatureMismatch);
    }

    Ok((signer.clone(), chain))
}

// Embedded certificates first, in container order; a signer may also be a
// trust anchor that was not shipped.
fn signer_candidates<'a>(
    container: &'a SignatureContainer,
    id: &SignerIdentifier,
    trust_store: &'a TrustStore,
) -> Vec<&'a Certificate> {
    let mut candidates: Vec<&Certificate> =
        container.certificates().iter().filter(|c| id.matches(c)).collect();
    let from_store: Vec<&Certificate> = match id {
        SignerIdentifier::IssuerAndSerial { issuer, serial } => {
            trust_store.find_by_issuer_and_serial(issuer, serial).into_iter().collect()
        }
        SignerIdentifier::SubjectKeyIdentifier(_) => trust_store.iter().filter(|c| id.matches(c)).collect(),
    };
    for cert in from_store {
        if !candidates.iter().any(|c| c.as_der() == cert.as_der()) {
            candidates.push(cert);
        }
    }
    candidates
}
