// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `verify` over hostile input returns a verdict and never panics.

use pkcs7verify::{verify, ErrorCategory, TrustStore, Verdict};
use pkcs7verify_test_utils::{Identity, SignedDataBuilder};
use proptest::prelude::*;

proptest! {
    #[test]
    fn random_noise_is_malformed_input(noise in prop::collection::vec(any::<u8>(), 0..1024)) {
        let verdict = verify(&noise, &TrustStore::default(), None);
        prop_assert_eq!(
            verdict.reason().map(|e| e.category()),
            Some(ErrorCategory::MalformedInput)
        );
    }
}

#[test]
fn truncations_and_bit_flips_never_validate() {
    let root = Identity::root("R");
    let store = TrustStore::from_roots([root.der()]).unwrap();
    let container = SignedDataBuilder::new(b"fuzz me").signer(&root).build();
    assert!(verify(&container, &store, None).is_valid());

    for len in 0..container.len() {
        let verdict = verify(&container[..len], &store, None);
        assert!(
            matches!(verdict, Verdict::Invalid(ref e) if e.category() == ErrorCategory::MalformedInput),
            "prefix {len}: {verdict:?}"
        );
    }

    // Flipping the top bit of a byte either breaks the encoding or the signed data.
    for i in 0..container.len() {
        let mut mutated = container.clone();
        mutated[i] ^= 0x80;
        let verdict = verify(&mutated, &store, None);
        if let Verdict::Valid { payload, .. } = &verdict {
            assert_eq!(payload.as_slice(), b"fuzz me", "byte {i} changed the payload yet verified");
        }
    }
}
