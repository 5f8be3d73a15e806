//! Property tests for identifier embedding.

use docseal_core::{sha256_digest, CertificateId};
use docseal_document::fixture::blank_pdf;
use docseal_document::{embed, stamp_text, Document};
use proptest::prelude::*;
use uuid::Uuid;

fn id_from(bits: u128) -> CertificateId {
    CertificateId::from_uuid(uuid::Builder::from_random_bytes(bits.to_le_bytes()).into_uuid())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn embedding_is_deterministic(pages in 1usize..5, bits in any::<u128>()) {
        let src = Document::pdf(blank_pdf(pages).unwrap());
        let id = id_from(bits);
        let a = embed(&src, &id).unwrap();
        let b = embed(&src, &id).unwrap();
        prop_assert_eq!(sha256_digest(a.bytes()), sha256_digest(b.bytes()));
    }

    #[test]
    fn distinct_ids_give_distinct_digests(pages in 1usize..4, x in any::<u128>(), y in any::<u128>()) {
        let (a, b) = (id_from(x), id_from(y));
        prop_assume!(a != b);
        let src = Document::pdf(blank_pdf(pages).unwrap());
        let ea = embed(&src, &a).unwrap();
        let eb = embed(&src, &b).unwrap();
        prop_assert_ne!(sha256_digest(ea.bytes()), sha256_digest(eb.bytes()));
    }
}

#[test]
fn stamp_text_uses_hyphenated_uuid() {
    let uuid = Uuid::parse_str("7c9e6679-7425-40de-944b-e07fc1f90ae7").unwrap();
    assert_eq!(
        stamp_text(&CertificateId::from_uuid(uuid)),
        "UUID: 7c9e6679-7425-40de-944b-e07fc1f90ae7"
    );
}
