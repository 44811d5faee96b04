//! Tests for header detection and declared-length decoding.

use proptest::prelude::*;
use rstest::rstest;

use crate::fragment::{Classification, FRAME_MARKER, classify};

#[test]
fn header_fragment_decodes_length_and_keeps_offsets_three_and_four() {
    let fragment = [0x3F, 0x23, 0x23, 0xAA, 0xBB, 0x00, 0x00, 0x00, 0x02, 0xCC];

    let Classification::Header { header, payload } = classify(&fragment) else {
        panic!("marker-prefixed fragment should be a header");
    };

    assert_eq!(header.declared_length(), 2);
    assert_eq!(header.message_type(), 0xAABB);
    assert_eq!(payload, &fragment[3..]);
}

#[test]
fn length_field_is_big_endian() {
    let fragment = [0x3F, 0x23, 0x23, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04];

    let Classification::Header { header, payload } = classify(&fragment) else {
        panic!("nine-byte marker fragment should be a header");
    };

    assert_eq!(header.declared_length(), 0x0102_0304);
    assert_eq!(payload.len(), 6);
}

#[rstest]
#[case::empty(&[])]
#[case::marker_only(&[0x3F, 0x23, 0x23])]
#[case::one_short(&[0x3F, 0x23, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00])]
#[case::wrong_first_byte(&[0x3E, 0x23, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01])]
#[case::wrong_second_byte(&[0x3F, 0x24, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01])]
#[case::wrong_third_byte(&[0x3F, 0x23, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01])]
#[case::marker_not_at_start(&[0x00, 0x3F, 0x23, 0x23, 0x00, 0x00, 0x00, 0x00, 0x01])]
fn non_headers_are_continuations(#[case] fragment: &[u8]) {
    let classification = classify(fragment);

    assert!(!classification.is_header());
    assert_eq!(classification, Classification::Continuation(fragment));
    assert_eq!(classification.payload(), fragment);
}

proptest! {
    #[test]
    fn fragments_without_marker_are_always_continuations(
        fragment in proptest::collection::vec(any::<u8>(), 0..128)
    ) {
        prop_assume!(!fragment.starts_with(&FRAME_MARKER));
        prop_assert_eq!(classify(&fragment), Classification::Continuation(&fragment));
    }

    #[test]
    fn marker_fragments_of_header_length_are_headers(
        tail in proptest::collection::vec(any::<u8>(), 6..64)
    ) {
        let mut fragment = FRAME_MARKER.to_vec();
        fragment.extend_from_slice(&tail);

        let classification = classify(&fragment);
        prop_assert!(classification.is_header());
        prop_assert_eq!(classification.payload(), tail.as_slice());
    }
}
