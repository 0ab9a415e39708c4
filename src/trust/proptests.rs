//! Property tests for device verdict aggregation

use crate::crypto::{worst_status, SignatureStatus};
use proptest::prelude::*;

fn any_status() -> impl Strategy<Value = SignatureStatus> {
    prop_oneof![
        Just(SignatureStatus::Valid),
        Just(SignatureStatus::NotSigned),
        Just(SignatureStatus::Invalid),
    ]
}

proptest! {
    #[test]
    fn any_invalid_dominates(statuses in prop::collection::vec(any_status(), 0..16)) {
        let worst = worst_status(statuses.iter().copied());
        if statuses.contains(&SignatureStatus::Invalid) {
            prop_assert_eq!(worst, SignatureStatus::Invalid);
        } else if statuses.contains(&SignatureStatus::NotSigned) {
            prop_assert_eq!(worst, SignatureStatus::NotSigned);
        } else {
            prop_assert_eq!(worst, SignatureStatus::Valid);
        }
    }

    #[test]
    fn reduction_ignores_order(mut statuses in prop::collection::vec(any_status(), 0..16)) {
        let forward = worst_status(statuses.iter().copied());
        statuses.reverse();
        prop_assert_eq!(forward, worst_status(statuses));
    }
}
