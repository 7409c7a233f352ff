//! Unit tests for the identifier newtypes
//!
//! Tests cover creation, prefixed parsing, UUID conversion, and the
//! transparent serde representation used on the wire and in the database.

use core_kernel::{OrganizationId, ProgramId, RewardId, UserId};
use proptest::prelude::*;
use uuid::Uuid;

mod creation_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(ProgramId::new(), ProgramId::new());
        assert_ne!(OrganizationId::new(), OrganizationId::new());
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let first = RewardId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = RewardId::new_v7();

        assert!(first < second);
        assert_eq!(first.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_from_uuid_keeps_value() {
        let uuid = Uuid::new_v4();
        assert_eq!(*UserId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(OrganizationId::prefix(), "ORG");
        assert_eq!(UserId::prefix(), "USR");
        assert_eq!(ProgramId::prefix(), "PRG");
        assert_eq!(RewardId::prefix(), "RWD");
    }
}

mod parsing_tests {
    use super::*;

    #[test]
    fn test_parse_with_prefix() {
        let id = ProgramId::new();
        let parsed: ProgramId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed: OrganizationId = uuid.to_string().parse().unwrap();
        assert_eq!(*parsed.as_uuid(), uuid);
    }

    #[test]
    fn test_parse_rejects_foreign_prefix() {
        let reward = RewardId::new();
        assert!(reward.to_string().parse::<ProgramId>().is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("PRG-not-a-uuid".parse::<ProgramId>().is_err());
        assert!("".parse::<ProgramId>().is_err());
    }
}

mod serde_tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&ProgramId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn test_deserializes_from_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id: OrganizationId = serde_json::from_str(&format!("\"{uuid}\"")).unwrap();
        assert_eq!(*id.as_uuid(), uuid);
    }
}

proptest! {
    #[test]
    fn prop_display_parse_round_trip(n in any::<u128>()) {
        let id = ProgramId::from_uuid(Uuid::from_u128(n));
        let parsed: ProgramId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }
}
