use super::*;
use crate::frame::ErrorCode;
use serde_json::json;
use time::Duration;

// =============================================================================
// Privacy
// =============================================================================

#[test]
fn privacy_parses_stored_values() {
    assert_eq!("Public".parse::<Privacy>().unwrap(), Privacy::Public);
    assert_eq!("Private".parse::<Privacy>().unwrap(), Privacy::Private);
    assert_eq!("Hidden".parse::<Privacy>().unwrap(), Privacy::Hidden);
}

#[test]
fn privacy_rejects_unknown_value() {
    let err = "private".parse::<Privacy>().unwrap_err();
    assert_eq!(err.error_code(), "E_ROOM_PRIVACY");
}

#[test]
fn privacy_as_str_matches_parse() {
    for privacy in [Privacy::Public, Privacy::Private, Privacy::Hidden] {
        assert_eq!(privacy.as_str().parse::<Privacy>().unwrap(), privacy);
    }
}

// =============================================================================
// RoomDescriptor
// =============================================================================

#[test]
fn descriptor_recognizes_host_editors_and_viewers() {
    let mut room = RoomDescriptor::new("R1", "host", Privacy::Private);
    room.authorized_editors.push("ed".into());
    room.authorized_viewers.push("vw".into());

    assert!(room.is_host("host"));
    assert!(room.is_recognized("host"));
    assert!(room.is_recognized("ed"));
    assert!(room.is_recognized("vw"));
    assert!(!room.is_recognized("stranger"));
}

#[test]
fn descriptor_expiry() {
    let now = OffsetDateTime::now_utc();
    let mut room = RoomDescriptor::new("R1", "host", Privacy::Public);
    assert!(!room.is_expired(now));

    room.expires_at = Some(now - Duration::hours(1));
    assert!(room.is_expired(now));

    room.expires_at = Some(now + Duration::hours(1));
    assert!(!room.is_expired(now));
}

// =============================================================================
// MemoryRoomDirectory
// =============================================================================

#[tokio::test]
async fn memory_get_room_missing_is_none() {
    let dir = MemoryRoomDirectory::new();
    assert!(dir.get_room("NOPE").await.unwrap().is_none());
}

#[tokio::test]
async fn memory_enroll_adds_editor_once() {
    let dir = MemoryRoomDirectory::new();
    dir.insert(RoomDescriptor::new("R1", "host", Privacy::Public));

    dir.enroll("R1", "guest").await.unwrap();
    dir.enroll("R1", "guest").await.unwrap();
    dir.enroll("R1", "host").await.unwrap();

    let room = dir.get_room("R1").await.unwrap().unwrap();
    assert_eq!(room.authorized_editors, vec!["guest".to_string()]);
}

#[tokio::test]
async fn memory_enroll_unknown_room_fails() {
    let dir = MemoryRoomDirectory::new();
    let err = dir.enroll("NOPE", "guest").await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(ref id) if id == "NOPE"));
}

#[tokio::test]
async fn memory_save_snapshot_replaces_elements() {
    let dir = MemoryRoomDirectory::new();
    dir.insert(RoomDescriptor::new("R1", "host", Privacy::Public));

    dir.save_snapshot("R1", &[json!({"id": "a"})]).await.unwrap();
    dir.save_snapshot("R1", &[json!({"id": "b"}), json!({"id": "c"})]).await.unwrap();

    let saved = dir.snapshot("R1").unwrap();
    assert_eq!(saved, vec![json!({"id": "b"}), json!({"id": "c"})]);
}

#[tokio::test]
async fn memory_save_snapshot_unknown_room_fails() {
    let dir = MemoryRoomDirectory::new();
    let err = dir.save_snapshot("NOPE", &[]).await.unwrap_err();
    assert_eq!(err.error_code(), "E_ROOM_NOT_FOUND");
    assert!(!err.retryable());
}
