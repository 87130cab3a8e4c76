use super::*;
use serde_json::json;

#[test]
fn join_room_reads_client_field_names() {
    let join: JoinRoom = serde_json::from_value(json!({
        "roomId": "ABC234",
        "user": {"_id": "u-1", "name": "Ada"}
    }))
    .unwrap();
    assert_eq!(join.room_id, "ABC234");
    assert_eq!(join.user, UserIdentity::new("u-1", "Ada"));
}

#[test]
fn cursor_update_flattens_cursor_fields() {
    let socket_id = Uuid::new_v4();
    let update = CursorUpdate {
        cursor: CursorData { x: 1.5, y: 2.0, color: "#14b8a6".into(), name: "Ada".into() },
        socket_id,
    };
    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(
        value,
        json!({"x": 1.5, "y": 2.0, "color": "#14b8a6", "name": "Ada", "socketId": socket_id.to_string()})
    );
}

#[test]
fn cursor_data_tolerates_missing_style() {
    let cursor: CursorData = serde_json::from_value(json!({"x": 3, "y": 4})).unwrap();
    assert!(cursor.color.is_empty());
    assert!(cursor.name.is_empty());
}

#[test]
fn signaling_uses_caller_id_casing() {
    let caller = Uuid::new_v4();
    let offer = PeerOffer { signal: json!({"type": "offer"}), caller_id: caller };
    let value = serde_json::to_value(&offer).unwrap();
    assert_eq!(value["callerID"], json!(caller.to_string()));

    let returning: ReturningSignal =
        serde_json::from_value(json!({"callerID": caller.to_string(), "signal": {"type": "answer"}})).unwrap();
    assert_eq!(returning.caller_id, caller);
}

#[test]
fn sending_signal_caller_is_optional() {
    let target = Uuid::new_v4();
    let signal: SendingSignal =
        serde_json::from_value(json!({"userToSignal": target.to_string(), "signal": "sdp"})).unwrap();
    assert_eq!(signal.user_to_signal, target);
    assert!(signal.caller_id.is_none());
}

#[test]
fn sending_signal_rejects_malformed_target() {
    let result = serde_json::from_value::<SendingSignal>(json!({"userToSignal": "nope", "signal": {}}));
    assert!(result.is_err());
}

#[test]
fn poll_vote_update_drops_room() {
    let vote = PollVote { room_id: "R".into(), message_id: "m1".into(), option_index: 1, voter: "Ada".into() };
    let value = serde_json::to_value(PollVoteUpdate::from(vote)).unwrap();
    assert_eq!(value, json!({"messageId": "m1", "optionIndex": 1, "voter": "Ada"}));
}

#[test]
fn approve_join_user_is_optional() {
    let target = Uuid::new_v4();
    let approve: ApproveJoin =
        serde_json::from_value(json!({"socketId": target.to_string(), "roomId": "R"})).unwrap();
    assert!(approve.user.is_none());
}
