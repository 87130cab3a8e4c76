use super::*;
use uuid::Uuid;

fn update(socket_id: SocketId, x: f64) -> CursorUpdate {
    CursorUpdate { cursor: CursorData { x, y: 0.0, color: "#14b8a6".into(), name: "Ada".into() }, socket_id }
}

#[test]
fn latest_update_wins() {
    let mut tracker = CursorTracker::new();
    let peer = Uuid::new_v4();
    let now = Instant::now();

    tracker.update(update(peer, 1.0), now);
    tracker.update(update(peer, 2.0), now);

    let active = tracker.active(now);
    assert_eq!(active.len(), 1);
    assert!((active[0].1.x - 2.0).abs() < f64::EPSILON);
}

#[test]
fn cursors_expire_after_ttl() {
    let mut tracker = CursorTracker::new();
    let (old, fresh) = (Uuid::new_v4(), Uuid::new_v4());
    let start = Instant::now();

    tracker.update(update(old, 1.0), start);
    tracker.update(update(fresh, 1.0), start + Duration::from_secs(2));

    let later = start + Duration::from_millis(3500);
    assert_eq!(tracker.active(later).len(), 1);
    assert_eq!(tracker.expire(later), vec![old]);
    assert_eq!(tracker.len(), 1);
}

#[test]
fn cursor_at_exact_ttl_is_still_active() {
    let mut tracker = CursorTracker::new();
    let start = Instant::now();
    tracker.update(update(Uuid::new_v4(), 0.0), start);
    assert!(tracker.expire(start + CURSOR_TTL).is_empty());
}

#[test]
fn retain_members_drops_departed_peers() {
    let mut tracker = CursorTracker::new();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let now = Instant::now();
    tracker.update(update(a, 0.0), now);
    tracker.update(update(b, 0.0), now);

    tracker.retain_members(&[b]);
    tracker.remove(b);

    assert!(tracker.is_empty());
}
