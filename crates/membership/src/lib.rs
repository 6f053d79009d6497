//! Pure classification of membership table scans into live peers and stale
//! rows. No side effects; the caller performs any deletes.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use natsmesh_store::MembershipEntry;

/// The outcome of classifying one table scan at a fixed instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    /// Peers (never self) whose keepalive is within the liveness window,
    /// in scan order. These become the broker's cluster routes.
    pub live: Vec<String>,

    /// Rows whose keepalive is older than the deletion window. The caller
    /// should reap these; the delete must tolerate the row already being
    /// gone, since any participant may reap during its own scan.
    pub stale: Vec<String>,
}

/// Classifies `entries` against the liveness and deletion windows.
///
/// The entry matching `self_address` is skipped outright: a node never
/// routes to itself, and it refreshes its own row every cycle rather than
/// reaping it. Both window predicates are strict, so an entry aged exactly
/// `alive_window` is not live and one aged exactly `delete_window` is not
/// stale. Entries bearing a `last_seen` in the future (clock skew between
/// writers) have age zero: live and never stale. The windows are
/// independent; `delete_window` normally exceeds `alive_window` but nothing
/// here requires it.
#[must_use]
pub fn classify(
    entries: &[MembershipEntry],
    self_address: &str,
    now: u64,
    alive_window: u64,
    delete_window: u64,
) -> Classification {
    let mut classification = Classification::default();

    for entry in entries {
        if entry.address == self_address {
            continue;
        }

        let age = now.saturating_sub(entry.last_seen);

        if age < alive_window {
            classification.live.push(entry.address.clone());
        }

        if age > delete_window {
            classification.stale.push(entry.address.clone());
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;

    use natsmesh_store::NodeStatus;

    const NOW: u64 = 1_700_000_000;
    const ALIVE: u64 = 30;
    const DELETE: u64 = 300;

    fn entry(address: &str, last_seen: u64) -> MembershipEntry {
        MembershipEntry {
            address: address.to_string(),
            last_seen,
            status: NodeStatus::Working,
        }
    }

    #[test]
    fn test_self_never_live_regardless_of_timestamp() {
        for last_seen in [NOW, NOW - 5, NOW - 1000, NOW + 100] {
            let result = classify(&[entry("10.0.0.1", last_seen)], "10.0.0.1", NOW, ALIVE, DELETE);
            assert!(result.live.is_empty());
            assert!(result.stale.is_empty());
        }
    }

    #[test]
    fn test_alive_window_boundary_is_strict() {
        let at_boundary = classify(&[entry("a", NOW - ALIVE)], "self", NOW, ALIVE, DELETE);
        assert!(at_boundary.live.is_empty());

        let inside = classify(&[entry("a", NOW - ALIVE + 1)], "self", NOW, ALIVE, DELETE);
        assert_eq!(inside.live, vec!["a"]);
    }

    #[test]
    fn test_delete_window_boundary_is_strict() {
        let at_boundary = classify(&[entry("a", NOW - DELETE)], "self", NOW, ALIVE, DELETE);
        assert!(at_boundary.stale.is_empty());

        let one_older = classify(&[entry("a", NOW - DELETE - 1)], "self", NOW, ALIVE, DELETE);
        assert_eq!(one_older.stale, vec!["a"]);
    }

    #[test]
    fn test_future_timestamp_is_live_and_never_stale() {
        let result = classify(&[entry("a", NOW + 3600)], "self", NOW, ALIVE, DELETE);
        assert_eq!(result.live, vec!["a"]);
        assert!(result.stale.is_empty());
    }

    #[test]
    fn test_scan_order_preserved() {
        let entries = [entry("c", NOW - 1), entry("a", NOW - 2), entry("b", NOW - 3)];
        let result = classify(&entries, "self", NOW, ALIVE, DELETE);
        assert_eq!(result.live, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_overlapping_windows_allow_live_and_stale() {
        // delete_window below alive_window is unusual but legal; a single
        // entry may then satisfy both predicates.
        let result = classify(&[entry("a", NOW - 20)], "self", NOW, 30, 10);
        assert_eq!(result.live, vec!["a"]);
        assert_eq!(result.stale, vec!["a"]);
    }

    #[test]
    fn test_mixed_scan_scenario() {
        // A is self, B has outlived the alive window, C the delete window.
        let entries = [
            entry("A", NOW - 5),
            entry("B", NOW - 50),
            entry("C", NOW - 400),
        ];

        let result = classify(&entries, "A", NOW, ALIVE, DELETE);

        assert!(result.live.is_empty());
        assert_eq!(result.stale, vec!["C"]);
    }

    #[test]
    fn test_self_absent_from_table() {
        let result = classify(&[entry("A", NOW - 5)], "D", NOW, ALIVE, DELETE);
        assert_eq!(result.live, vec!["A"]);
        assert!(result.stale.is_empty());
    }
}
