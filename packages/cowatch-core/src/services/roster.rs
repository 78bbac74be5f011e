//! Peer roster tracking for the active room.
//!
//! The roster is recomputed from the transport's full membership snapshot on
//! every change, then sorted ascending by peer id. Sorting makes the roster
//! deterministic: every peer derives the identical ordering from the same
//! membership set, regardless of the order join/leave notifications arrived.

use std::sync::Arc;

use crate::state::{ChangeOrigin, SessionStore};
use crate::transport::PeerId;

/// Maintains the sorted peer roster and the room activity feed entries that
/// accompany membership changes.
pub struct RosterManager {
    store: Arc<SessionStore>,
}

impl RosterManager {
    /// Creates a new `RosterManager` writing to the given store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Records the transport-assigned local peer id.
    ///
    /// The roster is initialized to the singleton set containing only the
    /// local peer; membership callbacks grow it from there.
    pub fn on_self_id_assigned(&self, id: PeerId) {
        log::debug!("[Roster] Assigned local peer id {}", id);
        self.store.set_local_peer_id(Some(id), ChangeOrigin::Lifecycle);
        self.store.set_members(vec![id], ChangeOrigin::Lifecycle);
    }

    /// Handles a member join.
    ///
    /// `membership` is the transport's full current snapshot (not a delta);
    /// the roster is rebuilt from it rather than appended to.
    pub fn on_member_joined(&self, id: PeerId, membership: Vec<PeerId>) {
        let roster = Self::normalize(membership);
        log::debug!("[Roster] Peer {} joined, roster now {:?}", id, roster);
        self.store.set_members(roster, ChangeOrigin::Lifecycle);
        self.store.set_latest_member(Some(id), ChangeOrigin::Lifecycle);
        self.store.append_chat(id, "joined");
    }

    /// Handles a member leave.
    pub fn on_member_left(&self, id: PeerId, membership: Vec<PeerId>) {
        let roster = Self::normalize(membership);
        log::debug!("[Roster] Peer {} left, roster now {:?}", id, roster);
        self.store.set_members(roster, ChangeOrigin::Lifecycle);
        self.store.append_chat(id, "left");
    }

    /// Sorts ascending and removes duplicates.
    fn normalize(mut membership: Vec<PeerId>) -> Vec<PeerId> {
        membership.sort_unstable();
        membership.dedup();
        membership
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (RosterManager, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new());
        (RosterManager::new(store.clone()), store)
    }

    #[test]
    fn self_id_initializes_singleton_roster() {
        let (roster, store) = manager();
        roster.on_self_id_assigned(5);

        assert_eq!(store.local_peer_id(), Some(5));
        assert_eq!(store.members(), vec![5]);
    }

    #[test]
    fn join_rebuilds_sorted_roster() {
        let (roster, store) = manager();
        roster.on_self_id_assigned(5);
        roster.on_member_joined(2, vec![5, 2]);

        assert_eq!(store.members(), vec![2, 5]);
        assert_eq!(store.latest_member(), Some(2));
    }

    #[test]
    fn leave_rebuilds_sorted_roster() {
        let (roster, store) = manager();
        roster.on_self_id_assigned(5);
        roster.on_member_joined(2, vec![5, 2]);
        roster.on_member_joined(9, vec![5, 2, 9]);
        roster.on_member_left(2, vec![5, 9]);

        assert_eq!(store.members(), vec![5, 9]);
    }

    #[test]
    fn roster_is_deterministic_under_permuted_arrival() {
        // Same final membership set, different event interleavings.
        let interleavings: Vec<Vec<PeerId>> = vec![
            vec![5, 2, 9],
            vec![9, 5, 2],
            vec![2, 9, 5],
        ];

        let mut rosters = Vec::new();
        for snapshot in interleavings {
            let (roster, store) = manager();
            roster.on_self_id_assigned(snapshot[0]);
            for (i, &id) in snapshot.iter().enumerate().skip(1) {
                roster.on_member_joined(id, snapshot[..=i].to_vec());
            }
            rosters.push(store.members());
        }

        assert!(rosters.iter().all(|r| *r == vec![2, 5, 9]));
    }

    #[test]
    fn duplicate_snapshot_entries_are_removed() {
        let (roster, store) = manager();
        roster.on_member_joined(3, vec![3, 1, 3, 1]);

        assert_eq!(store.members(), vec![1, 3]);
    }

    #[test]
    fn membership_changes_append_chat_notices() {
        let (roster, store) = manager();
        roster.on_self_id_assigned(1);
        roster.on_member_joined(2, vec![1, 2]);
        roster.on_member_left(2, vec![1]);

        let chat = store.chat();
        assert_eq!(chat.len(), 2);
        assert_eq!(chat[0].author, 2);
        assert_eq!(chat[0].text, "joined");
        assert_eq!(chat[1].author, 2);
        assert_eq!(chat[1].text, "left");
    }
}
