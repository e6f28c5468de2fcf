//! Per-game waiting queue.

use std::collections::{HashSet, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use turnstile_protocol::PlayerId;
use turnstile_session::Player;

/// FIFO order plus an id set for O(1) duplicate checks.
///
/// Invariant: an id is in `present` iff it appears exactly once in `order`.
#[derive(Default)]
struct Queue {
    order: VecDeque<Player>,
    present: HashSet<PlayerId>,
}

impl Queue {
    fn pop_front(&mut self) -> Option<Player> {
        let player = self.order.pop_front()?;
        self.present.remove(player.id());
        Some(player)
    }
}

/// Players waiting to be grouped for one game.
///
/// Every operation takes the lobby's single lock and releases it before
/// returning, so callers never hold it while touching other shared state.
#[derive(Default)]
pub struct Lobby {
    queue: RwLock<Queue>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Queue> {
        self.queue.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Queue> {
        self.queue.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `player` to the tail. Returns `false`, leaving the queue
    /// untouched, if the id is already waiting.
    pub fn enqueue(&self, player: Player) -> bool {
        let mut queue = self.write();
        if !queue.present.insert(player.id().clone()) {
            return false;
        }
        queue.order.push_back(player);
        true
    }

    /// Removes the head of the queue.
    ///
    /// Callers are expected to check [`size`](Self::size) first; `None`
    /// means that contract was broken.
    pub fn pop(&self) -> Option<Player> {
        self.write().pop_front()
    }

    /// Removes `id` from any position. Returns whether it was queued.
    pub fn remove(&self, id: &PlayerId) -> bool {
        let mut queue = self.write();
        if !queue.present.remove(id) {
            return false;
        }
        if let Some(pos) = queue.order.iter().position(|p| p.id() == id) {
            queue.order.remove(pos);
        }
        true
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.read().present.contains(id)
    }

    pub fn size(&self) -> usize {
        self.read().order.len()
    }

    /// Ids currently waiting, head first.
    pub fn waiting(&self) -> Vec<PlayerId> {
        self.read().order.iter().map(|p| p.id().clone()).collect()
    }

    /// Reads the size and pops a group under one lock acquisition.
    ///
    /// `plan` receives the current size and returns how many players to
    /// take. Nothing is popped when it returns `None`, zero, or more than
    /// are queued.
    pub fn take_group(&self, plan: impl FnOnce(usize) -> Option<usize>) -> Option<Vec<Player>> {
        let mut queue = self.write();
        let size = queue.order.len();
        let count = plan(size).filter(|&n| n > 0 && n <= size)?;
        let group: Vec<Player> = (0..count).filter_map(|_| queue.pop_front()).collect();
        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_protocol::{RoomId, ServerEvent};
    use turnstile_session::{IdentitySource, SessionError};

    struct Stub(PlayerId);

    impl IdentitySource for Stub {
        fn id(&self) -> &PlayerId {
            &self.0
        }
        fn join_group(&self, _: &RoomId) -> Result<(), SessionError> {
            Ok(())
        }
        fn leave_group(&self, _: &RoomId) {}
        fn emit(&self, _: ServerEvent) -> Result<(), SessionError> {
            Ok(())
        }
        fn broadcast_to(&self, _: &RoomId, _: ServerEvent) -> Result<(), SessionError> {
            Ok(())
        }
    }

    fn player(id: &str) -> Player {
        Player::new(Stub(PlayerId::from(id)))
    }

    fn assert_consistent(lobby: &Lobby) {
        let queue = lobby.read();
        assert_eq!(queue.order.len(), queue.present.len());
        for p in &queue.order {
            assert!(queue.present.contains(p.id()));
        }
    }

    #[test]
    fn test_enqueue_distinct_players_grows_queue() {
        let lobby = Lobby::new();
        for i in 0..5 {
            assert!(lobby.enqueue(player(&format!("p{i}"))));
        }
        assert_eq!(lobby.size(), 5);
        assert_consistent(&lobby);
    }

    #[test]
    fn test_enqueue_duplicate_is_rejected() {
        let lobby = Lobby::new();
        assert!(lobby.enqueue(player("a")));
        assert!(!lobby.enqueue(player("a")));
        assert_eq!(lobby.size(), 1);
        assert_consistent(&lobby);
    }

    #[test]
    fn test_pop_is_fifo() {
        let lobby = Lobby::new();
        for id in ["a", "b", "c"] {
            lobby.enqueue(player(id));
        }
        let popped: Vec<String> = (0..3)
            .map(|_| lobby.pop().unwrap().id().to_string())
            .collect();
        assert_eq!(popped, ["a", "b", "c"]);
        assert!(!lobby.contains(&PlayerId::from("a")));
    }

    #[test]
    fn test_pop_empty_returns_none() {
        assert!(Lobby::new().pop().is_none());
    }

    #[test]
    fn test_popped_player_can_queue_again() {
        let lobby = Lobby::new();
        lobby.enqueue(player("a"));
        lobby.pop();
        assert!(lobby.enqueue(player("a")));
    }

    #[test]
    fn test_remove_from_middle_keeps_order() {
        let lobby = Lobby::new();
        for id in ["a", "b", "c", "d"] {
            lobby.enqueue(player(id));
        }
        assert!(lobby.remove(&PlayerId::from("c")));
        assert!(!lobby.remove(&PlayerId::from("c")));
        assert_eq!(
            lobby.waiting(),
            vec![PlayerId::from("a"), PlayerId::from("b"), PlayerId::from("d")]
        );
        assert_consistent(&lobby);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let lobby = Lobby::new();
        lobby.enqueue(player("a"));
        assert!(!lobby.remove(&PlayerId::from("zzz")));
        assert_eq!(lobby.size(), 1);
    }

    #[test]
    fn test_take_group_pops_planned_count() {
        let lobby = Lobby::new();
        for id in ["a", "b", "c"] {
            lobby.enqueue(player(id));
        }
        let group = lobby.take_group(|size| (size >= 2).then_some(2)).unwrap();
        let ids: Vec<&str> = group.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(lobby.waiting(), vec![PlayerId::from("c")]);
        assert_consistent(&lobby);
    }

    #[test]
    fn test_take_group_leaves_queue_when_plan_declines() {
        let lobby = Lobby::new();
        lobby.enqueue(player("a"));
        assert!(lobby.take_group(|_| None).is_none());
        assert!(lobby.take_group(|_| Some(0)).is_none());
        assert!(lobby.take_group(|_| Some(5)).is_none());
        assert_eq!(lobby.size(), 1);
    }
}
