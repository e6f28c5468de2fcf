//! Named broadcast groups backed by per-peer channels.
//!
//! Every connected peer registers an unbounded outbound channel. A group is
//! just a set of peer ids under a name; broadcasting clones the event into
//! each member's channel. The connection task on the other end of the
//! channel does the actual socket write, so nothing here ever awaits.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use turnstile_protocol::{PlayerId, RoomId, ServerEvent};

use crate::{IdentitySource, SessionError};

/// Outbound side of a peer's event channel.
pub type PeerSender = mpsc::UnboundedSender<ServerEvent>;

/// Inbound side of a peer's event channel, drained by its connection task.
pub type PeerReceiver = mpsc::UnboundedReceiver<ServerEvent>;

#[derive(Default)]
struct Registry {
    peers: HashMap<PlayerId, PeerSender>,
    groups: HashMap<RoomId, BTreeSet<PlayerId>>,
}

/// Process-wide registry of peers and the groups they belong to.
///
/// Constructed once by the server and shared through an `Arc`.
#[derive(Default)]
pub struct BroadcastGroups {
    registry: Mutex<Registry>,
}

impl BroadcastGroups {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a peer and returns its identity handle plus the receiver
    /// its connection task must drain.
    ///
    /// Registering an id twice replaces the earlier channel.
    pub fn connect(self: &Arc<Self>, id: PlayerId) -> (PeerHandle, PeerReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry().peers.insert(id.clone(), tx.clone());
        tracing::debug!(player_id = %id, "peer registered");
        let handle = PeerHandle {
            id,
            sender: tx,
            groups: Arc::clone(self),
        };
        (handle, rx)
    }

    /// Forgets a peer and drops it from every group. Groups left empty are
    /// deleted. Safe to call for unknown ids.
    pub fn disconnect(&self, id: &PlayerId) {
        let mut registry = self.registry();
        if registry.peers.remove(id).is_none() {
            return;
        }
        registry.groups.retain(|_, members| {
            members.remove(id);
            !members.is_empty()
        });
        tracing::debug!(player_id = %id, "peer unregistered");
    }

    /// Adds a registered peer to `group`, creating the group on first use.
    pub fn join(&self, group: &RoomId, id: &PlayerId) -> Result<(), SessionError> {
        let mut registry = self.registry();
        if !registry.peers.contains_key(id) {
            return Err(SessionError::UnknownPeer(id.clone()));
        }
        registry
            .groups
            .entry(group.clone())
            .or_default()
            .insert(id.clone());
        Ok(())
    }

    /// Removes a peer from `group`. No-op if it was not a member.
    pub fn leave(&self, group: &RoomId, id: &PlayerId) {
        let mut registry = self.registry();
        if let Some(members) = registry.groups.get_mut(group) {
            members.remove(id);
            if members.is_empty() {
                registry.groups.remove(group);
            }
        }
    }

    /// Delivers an event to every member of `group` except `except`.
    ///
    /// Returns how many peers it reached. Members whose channel is closed
    /// are skipped.
    pub fn broadcast(&self, group: &RoomId, event: &ServerEvent, except: Option<&PlayerId>) -> usize {
        let targets: Vec<(PlayerId, PeerSender)> = {
            let registry = self.registry();
            let Some(members) = registry.groups.get(group) else {
                return 0;
            };
            members
                .iter()
                .filter(|id| Some(*id) != except)
                .filter_map(|id| registry.peers.get(id).map(|tx| (id.clone(), tx.clone())))
                .collect()
        };

        let mut delivered = 0;
        for (id, tx) in targets {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(player_id = %id, room_id = %group, "broadcast to closed peer skipped");
            }
        }
        delivered
    }

    pub fn peer_count(&self) -> usize {
        self.registry().peers.len()
    }
}

/// [`IdentitySource`] for a peer registered with [`BroadcastGroups`].
#[derive(Clone)]
pub struct PeerHandle {
    id: PlayerId,
    sender: PeerSender,
    groups: Arc<BroadcastGroups>,
}

impl IdentitySource for PeerHandle {
    fn id(&self) -> &PlayerId {
        &self.id
    }

    fn join_group(&self, group: &RoomId) -> Result<(), SessionError> {
        self.groups.join(group, &self.id)
    }

    fn leave_group(&self, group: &RoomId) {
        self.groups.leave(group, &self.id);
    }

    fn emit(&self, event: ServerEvent) -> Result<(), SessionError> {
        self.sender
            .send(event)
            .map_err(|_| SessionError::PeerGone(self.id.clone()))
    }

    fn broadcast_to(&self, group: &RoomId, event: ServerEvent) -> Result<(), SessionError> {
        self.groups.broadcast(group, &event, Some(&self.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    fn room(name: &str) -> RoomId {
        RoomId::from(name)
    }

    fn note(text: &str) -> ServerEvent {
        ServerEvent::RoomMessage {
            message: text.into(),
        }
    }

    #[test]
    fn test_emit_reaches_only_the_peer() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, mut rx_a) = groups.connect(pid("a"));
        let (_b, mut rx_b) = groups.connect(pid("b"));

        a.emit(note("hi")).unwrap();

        assert_eq!(rx_a.try_recv().unwrap(), note("hi"));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, mut rx_a) = groups.connect(pid("a"));
        let (b, mut rx_b) = groups.connect(pid("b"));
        let (c, mut rx_c) = groups.connect(pid("c"));
        for peer in [&a, &b, &c] {
            peer.join_group(&room("r")).unwrap();
        }

        a.broadcast_to(&room("r"), note("moved")).unwrap();

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), note("moved"));
        assert_eq!(rx_c.try_recv().unwrap(), note("moved"));
    }

    #[test]
    fn test_broadcast_without_exclusion_reaches_everyone() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, _rx_a) = groups.connect(pid("a"));
        let (b, _rx_b) = groups.connect(pid("b"));
        a.join_group(&room("r")).unwrap();
        b.join_group(&room("r")).unwrap();

        assert_eq!(groups.broadcast(&room("r"), &note("welcome"), None), 2);
        assert_eq!(groups.broadcast(&room("missing"), &note("x"), None), 0);
    }

    #[test]
    fn test_join_unknown_peer_fails() {
        let groups = BroadcastGroups::new();
        let result = groups.join(&room("r"), &pid("ghost"));
        assert!(matches!(result, Err(SessionError::UnknownPeer(p)) if p == pid("ghost")));
    }

    #[test]
    fn test_disconnect_removes_peer_and_empty_groups() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, _rx_a) = groups.connect(pid("a"));
        let (b, _rx_b) = groups.connect(pid("b"));
        a.join_group(&room("solo")).unwrap();
        a.join_group(&room("pair")).unwrap();
        b.join_group(&room("pair")).unwrap();

        groups.disconnect(&pid("a"));

        assert_eq!(groups.peer_count(), 1);
        assert_eq!(groups.broadcast(&room("solo"), &note("x"), None), 0);
        assert_eq!(groups.broadcast(&room("pair"), &note("x"), None), 1);

        // Second call is a no-op.
        groups.disconnect(&pid("a"));
        assert_eq!(groups.peer_count(), 1);
    }

    #[test]
    fn test_leave_group_stops_delivery_from_that_group() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, mut rx_a) = groups.connect(pid("a"));
        let (b, _rx_b) = groups.connect(pid("b"));
        a.join_group(&room("old")).unwrap();
        b.join_group(&room("old")).unwrap();
        a.join_group(&room("new")).unwrap();

        a.leave_group(&room("old"));
        b.broadcast_to(&room("old"), note("stale")).unwrap();

        assert!(rx_a.try_recv().is_err());
        assert_eq!(groups.broadcast(&room("new"), &note("fresh"), None), 1);
        assert_eq!(rx_a.try_recv().unwrap(), note("fresh"));
    }

    #[test]
    fn test_leave_last_member_drops_group() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, _rx) = groups.connect(pid("a"));
        a.join_group(&room("r")).unwrap();

        a.leave_group(&room("r"));
        a.leave_group(&room("r"));

        assert_eq!(groups.broadcast(&room("r"), &note("x"), None), 0);
    }

    #[test]
    fn test_emit_to_closed_receiver_reports_peer_gone() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, rx) = groups.connect(pid("a"));
        drop(rx);

        assert!(matches!(a.emit(note("x")), Err(SessionError::PeerGone(_))));
    }

    #[test]
    fn test_disconnected_peer_cannot_join_and_can_still_notify() {
        let groups = Arc::new(BroadcastGroups::new());
        let (a, _rx_a) = groups.connect(pid("a"));
        let (b, mut rx_b) = groups.connect(pid("b"));
        b.join_group(&room("r")).unwrap();

        groups.disconnect(&pid("a"));

        assert!(matches!(a.join_group(&room("r")), Err(SessionError::UnknownPeer(_))));
        a.broadcast_to(&room("r"), note("gone")).unwrap();
        assert_eq!(rx_b.try_recv().unwrap(), note("gone"));
    }
}
