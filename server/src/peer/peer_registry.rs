use std::{collections::HashMap, net::SocketAddr};

use log::{info, warn};

use rally_shared::{handshake::SessionKey, PeerId};

use super::{Peer, PeerError};

/// Connected peers, indexed by id and by endpoint
pub struct PeerRegistry {
    next_id: u32,
    peers: HashMap<PeerId, Peer>,
    addresses: HashMap<SocketAddr, PeerId>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            peers: HashMap::new(),
            addresses: HashMap::new(),
        }
    }

    /// Registers a new endpoint under the next free id. Ids start at 1,
    /// 0 belongs to the server's own pseudo-peer
    pub fn register_peer(&mut self, addr: SocketAddr) -> Result<PeerId, PeerError> {
        if let Some(peer) = self.addresses.get(&addr) {
            return Err(PeerError::AddressInUse { addr, peer: *peer });
        }
        let id = self.allocate_id()?;
        self.peers.insert(id, Peer::new(id, addr));
        self.addresses.insert(addr, id);
        info!("registered {} at {}", id, addr);
        Ok(id)
    }

    pub fn get(&self, id: &PeerId) -> Option<&Peer> {
        self.peers.get(id)
    }

    pub fn get_mut(&mut self, id: &PeerId) -> Option<&mut Peer> {
        self.peers.get_mut(id)
    }

    pub fn get_by_addr(&self, addr: &SocketAddr) -> Option<&Peer> {
        self.addresses.get(addr).and_then(|id| self.peers.get(id))
    }

    pub fn id_of(&self, addr: &SocketAddr) -> Option<PeerId> {
        self.addresses.get(addr).copied()
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.peers.contains_key(id)
    }

    /// Removes the peer from both indices and clears its data store.
    /// Group membership must already be gone
    pub fn remove(&mut self, id: &PeerId) -> Option<Peer> {
        let mut peer = self.peers.remove(id)?;
        self.addresses.remove(&peer.addr());
        if peer.group_count() > 0 {
            warn!(
                "{} removed while still in {} groups",
                id,
                peer.group_count()
            );
        }
        peer.clear_data();
        info!("removed {}", id);
        Some(peer)
    }

    /// Stores the session key agreed on during the handshake. A second key
    /// for the same peer replaces the first, which is logged as suspicious
    pub fn set_session_key(&mut self, id: &PeerId, key: SessionKey) -> Result<(), PeerError> {
        let peer = self
            .peers
            .get_mut(id)
            .ok_or(PeerError::UnknownPeer { peer: *id })?;
        if peer.replace_session_key(key).is_some() {
            warn!("session key of {} was overwritten", id);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.peers.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
        self.addresses.clear();
    }

    fn allocate_id(&mut self) -> Result<PeerId, PeerError> {
        // at most one full lap over the id space
        for _ in 0..=u32::MAX {
            let candidate = PeerId::new(self.next_id);
            self.next_id = self.next_id.wrapping_add(1).max(1);
            if !self.peers.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(PeerError::IdsExhausted)
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
