//! Tokens currently placed on the work surface.

use aether_types::{InstanceId, KindId, Position, TokenInstance};

/// Placed instances in placement order.
///
/// Ids are never reused, even after `clear`.
#[derive(Debug, Default)]
pub struct Surface {
    instances: Vec<TokenInstance>,
    next_id: u64,
}

impl Surface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, kind: KindId, position: Position) -> InstanceId {
        self.next_id += 1;
        let id = InstanceId::new(self.next_id);
        self.instances.push(TokenInstance { id, kind, position });
        id
    }

    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&TokenInstance> {
        self.instances.iter().find(|instance| instance.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Returns `false` if `id` is not on the surface.
    pub fn move_to(&mut self, id: InstanceId, position: Position) -> bool {
        match self.instances.iter_mut().find(|instance| instance.id == id) {
            Some(instance) => {
                instance.position = position;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<TokenInstance> {
        let index = self.instances.iter().position(|instance| instance.id == id)?;
        Some(self.instances.remove(index))
    }

    /// Remove both instances, or neither.
    ///
    /// Fails when either id is absent or both ids are the same instance.
    pub fn take_pair(
        &mut self,
        a: InstanceId,
        b: InstanceId,
    ) -> Option<(TokenInstance, TokenInstance)> {
        if a == b || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let first = self.remove(a)?;
        let second = self.remove(b)?;
        Some((first, second))
    }

    /// Remove every instance, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.instances.len();
        self.instances.clear();
        count
    }

    #[must_use]
    pub fn instances(&self) -> &[TokenInstance] {
        &self.instances
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
