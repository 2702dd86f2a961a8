// memory.rs - Headless scene
//
// Tracks membership only. Used by tests and by native hosts that have no
// renderer attached.

use std::collections::BTreeMap;

use super::{Renderable, RenderableId, RenderableKind, Scene};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneMember {
    pub kind: RenderableKind,
    /// Vertex count (points) or index count (ribbons) at insertion.
    pub elements: usize,
    pub render_order: u32,
}

#[derive(Debug, Default)]
pub struct MemoryScene {
    members: BTreeMap<RenderableId, SceneMember>,
    next_id: u32,
    added: usize,
    removed: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: RenderableId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn get(&self, id: RenderableId) -> Option<&SceneMember> {
        self.members.get(&id)
    }

    pub fn count_kind(&self, kind: RenderableKind) -> usize {
        self.members.values().filter(|m| m.kind == kind).count()
    }

    /// Total successful `add` calls over the scene's lifetime.
    pub fn added(&self) -> usize {
        self.added
    }

    /// Total `remove` calls that found a member.
    pub fn removed(&self) -> usize {
        self.removed
    }
}

impl Scene for MemoryScene {
    fn add(&mut self, renderable: Renderable<'_>) -> RenderableId {
        self.next_id += 1;
        let id = RenderableId(self.next_id);
        let (elements, render_order) = match renderable {
            Renderable::Points { positions, .. } => (positions.len() / 3, 0),
            Renderable::Ribbon { mesh, render_order } => (mesh.indices.len(), render_order),
        };
        self.members.insert(id, SceneMember { kind: renderable.kind(), elements, render_order });
        self.added += 1;
        id
    }

    fn remove(&mut self, id: RenderableId) {
        if self.members.remove(&id).is_some() {
            self.removed += 1;
        }
    }
}
