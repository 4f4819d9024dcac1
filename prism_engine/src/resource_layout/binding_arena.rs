/// Binding arena: every binding group of a scene in one flat pool
///
/// Groups are owned here and addressed by `ResourceLayoutIndexer::binding_index`,
/// never by nested per-slot or per-material containers.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::BindingGroup;
use crate::resource_layout::ResourceLayoutIndexer;

pub struct BindingArena {
    indexer: ResourceLayoutIndexer,
    groups: Vec<Arc<dyn BindingGroup>>,
}

impl BindingArena {
    /// Fill the arena by calling `create(slot, material)` for every pair
    ///
    /// Each group lands at `indexer.binding_index(slot, material)`.
    pub fn build<F>(indexer: ResourceLayoutIndexer, mut create: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> Result<Arc<dyn BindingGroup>>,
    {
        let mut slots: Vec<Option<Arc<dyn BindingGroup>>> = vec![None; indexer.binding_count()];

        for material in 0..indexer.material_count() {
            for slot in 0..indexer.frames_in_flight() {
                let index = indexer.binding_index(slot, material)?;
                if slots[index].is_some() {
                    return Err(Error::InvalidState(format!(
                        "binding index {} assigned twice",
                        index
                    )));
                }
                slots[index] = Some(create(slot, material)?);
            }
        }

        let groups = slots
            .into_iter()
            .enumerate()
            .map(|(i, g)| g.ok_or_else(|| Error::InvalidState(format!("binding index {} never assigned", i))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { indexer, groups })
    }

    /// Group bound for `slot` and `material`
    pub fn group(&self, slot: u32, material: u32) -> Result<&Arc<dyn BindingGroup>> {
        let index = self.indexer.binding_index(slot, material)?;
        self.groups
            .get(index)
            .ok_or_else(|| Error::InvalidResource(format!("binding index {} not in arena", index)))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn indexer(&self) -> &ResourceLayoutIndexer {
        &self.indexer
    }
}

#[cfg(test)]
#[path = "binding_arena_tests.rs"]
mod tests;
