//! Entity/component storage.
//!
//! A deliberately small store backing the headless [`crate::scene::Scene`].
//! It is not archetype-based; instead it uses typed component storages keyed
//! by entity id.

use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
};

use serde::{Deserialize, Serialize};

/// Opaque entity handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type-erased component storage that can drop an entity's entry.
trait Storage: Any + Send + Sync {
    fn remove_entity(&mut self, entity: EntityId);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static + Send + Sync> Storage for HashMap<EntityId, T> {
    fn remove_entity(&mut self, entity: EntityId) {
        self.remove(&entity);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Simple world that can store typed components.
pub struct World {
    next_id: u64,
    alive: HashSet<EntityId>,
    storages: HashMap<TypeId, Box<dyn Storage>>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            // Zero is never handed out, so a default `EntityId` never aliases
            // a live entity.
            next_id: 1,
            alive: HashSet::new(),
            storages: HashMap::new(),
        }
    }
}

impl World {
    /// Creates a new entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.alive.insert(id);
        id
    }

    /// Removes an entity and all of its components. Returns `false` if it was
    /// not alive.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.alive.remove(&entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        true
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.alive.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Inserts/replaces a component for a live entity. Ignored for dead ones.
    pub fn insert<T: 'static + Send + Sync>(&mut self, entity: EntityId, component: T) {
        if !self.contains(entity) {
            return;
        }
        if let Some(storage) = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(HashMap::<EntityId, T>::new()))
            .as_any_mut()
            .downcast_mut::<HashMap<EntityId, T>>()
        {
            storage.insert(entity, component);
        }
    }

    /// Gets a component reference.
    pub fn get<T: 'static + Send + Sync>(&self, entity: EntityId) -> Option<&T> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<HashMap<EntityId, T>>())
            .and_then(|storage| storage.get(&entity))
    }

    /// Gets a mutable component reference.
    pub fn get_mut<T: 'static + Send + Sync>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<HashMap<EntityId, T>>())
            .and_then(|storage| storage.get_mut(&entity))
    }

    /// Iterates entities with a given component.
    pub fn iter<T: 'static + Send + Sync>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<HashMap<EntityId, T>>())
            .into_iter()
            .flat_map(|storage| storage.iter().map(|(k, v)| (*k, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);

    #[test]
    fn insert_and_get() {
        let mut world = World::default();
        let e = world.spawn();
        world.insert(e, Label("rail"));
        assert_eq!(world.get::<Label>(e), Some(&Label("rail")));
        assert_eq!(world.iter::<Label>().count(), 1);
    }

    #[test]
    fn despawn_drops_components() {
        let mut world = World::default();
        let e = world.spawn();
        world.insert(e, Label("window"));
        assert!(world.despawn(e));
        assert!(!world.despawn(e));
        assert!(world.get::<Label>(e).is_none());
        world.insert(e, Label("ghost"));
        assert!(world.get::<Label>(e).is_none());
    }

    #[test]
    fn ids_start_above_zero() {
        let mut world = World::default();
        assert_ne!(world.spawn(), EntityId(0));
    }
}
