use std::{any::Any, fmt, sync::Arc};

use bevy_ecs::{entity::Entity, prelude::Resource};
use crossbeam_queue::SegQueue;

/// Type-erased calendar action or notification.
pub struct UiEvent {
    pub entity: Entity,
    pub action: Box<dyn Any + Send + Sync>,
}

impl fmt::Debug for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiEvent")
            .field("entity", &self.entity)
            .field("action", &"<type-erased>")
            .finish()
    }
}

impl UiEvent {
    #[must_use]
    pub fn typed<T: Any + Send + Sync>(entity: Entity, action: T) -> Self {
        Self {
            entity,
            action: Box::new(action),
        }
    }

    #[must_use]
    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.action.is::<T>()
    }

    pub fn into_action<T: Any + Send + Sync>(self) -> Result<TypedUiEvent<T>, Self> {
        let entity = self.entity;
        match self.action.downcast::<T>() {
            Ok(action) => Ok(TypedUiEvent {
                entity,
                action: *action,
            }),
            Err(action) => Err(Self { entity, action }),
        }
    }
}

/// Typed entry produced from a type-erased [`UiEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedUiEvent<T> {
    pub entity: Entity,
    pub action: T,
}

/// Lock-free queue shared between hosts and calendar systems.
#[derive(Resource, Clone, Debug)]
pub struct UiEventQueue {
    queue: Arc<SegQueue<UiEvent>>,
}

impl Default for UiEventQueue {
    fn default() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
        }
    }
}

impl UiEventQueue {
    pub fn push(&self, event: UiEvent) {
        self.queue.push(event);
    }

    pub fn push_typed<T: Any + Send + Sync>(&self, entity: Entity, action: T) {
        self.push(UiEvent::typed(entity, action));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn drain_all(&self) -> Vec<UiEvent> {
        let mut drained = Vec::new();
        while let Some(event) = self.queue.pop() {
            drained.push(event);
        }
        drained
    }

    /// Drain entries of type `T`.
    ///
    /// Entries of other types are pushed back in their original order.
    #[must_use]
    pub fn drain_actions<T: Any + Send + Sync>(&self) -> Vec<TypedUiEvent<T>> {
        let mut drained = Vec::new();
        let mut kept = Vec::new();
        for event in self.drain_all() {
            match event.into_action::<T>() {
                Ok(event) => drained.push(event),
                Err(other) => kept.push(other),
            }
        }
        for event in kept {
            self.queue.push(event);
        }
        drained
    }
}
