//! # Entity Templates
//!
//! Named builders that populate a freshly created entity.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::{EcsError, EcsResult};
use crate::manager::EntityManager;

/// Populates a new entity with components.
///
/// Implemented for every `Fn(&mut EntityManager, Entity)`.
pub trait EntityTemplate {
    /// Attaches the template's components to `entity`.
    fn build(&self, entities: &mut EntityManager, entity: Entity);
}

impl<F> EntityTemplate for F
where
    F: Fn(&mut EntityManager, Entity),
{
    fn build(&self, entities: &mut EntityManager, entity: Entity) {
        self(entities, entity);
    }
}

/// Templates by name.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Box<dyn EntityTemplate>>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `template` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TemplateAlreadyRegistered`] if the name is taken.
    pub fn register(&mut self, name: impl Into<String>, template: Box<dyn EntityTemplate>) -> EcsResult<()> {
        let name = name.into();
        if self.templates.contains_key(&name) {
            return Err(EcsError::TemplateAlreadyRegistered { name });
        }
        tracing::info!(template = %name, "entity template registered");
        self.templates.insert(name, template);
        Ok(())
    }

    /// Checks whether a template is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Creates an entity and runs the template named `name` on it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TemplateNotFound`] if no such template exists; no
    /// entity is created in that case.
    pub fn create(&self, name: &str, entities: &mut EntityManager) -> EcsResult<Entity> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| EcsError::TemplateNotFound { name: name.to_owned() })?;
        let entity = entities.create_entity();
        template.build(entities, entity);
        Ok(entity)
    }
}
