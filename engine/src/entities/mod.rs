//! Entity extraction
//!
//! Scans text for the literal surface forms of each entity type and maps the
//! first match through the type's normalization table. Matching is a
//! case-insensitive substring search; entity types are scanned by descending
//! priority, then declaration order. No cross-entity disambiguation happens:
//! two types may claim the same span.
//!
//! The extractor also implements [`EntityExtractionService`], so a host can
//! inject it as the follow-up collaborator of a dialogue engine.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::services::EntityExtractionService;
use sdk::types::EntityMap;
use tracing::debug;

use crate::vocabulary::{EntityDefinition, Vocabulary};

/// Pattern-based entity extractor
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    /// Sorted by scan order
    definitions: Vec<EntityDefinition>,
}

impl EntityExtractor {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        let mut definitions = vocabulary.entities.clone();
        // stable: equal priorities keep declaration order
        definitions.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self { definitions }
    }

    /// Extract every entity type present in `text`
    pub fn extract(&self, text: &str) -> EntityMap {
        let lowered = text.to_lowercase();
        let mut entities = EntityMap::new();

        for definition in &self.definitions {
            if let Some(value) = Self::scan(definition, &lowered) {
                debug!("Extracted {}={}", definition.name, value);
                entities.insert(definition.name.clone(), value);
            }
        }

        entities
    }

    /// Extract a single entity type
    pub fn extract_one(&self, text: &str, entity_type: &str) -> Option<String> {
        let definition = self.definition(entity_type)?;
        Self::scan(definition, &text.to_lowercase())
    }

    pub fn definition(&self, entity_type: &str) -> Option<&EntityDefinition> {
        self.definitions.iter().find(|d| d.name == entity_type)
    }

    /// Entity type names in scan order
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    fn scan(definition: &EntityDefinition, lowered: &str) -> Option<String> {
        definition
            .patterns
            .iter()
            .find(|pattern| !pattern.is_empty() && lowered.contains(&pattern.to_lowercase()))
            .map(|pattern| definition.canonical(pattern))
    }
}

#[async_trait]
impl EntityExtractionService for EntityExtractor {
    /// Configured patterns first, then the offered valid values
    async fn extract_entity(
        &self,
        text: &str,
        entity_type: &str,
        valid_values: &[String],
    ) -> Result<Option<String>, EngineError> {
        if let Some(value) = self.extract_one(text, entity_type) {
            if valid_values.is_empty() || valid_values.iter().any(|v| v.eq_ignore_ascii_case(&value))
            {
                return Ok(Some(value));
            }
        }

        let lowered = text.to_lowercase();
        let offered = valid_values
            .iter()
            .find(|v| !v.is_empty() && lowered.contains(&v.to_lowercase()))
            .map(|v| match self.definition(entity_type) {
                Some(definition) => definition.canonical(v),
                None => v.to_lowercase(),
            });

        Ok(offered)
    }
}
