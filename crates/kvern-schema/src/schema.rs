use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use kvern_types::{ModelName, Record};
use tracing::debug;

use crate::builder::ModelBuilder;
use crate::error::ConfigError;
use crate::hooks::{Hook, HookError, HookPoint};
use crate::inflect;
use crate::model::{ModelDescription, ReferenceKey};

/// The schema registry: every declared model plus the registered hooks.
///
/// Built once at startup, finalized, then shared read-only by every
/// accessor. `finalize` resolves the cross-references between declared
/// references and the reverse collections they imply; it is idempotent.
pub struct Schema {
    pub(crate) models: BTreeMap<ModelName, ModelDescription>,
    hooks: BTreeMap<HookPoint, Vec<Hook>>,
    finalized: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
            hooks: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Declare a model with no builder block.
    ///
    /// Idempotent: re-declaring a name returns without disturbing the
    /// existing description.
    pub fn add_model(&mut self, name: impl Into<ModelName>) {
        let name = name.into();
        self.models
            .entry(name.clone())
            .or_insert_with(|| ModelDescription::new(name));
    }

    /// Declare (or extend) a model through a builder closure.
    pub fn model<F>(&mut self, name: impl Into<ModelName>, build: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut ModelBuilder<'_>) -> Result<(), ConfigError>,
    {
        let name = name.into();
        self.add_model(name.clone());
        let mut builder = ModelBuilder::new(self, name);
        build(&mut builder)
    }

    /// Append a hook action to the named hook point.
    ///
    /// Hooks accumulate in declaration order and run in that order against
    /// every record persisted.
    pub fn add_hook<F>(&mut self, point: HookPoint, hook: F)
    where
        F: Fn(&Record) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.entry(point).or_default().push(Arc::new(hook));
    }

    /// The registered hooks for one point, in declaration order.
    pub fn hooks(&self, point: HookPoint) -> &[Hook] {
        self.hooks.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve the description graph: link every declared reference to the
    /// reverse collection it implies on its target model (matched by the
    /// pluralized source-model name) and install the back-link on that
    /// collection.
    ///
    /// Idempotent: a no-op after the first successful call.
    pub fn finalize(&mut self) -> Result<(), ConfigError> {
        if self.finalized {
            return Ok(());
        }

        // Pass 1: validate every reference and plan the links.
        let mut links = Vec::new();
        for (name, description) in &self.models {
            for (index, reference) in description.references.iter().enumerate() {
                let target = self.models.get(&reference.target_model).ok_or_else(|| {
                    ConfigError::UnresolvedReference {
                        model: reference.target_model.clone(),
                        referrer: name.clone(),
                    }
                })?;
                let implied_name = inflect::pluralize(name.as_str());
                if !target.collections.contains_key(&implied_name) {
                    return Err(ConfigError::MissingImpliedCollection {
                        model: reference.target_model.clone(),
                        collection: implied_name,
                    });
                }
                links.push((
                    name.clone(),
                    index,
                    reference.target_model.clone(),
                    implied_name,
                    reference.foreign_key.clone(),
                ));
            }
        }

        // Pass 2: back-link each implied collection to its reference.
        for (_, _, target, implied_name, foreign_key) in &links {
            let collection = self
                .models
                .get_mut(target)
                .and_then(|m| m.collections.get_mut(implied_name))
                .expect("collection validated in pass 1");
            collection.reference = Some(ReferenceKey {
                model: target.clone(),
                attribute: foreign_key.clone(),
            });
        }

        // Pass 3: copy the resolved collections into the references.
        for (referrer, index, target, implied_name, _) in links {
            let collection = self.models[&target].collections[&implied_name].clone();
            let reference = self
                .models
                .get_mut(&referrer)
                .and_then(|m| m.references.get_mut(index))
                .expect("reference validated in pass 1");
            reference.implied_collection = Some(collection);
        }

        self.finalized = true;
        debug!(models = self.models.len(), "schema finalized");
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Look up one model description.
    pub fn model_description(&self, name: &ModelName) -> Option<&ModelDescription> {
        self.models.get(name)
    }

    /// Look up one model description, failing if it was never declared.
    pub fn expect_model(&self, name: &ModelName) -> Result<&ModelDescription, ConfigError> {
        self.models
            .get(name)
            .ok_or_else(|| ConfigError::UndescribedModel(name.clone()))
    }

    /// All declared models, in name order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDescription> {
        self.models.values()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("finalized", &self.finalized)
            .finish()
    }
}
