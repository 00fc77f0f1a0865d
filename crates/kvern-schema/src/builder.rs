use kvern_types::ModelName;

use crate::error::ConfigError;
use crate::inflect;
use crate::model::{CollectionDescription, CollectionKind, ModelDescription, ReferenceDescription};
use crate::schema::Schema;

/// Options for a collection declaration.
///
/// `via` routes the collection through an intermediate model (a join);
/// `sort_by` orders it by a numeric attribute of the source model. The two
/// are mutually exclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionOptions {
    pub via: Option<String>,
    pub sort_by: Option<String>,
}

impl CollectionOptions {
    /// A plain referenced collection.
    pub fn none() -> Self {
        Self::default()
    }

    /// Route through an intermediate model, e.g. `actors` via `roles`.
    pub fn via(model: impl Into<String>) -> Self {
        Self {
            via: Some(model.into()),
            ..Self::default()
        }
    }

    /// Order by a numeric attribute of the source model.
    pub fn sort_by(attribute: impl Into<String>) -> Self {
        Self {
            sort_by: Some(attribute.into()),
            ..Self::default()
        }
    }

    /// Add a `sort_by` option to an existing set of options.
    #[must_use]
    pub fn and_sort_by(mut self, attribute: impl Into<String>) -> Self {
        self.sort_by = Some(attribute.into());
        self
    }

    /// Add a `via` option to an existing set of options.
    #[must_use]
    pub fn and_via(mut self, model: impl Into<String>) -> Self {
        self.via = Some(model.into());
        self
    }
}

/// Builder scope for one model declaration.
///
/// Passed to the closure given to [`Schema::model`]; the current model is
/// an explicit field, not an implicit receiver.
pub struct ModelBuilder<'a> {
    schema: &'a mut Schema,
    model: ModelName,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(schema: &'a mut Schema, model: ModelName) -> Self {
        Self { schema, model }
    }

    /// The model this builder declares into.
    pub fn current_model(&self) -> &ModelName {
        &self.model
    }

    /// Declare a belongs-to reference to `target`.
    ///
    /// Eagerly creates the target model if it was never described and
    /// ensures the implied reverse collection (named after the pluralized
    /// source model) exists on it. An explicit collection declaration with
    /// the same name wins over the implicit one, regardless of order.
    pub fn references(&mut self, target: &str) {
        let target = ModelName::new(target);
        let foreign_key = format!("{target}_uid");

        self.current_mut().references.push(ReferenceDescription {
            target_model: target.clone(),
            foreign_key: foreign_key.clone(),
            implied_collection: None,
        });

        let source = self.model.clone();
        let implied_name = inflect::pluralize(source.as_str());
        let target_desc = self
            .schema
            .models
            .entry(target.clone())
            .or_insert_with(|| ModelDescription::new(target));
        target_desc
            .collections
            .entry(implied_name.clone())
            .or_insert_with(|| CollectionDescription {
                name: implied_name,
                kind: CollectionKind::Referenced,
                source_model: source,
                foreign_key,
                reference: None,
            });
    }

    /// Declare a collection named `name` on the current model.
    ///
    /// The source model is inferred by singularizing the collection name.
    /// The kind follows from the options: `sort_by` makes it sorted, `via`
    /// indirect, neither referenced. Declaring both fails.
    pub fn collection(&mut self, name: &str, options: CollectionOptions) -> Result<(), ConfigError> {
        let source = ModelName::new(inflect::singularize(name));
        let owner_foreign_key = format!("{}_uid", self.model);

        let description = match (options.via, options.sort_by) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::ConflictingCollectionOptions(name.to_string()));
            }
            (None, Some(sort_by)) => CollectionDescription {
                name: name.to_string(),
                kind: CollectionKind::Sorted {
                    sort_by,
                    set_attribute: inflect::pluralize(&format!("{source}_uid")),
                },
                source_model: source,
                foreign_key: owner_foreign_key,
                reference: None,
            },
            (Some(via), None) => CollectionDescription {
                name: name.to_string(),
                kind: CollectionKind::Indirect {
                    target_model: source.clone(),
                    target_attribute: format!("{source}_uid"),
                },
                source_model: ModelName::new(inflect::singularize(&via)),
                foreign_key: owner_foreign_key,
                reference: None,
            },
            (None, None) => CollectionDescription {
                name: name.to_string(),
                kind: CollectionKind::Referenced,
                source_model: source,
                foreign_key: owner_foreign_key,
                reference: None,
            },
        };

        // Explicit declarations always replace an implicit entry.
        self.current_mut()
            .collections
            .insert(name.to_string(), description);
        Ok(())
    }

    fn current_mut(&mut self) -> &mut ModelDescription {
        self.schema
            .models
            .get_mut(&self.model)
            .expect("builder model was inserted before the builder was created")
    }
}
