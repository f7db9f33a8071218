//! The ownership registry.
//!
//! Models declare the owners they belong to ([`Model::RELATIONS`]). The
//! registry collects those declarations once at startup and inverts them into
//! an owner → dependents map, which is all the cascade needs to walk.

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  model::{META_FIELDS, Model, Relation},
};

/// Registered metadata for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
  pub name:                &'static str,
  pub verbose_name_plural: &'static str,
  pub relations:           &'static [Relation],
}

impl ModelInfo {
  /// `true` if `field` is one of this model's ownership columns.
  pub fn is_relation_column(&self, field: &str) -> bool {
    self.relations.iter().any(|r| r.column == field)
  }
}

/// A dependent model and the column pointing back at its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependent {
  pub model:  &'static str,
  pub column: &'static str,
}

/// The resolved registry. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Schema {
  models:     BTreeMap<&'static str, ModelInfo>,
  dependents: BTreeMap<&'static str, Vec<Dependent>>,
}

impl Schema {
  pub fn builder() -> SchemaBuilder { SchemaBuilder::default() }

  /// Look up a registered model by name.
  pub fn model(&self, name: &str) -> Result<&ModelInfo> {
    self
      .models
      .get(name)
      .ok_or_else(|| Error::UnknownModel(name.to_owned()))
  }

  pub fn models(&self) -> impl Iterator<Item = &ModelInfo> {
    self.models.values()
  }

  /// Every dependent owned by `owner`. Empty when nothing belongs to it.
  pub fn dependents_of(&self, owner: &str) -> &[Dependent] {
    self.dependents.get(owner).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Collects model registrations; see [`Schema::builder`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
  models: Vec<ModelInfo>,
}

impl SchemaBuilder {
  pub fn register<T: Model>(mut self) -> Self {
    self.models.push(ModelInfo {
      name:                T::NAME,
      verbose_name_plural: T::VERBOSE_NAME_PLURAL,
      relations:           T::RELATIONS,
    });
    self
  }

  /// Validate every registration and build the owner → dependents map.
  pub fn build(self) -> Result<Schema> {
    let mut models = BTreeMap::new();
    for info in self.models {
      validate_identifier(info.name)?;
      for relation in info.relations {
        validate_identifier(relation.column)?;
        if is_reserved_column(relation.column) {
          return Err(Error::InvalidIdentifier(relation.column.to_owned()));
        }
      }
      let name = info.name;
      if models.insert(name, info).is_some() {
        return Err(Error::DuplicateModel(name.to_owned()));
      }
    }

    let mut dependents: BTreeMap<&'static str, Vec<Dependent>> = BTreeMap::new();
    for info in models.values() {
      for relation in info.relations {
        if !models.contains_key(relation.owner) {
          return Err(Error::UnknownOwner {
            model: info.name.to_owned(),
            owner: relation.owner.to_owned(),
          });
        }
        dependents.entry(relation.owner).or_default().push(Dependent {
          model:  info.name,
          column: relation.column,
        });
      }
    }

    Ok(Schema { models, dependents })
  }
}

/// Accept only `[A-Za-z_][A-Za-z0-9_]*`; names end up inside SQL.
pub fn validate_identifier(name: &str) -> Result<()> {
  let mut chars = name.chars();
  let valid = chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
  if valid {
    Ok(())
  } else {
    Err(Error::InvalidIdentifier(name.to_owned()))
  }
}

fn is_reserved_column(column: &str) -> bool {
  column == "data" || META_FIELDS.contains(&column)
}
