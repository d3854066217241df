// Copyright 2025 Cowboy AI, LLC.

//! Ingredients: quantified references from an action to a material it consumes

use crate::entity::Contents;
use crate::errors::{ProvenanceError, ProvenanceResult};
use crate::event::{EventKind, EventNode, EventRef};
use crate::versionstamp::VersionId;

/// Amount used by the "whole" sentinel
pub const WHOLE_AMOUNT: f64 = 100.0;

/// Unit used by the "whole" sentinel
pub const WHOLE_UNIT: &str = "percent";

/// A material consumed by an action, with an optional quantity
///
/// The material is referenced by id; the ingredient never owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    name: String,
    material: VersionId,
    amount: Option<f64>,
    unit: Option<String>,
    contents: Contents,
}

impl Ingredient {
    /// Quantified ingredient, named after the material
    pub fn new(material: &EventNode, amount: f64, unit: impl Into<String>) -> ProvenanceResult<Self> {
        Self::build(material, Some(amount), Some(unit.into()))
    }

    /// Quantity deferred: amount and unit absent
    pub fn unspecified(material: &EventNode) -> ProvenanceResult<Self> {
        Self::build(material, None, None)
    }

    /// Entire upstream material consumed (100 percent)
    pub fn whole(material: &EventNode) -> ProvenanceResult<Self> {
        Self::build(material, Some(WHOLE_AMOUNT), Some(WHOLE_UNIT.to_string()))
    }

    fn build(
        material: &EventNode,
        amount: Option<f64>,
        unit: Option<String>,
    ) -> ProvenanceResult<Self> {
        if material.kind() != EventKind::Material {
            return Err(ProvenanceError::type_mismatch(
                EventKind::Material,
                material.kind(),
            ));
        }
        Ok(Self {
            name: material.name().to_string(),
            material: material.id(),
            amount,
            unit,
            contents: Contents::new(),
        })
    }

    pub(crate) fn restored(
        name: String,
        material: VersionId,
        amount: Option<f64>,
        unit: Option<String>,
        contents: Contents,
    ) -> Self {
        Self {
            name,
            material,
            amount,
            unit,
            contents,
        }
    }

    /// Override the inherited name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach opaque contents
    pub fn with_contents(mut self, contents: Contents) -> Self {
        self.contents = contents;
        self
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Referenced material
    pub fn material(&self) -> VersionId {
        self.material
    }

    /// Reference to the material as a link target
    pub fn material_ref(&self) -> EventRef {
        EventRef::new(self.material, EventKind::Material)
    }

    /// Amount, if specified
    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    /// Unit, if specified
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Contents
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Amount and unit both absent
    pub fn is_unspecified(&self) -> bool {
        self.amount.is_none() && self.unit.is_none()
    }

    /// The "whole material" sentinel
    pub fn is_whole(&self) -> bool {
        self.amount == Some(WHOLE_AMOUNT) && self.unit.as_deref() == Some(WHOLE_UNIT)
    }
}

/// What [`EventArena::add_ingredient`](crate::EventArena::add_ingredient) accepts
///
/// A bare material id is wrapped as an unspecified-amount ingredient.
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientInput {
    /// Fully described ingredient
    Ingredient(Ingredient),
    /// Bare material
    Material(VersionId),
}

impl From<Ingredient> for IngredientInput {
    fn from(ingredient: Ingredient) -> Self {
        IngredientInput::Ingredient(ingredient)
    }
}

impl From<VersionId> for IngredientInput {
    fn from(material: VersionId) -> Self {
        IngredientInput::Material(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versionstamp::VersionstampGenerator;

    #[test]
    fn test_sentinels() {
        let gen = VersionstampGenerator::new();
        let fe = EventNode::material(&gen, "Iron powder").unwrap();

        let whole = Ingredient::whole(&fe).unwrap();
        assert!(whole.is_whole());
        assert!(!whole.is_unspecified());
        assert_eq!(whole.amount(), Some(100.0));
        assert_eq!(whole.unit(), Some("percent"));

        let deferred = Ingredient::unspecified(&fe).unwrap();
        assert!(deferred.is_unspecified());
        assert_eq!(deferred.name(), "Iron powder");
        assert_eq!(deferred.material(), fe.id());
    }

    #[test]
    fn test_rejects_non_material() {
        let gen = VersionstampGenerator::new();
        let mix = EventNode::action(&gen, "mix", None).unwrap();
        assert_eq!(
            Ingredient::new(&mix, 1.0, "g"),
            Err(ProvenanceError::type_mismatch("material", "action"))
        );
    }

    #[test]
    fn test_with_name_overrides() {
        let gen = VersionstampGenerator::new();
        let tio2 = EventNode::material(&gen, "Titanium Dioxide").unwrap();
        let ingredient = Ingredient::new(&tio2, 1.0, "g").unwrap().with_name("TiO2 1g");
        assert_eq!(ingredient.name(), "TiO2 1g");
        assert_eq!(ingredient.material_ref().kind, EventKind::Material);
    }
}
