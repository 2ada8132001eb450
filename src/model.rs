use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub type EntityId = u32;

/// Something the store can persist: a named value with a server-assigned id.
pub trait Entity:
    Clone + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Human readable label, used in logs and error messages.
    const KIND: &'static str;

    fn id(&self) -> EntityId;

    /// Returns the same value carrying `id` instead of its current one.
    fn with_id(self, id: EntityId) -> Self;

    fn name(&self) -> &str;

    /// Field-wise equality ignoring `id`.
    fn same_content(&self, other: &Self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

impl Ingredient {
    pub fn new(id: EntityId, name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ingredient [id={}, name={}, quantity={:.6}, unit={}]",
            self.id, self.name, self.quantity, self.unit
        )
    }
}

impl Entity for Ingredient {
    const KIND: &'static str = "Ingredient";

    fn id(&self) -> EntityId {
        self.id
    }

    fn with_id(self, id: EntityId) -> Self {
        Self { id, ..self }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn same_content(&self, other: &Self) -> bool {
        self.name == other.name && self.quantity == other.quantity && self.unit == other.unit
    }
}

/// A recipe and its ordered ingredient list.
///
/// `ingredients` may be absent from the JSON form, which keeps plain
/// `{"id", "name"}` recipe files loadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ingredients: Vec::new(),
        }
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recipe [id={}, name={}, ingredients=[", self.id, self.name)?;
        for (i, ingredient) in self.ingredients.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ingredient)?;
        }
        f.write_str("]]")
    }
}

impl Entity for Recipe {
    const KIND: &'static str = "Recipe";

    fn id(&self) -> EntityId {
        self.id
    }

    fn with_id(self, id: EntityId) -> Self {
        Self { id, ..self }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn same_content(&self, other: &Self) -> bool {
        self.name == other.name && self.ingredients == other.ingredients
    }
}
