use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::composition::{BaseComponent, Composition};
use crate::config::{
    NutritionSettings, Precision, AMOUNT_PRECISION, DESCR_LENGTH, NAME_LENGTH,
    NUTRIENT_MAX_DIGITS, PRICE_AMOUNT_PRECISION, PRICE_WEIGHT_PRECISION, QUANTITY_PRECISION,
    SERVES_PRECISION, SERVING_PRECISION, TAG_LENGTH, TARGET_MAX_DIGITS,
};
use crate::error::ServiceError;
use crate::nutrients::{NutrientKey, NutrientRecord};
use crate::ratios::{add_nutrition_ratios, NutritionData, NutritionInput};
use crate::schema::{
    base_component, component, food, ingredient, price, recipe, target, target_bound,
};

/// Slug derived from a name, the way Django's `slugify` does it.
///
/// Accents are folded to ASCII and anything that is not a letter, digit,
/// underscore, hyphen or space is dropped without splitting the word
/// ("McVitie's" becomes "mcvities"). Runs of spaces and hyphens become one
/// hyphen, and leading or trailing hyphens and underscores are trimmed.
pub(crate) fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut separator = false;
    for c in name.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if separator && !slug.is_empty() {
                slug.push('-');
            }
            separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_whitespace() {
            separator = true;
        }
    }
    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Tag names follow slug rules: lowercase letters, digits, hyphens, underscores.
pub(crate) fn is_slug_like(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= TAG_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn check_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation("name must not be blank".to_string()));
    }
    if name.len() > NAME_LENGTH {
        return Err(ServiceError::Validation(format!(
            "name is longer than {NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), ServiceError> {
    if description.len() > DESCR_LENGTH {
        return Err(ServiceError::Validation(format!(
            "description is longer than {DESCR_LENGTH} characters"
        )));
    }
    Ok(())
}

fn check_tags(tags: &[String]) -> Result<(), ServiceError> {
    match tags.iter().find(|tag| !is_slug_like(tag)) {
        Some(bad) => Err(ServiceError::Validation(format!(
            "tag {bad:?} may only contain lowercase letters, digits, hyphens and underscores"
        ))),
        None => Ok(()),
    }
}

fn check_not_negative(what: &str, value: Option<Decimal>) -> Result<(), ServiceError> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(ServiceError::Validation(format!(
            "{what} must not be negative"
        ))),
        _ => Ok(()),
    }
}

/// Rejects values a `DECIMAL(digits, places)` column cannot hold, before
/// MySQL gets to refuse them.
fn check_precision(
    what: &str,
    value: Option<Decimal>,
    (digits, places): Precision,
) -> Result<(), ServiceError> {
    let value = match value {
        Some(v) => v.normalize(),
        None => return Ok(()),
    };
    if value.scale() > places {
        return Err(ServiceError::Validation(format!(
            "{what} allows at most {places} decimal places"
        )));
    }
    let limit = Decimal::from(10_i64.pow(digits - places));
    if value.abs() >= limit {
        return Err(ServiceError::Validation(format!(
            "{what} must be less than {limit}"
        )));
    }
    Ok(())
}

pub(crate) fn check_nutrients(
    nutrients: &NutrientRecord,
    max_digits: u32,
) -> Result<(), ServiceError> {
    let negative = nutrients.negative_keys();
    if !negative.is_empty() {
        let keys: Vec<&str> = negative.iter().map(|key| key.as_str()).collect();
        return Err(ServiceError::Validation(format!(
            "nutrients must not be negative: {}",
            keys.join(", ")
        )));
    }
    for key in NutrientKey::ALL {
        check_precision(
            key.as_str(),
            nutrients.get(key),
            (max_digits, key.decimal_places()),
        )?;
    }
    for warning in nutrients.warnings() {
        log::warn!("accepting inconsistent nutrients: {warning}");
    }
    Ok(())
}

// Ingredients

#[derive(Debug, Clone, Queryable)]
pub(crate) struct IngredientRow {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub owner_id: Option<i32>,
    pub serving: Option<Decimal>,
    pub introduction: String,
    pub notes: String,
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A generic kind of ingredient, like "Rolled Oats". Not a brand or product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Ingredient {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// `None` for global ingredients.
    pub owner_id: Option<i32>,
    /// Optional grams per serving.
    pub serving: Option<Decimal>,
    pub introduction: String,
    pub notes: String,
    pub nutrients: NutrientRecord,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            owner_id: row.owner_id,
            serving: row.serving,
            introduction: row.introduction,
            notes: row.notes,
            nutrients: NutrientRecord {
                energy: row.energy,
                protein: row.protein,
                fibre: row.fibre,
                carbohydrate: row.carbohydrate,
                fat: row.fat,
                sugar: row.sugar,
                saturated_fat: row.saturated_fat,
                sodium: row.sodium,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Ingredient {
    /// Known nutrition values plus ratios, given the lowest cost per kilogram.
    pub(crate) fn nutrition_data(
        &self,
        settings: &NutritionSettings,
        best_price: Option<Decimal>,
    ) -> NutritionData {
        add_nutrition_ratios(&NutritionInput::new(
            settings,
            best_price,
            self.serving,
            &self.nutrients,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub serving: Option<Decimal>,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nutrients: NutrientRecord,
}

impl NewIngredient {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        check_name(&self.name)?;
        check_description(&self.description)?;
        check_not_negative("serving", self.serving)?;
        check_precision("serving", self.serving, SERVING_PRECISION)?;
        check_tags(&self.tags)?;
        check_nutrients(&self.nutrients, NUTRIENT_MAX_DIGITS)?;
        if slugify(&self.name).is_empty() {
            return Err(ServiceError::Validation(format!(
                "cannot derive a slug from {:?}",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Insertable)]
#[table_name = "ingredient"]
pub(crate) struct IngredientInsert<'a> {
    pub name: &'a str,
    pub slug: String,
    pub description: &'a str,
    pub owner_id: Option<i32>,
    pub serving: Option<Decimal>,
    pub introduction: &'a str,
    pub notes: &'a str,
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
}

impl<'a> IngredientInsert<'a> {
    /// The slug is fixed here, on first save. A clash is a unique violation.
    pub(crate) fn new(new: &'a NewIngredient, owner_id: Option<i32>) -> Self {
        let n = &new.nutrients;
        Self {
            name: &new.name,
            slug: slugify(&new.name),
            description: &new.description,
            owner_id,
            serving: new.serving,
            introduction: &new.introduction,
            notes: &new.notes,
            energy: n.energy,
            protein: n.protein,
            fibre: n.fibre,
            carbohydrate: n.carbohydrate,
            fat: n.fat,
            sugar: n.sugar,
            saturated_fat: n.saturated_fat,
            sodium: n.sodium,
        }
    }
}

/// Full replacement of the editable fields. The slug never changes.
#[derive(AsChangeset)]
#[table_name = "ingredient"]
#[changeset_options(treat_none_as_null = "true")]
pub(crate) struct IngredientChanges<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub serving: Option<Decimal>,
    pub introduction: &'a str,
    pub notes: &'a str,
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
}

impl<'a> From<&'a NewIngredient> for IngredientChanges<'a> {
    fn from(new: &'a NewIngredient) -> Self {
        let n = &new.nutrients;
        Self {
            name: &new.name,
            description: &new.description,
            serving: new.serving,
            introduction: &new.introduction,
            notes: &new.notes,
            energy: n.energy,
            protein: n.protein,
            fibre: n.fibre,
            carbohydrate: n.carbohydrate,
            fat: n.fat,
            sugar: n.sugar,
            saturated_fat: n.saturated_fat,
            sodium: n.sodium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize, Deserialize)]
pub(crate) struct IngredientTag {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Listing entry kept in the cache; ratios are recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct IngredientListing {
    pub ingredient: Ingredient,
    pub tags: Vec<String>,
    pub best_price: Option<Decimal>,
}

// Prices

#[derive(Debug, Clone, PartialEq, Queryable, Serialize, Deserialize)]
pub(crate) struct Price {
    pub id: i32,
    pub ingredient_id: i32,
    pub amount: Decimal,
    /// Kilograms bought for `amount`.
    pub weight: Decimal,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewPrice {
    pub amount: Decimal,
    pub weight: Decimal,
    #[serde(default)]
    pub notes: String,
}

impl NewPrice {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        check_not_negative("amount", Some(self.amount))?;
        check_precision("amount", Some(self.amount), PRICE_AMOUNT_PRECISION)?;
        if self.weight <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "weight must be greater than zero".to_string(),
            ));
        }
        check_precision("weight", Some(self.weight), PRICE_WEIGHT_PRECISION)?;
        check_description(&self.notes)
    }
}

#[derive(Insertable)]
#[table_name = "price"]
pub(crate) struct PriceInsert<'a> {
    pub ingredient_id: i32,
    pub amount: Decimal,
    pub weight: Decimal,
    pub notes: &'a str,
}

// Recipes

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize, Deserialize)]
pub(crate) struct RecipeFlag {
    pub id: i32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Serialize)]
pub(crate) struct Recipe {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub owner_id: Option<i32>,
    pub description: String,
    pub introduction: String,
    pub method: String,
    pub notes: String,
    pub serves: Option<Decimal>,
    pub flag_id: Option<i32>,
}

/// One line of a recipe: some quantity of an ingredient or of another recipe.
#[derive(Debug, Clone, PartialEq, Queryable, Serialize)]
pub(crate) struct Component {
    pub id: i32,
    pub in_recipe_id: i32,
    pub of_ingredient_id: Option<i32>,
    pub of_recipe_id: Option<i32>,
    /// Kilograms.
    pub quantity: Option<Decimal>,
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewComponent {
    /// Ingredient slug.
    pub of_ingredient: Option<String>,
    /// Recipe slug.
    pub of_recipe: Option<String>,
    /// Kilograms.
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewRecipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub notes: String,
    pub serves: Option<Decimal>,
    pub flag: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub components: Vec<NewComponent>,
}

impl NewRecipe {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        check_name(&self.name)?;
        check_description(&self.description)?;
        check_not_negative("serves", self.serves)?;
        check_precision("serves", self.serves, SERVES_PRECISION)?;
        check_tags(&self.tags)?;
        if slugify(&self.name).is_empty() {
            return Err(ServiceError::Validation(format!(
                "cannot derive a slug from {:?}",
                self.name
            )));
        }
        for (i, line) in self.components.iter().enumerate() {
            if line.of_ingredient.is_some() == line.of_recipe.is_some() {
                return Err(ServiceError::Validation(format!(
                    "component {i} must name exactly one of of_ingredient or of_recipe"
                )));
            }
            if line.of_recipe.as_deref() == Some(slugify(&self.name).as_str()) {
                return Err(ServiceError::Validation(format!(
                    "component {i} refers to the recipe itself"
                )));
            }
            check_not_negative("quantity", line.quantity)?;
            check_precision("quantity", line.quantity, QUANTITY_PRECISION)?;
            check_description(&line.note)?;
        }
        Ok(())
    }
}

#[derive(Insertable)]
#[table_name = "recipe"]
pub(crate) struct RecipeInsert<'a> {
    pub name: &'a str,
    pub slug: String,
    pub owner_id: Option<i32>,
    pub description: &'a str,
    pub introduction: &'a str,
    pub method: &'a str,
    pub notes: &'a str,
    pub serves: Option<Decimal>,
    pub flag_id: Option<i32>,
}

#[derive(Insertable)]
#[table_name = "component"]
pub(crate) struct ComponentInsert<'a> {
    pub in_recipe_id: i32,
    pub of_ingredient_id: Option<i32>,
    pub of_recipe_id: Option<i32>,
    pub quantity: Option<Decimal>,
    pub note: &'a str,
}

// Foods

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize, Deserialize)]
pub(crate) struct Tag {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// RGB hex code.
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, Queryable)]
pub(crate) struct FoodRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub owner_id: Option<i32>,
    pub introduction: String,
    pub notes: String,
    pub composition: String,
    pub parent_food_id: Option<i32>,
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable)]
pub(crate) struct BaseComponentRow {
    pub id: i32,
    pub recipe_id: i32,
    pub component_id: i32,
    pub amount: Option<Decimal>,
    pub note: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<BaseComponentRow> for BaseComponent {
    fn from(row: BaseComponentRow) -> Self {
        Self {
            component_id: row.component_id,
            amount: row.amount,
            note: row.note,
        }
    }
}

/// Something that can be eaten. Replaces the ingredient/recipe split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Food {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub owner_id: Option<i32>,
    pub introduction: String,
    pub notes: String,
    pub nutrients: NutrientRecord,
    pub composition: Composition,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl FoodRow {
    pub(crate) fn into_food(self, components: Vec<BaseComponent>) -> Result<Food, ServiceError> {
        let composition = match (self.composition.as_str(), self.parent_food_id) {
            ("simple", _) => Composition::Simple,
            ("combination", _) => Composition::Combination { components },
            ("extension", Some(parent_id)) => Composition::Extension {
                parent_id,
                overrides: components,
            },
            (kind, parent) => {
                return Err(ServiceError::Integrity(format!(
                    "food {} has unusable composition {kind:?} (parent {parent:?})",
                    self.id
                )))
            }
        };
        Ok(Food {
            id: self.id,
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            introduction: self.introduction,
            notes: self.notes,
            nutrients: NutrientRecord {
                energy: self.energy,
                protein: self.protein,
                fibre: self.fibre,
                carbohydrate: self.carbohydrate,
                fat: self.fat,
                sugar: self.sugar,
                saturated_fat: self.saturated_fat,
                sodium: self.sodium,
            },
            composition,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewFood {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nutrients: NutrientRecord,
    pub composition: Composition,
}

impl NewFood {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        check_name(&self.name)?;
        check_description(&self.description)?;
        check_nutrients(&self.nutrients, NUTRIENT_MAX_DIGITS)?;
        if let Some(bad) = self
            .tags
            .iter()
            .find(|tag| tag.trim().is_empty() || tag.len() > TAG_LENGTH)
        {
            return Err(ServiceError::Validation(format!("invalid tag {bad:?}")));
        }
        for component in self.composition.own_components() {
            check_not_negative("amount", component.amount)?;
            check_precision("amount", component.amount, AMOUNT_PRECISION)?;
            check_description(&component.note)?;
        }
        if self.composition == Composition::Simple && self.nutrients.is_empty() {
            log::warn!("simple food {:?} has no known nutrients", self.name);
        }
        Ok(())
    }
}

#[derive(Insertable)]
#[table_name = "food"]
pub(crate) struct FoodInsert<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub owner_id: Option<i32>,
    pub introduction: &'a str,
    pub notes: &'a str,
    pub composition: &'static str,
    pub parent_food_id: Option<i32>,
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
}

impl<'a> FoodInsert<'a> {
    pub(crate) fn new(new: &'a NewFood, owner_id: Option<i32>) -> Self {
        let n = &new.nutrients;
        let parent_food_id = match &new.composition {
            Composition::Extension { parent_id, .. } => Some(*parent_id),
            _ => None,
        };
        Self {
            name: &new.name,
            description: &new.description,
            owner_id,
            introduction: &new.introduction,
            notes: &new.notes,
            composition: new.composition.kind(),
            parent_food_id,
            energy: n.energy,
            protein: n.protein,
            fibre: n.fibre,
            carbohydrate: n.carbohydrate,
            fat: n.fat,
            sugar: n.sugar,
            saturated_fat: n.saturated_fat,
            sodium: n.sodium,
        }
    }
}

#[derive(Insertable)]
#[table_name = "base_component"]
pub(crate) struct BaseComponentInsert<'a> {
    pub recipe_id: i32,
    pub component_id: i32,
    pub amount: Option<Decimal>,
    pub note: &'a str,
}

// Targets

#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub(crate) struct TargetRow {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Queryable)]
pub(crate) struct TargetBoundRow {
    pub id: i32,
    pub of_target_id: i32,
    pub bound: String,
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
}

impl TargetBoundRow {
    pub(crate) fn nutrients(&self) -> NutrientRecord {
        NutrientRecord {
            energy: self.energy,
            protein: self.protein,
            fibre: self.fibre,
            carbohydrate: self.carbohydrate,
            fat: self.fat,
            sugar: self.sugar,
            saturated_fat: self.saturated_fat,
            sodium: self.sodium,
        }
    }
}

pub(crate) const BOUND_MINIMUM: &str = "minimum";
pub(crate) const BOUND_MAXIMUM: &str = "maximum";

/// Daily nutrition goals of one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Target {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub minimum: NutrientRecord,
    pub maximum: NutrientRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewTarget {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub minimum: NutrientRecord,
    #[serde(default)]
    pub maximum: NutrientRecord,
}

impl NewTarget {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        check_name(&self.name)?;
        check_description(&self.description)?;
        check_nutrients(&self.minimum, TARGET_MAX_DIGITS)?;
        check_nutrients(&self.maximum, TARGET_MAX_DIGITS)
    }
}

#[derive(Insertable)]
#[table_name = "target"]
pub(crate) struct TargetInsert<'a> {
    pub user_id: i32,
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Insertable)]
#[table_name = "target_bound"]
pub(crate) struct TargetBoundInsert {
    pub of_target_id: i32,
    pub bound: &'static str,
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
}

impl TargetBoundInsert {
    pub(crate) fn new(of_target_id: i32, bound: &'static str, n: &NutrientRecord) -> Self {
        Self {
            of_target_id,
            bound,
            energy: n.energy,
            protein: n.protein,
            fibre: n.fibre,
            carbohydrate: n.carbohydrate,
            fat: n.fat,
            sugar: n.sugar,
            saturated_fat: n.saturated_fat,
            sodium: n.sodium,
        }
    }
}
