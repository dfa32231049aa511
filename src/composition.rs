//! Foods built out of other foods.
//!
//! A food is either simple (its own nutrient values), a combination of
//! component foods, or an extension of another combination that swaps out some
//! of its components. Extensions replace a parent component when they name the
//! same component food, and append anything new; the parent's order is kept.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nutrients::{NutrientKey, NutrientRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompositionError {
    #[error("food {0} is part of its own composition")]
    Cycle(i32),

    #[error("food {0} does not exist or is not visible")]
    UnknownFood(i32),

    #[error("food {0} extends food {1}, which is not a combination")]
    NotCombination(i32, i32),
}

/// How much of one food goes into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BaseComponent {
    pub component_id: i32,
    /// Kilograms.
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Composition {
    Simple,
    Combination {
        components: Vec<BaseComponent>,
    },
    Extension {
        parent_id: i32,
        overrides: Vec<BaseComponent>,
    },
}

impl Composition {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Composition::Simple => "simple",
            Composition::Combination { .. } => "combination",
            Composition::Extension { .. } => "extension",
        }
    }

    pub(crate) fn own_components(&self) -> &[BaseComponent] {
        match self {
            Composition::Simple => &[],
            Composition::Combination { components } => components,
            Composition::Extension { overrides, .. } => overrides,
        }
    }
}

/// Replace-by-identity merge of an extension's components onto its parent's.
pub(crate) fn merge_components(
    parent: &[BaseComponent],
    overrides: &[BaseComponent],
) -> Vec<BaseComponent> {
    let mut merged = parent.to_vec();
    for entry in overrides {
        match merged
            .iter_mut()
            .find(|existing| existing.component_id == entry.component_id)
        {
            Some(existing) => *existing = entry.clone(),
            None => merged.push(entry.clone()),
        }
    }
    merged
}

/// The foods one viewer can see, keyed by id, with their compositions.
#[derive(Debug, Default)]
pub(crate) struct FoodCatalog {
    foods: HashMap<i32, (NutrientRecord, Composition)>,
}

impl FoodCatalog {
    pub(crate) fn new(foods: impl IntoIterator<Item = (i32, NutrientRecord, Composition)>) -> Self {
        Self {
            foods: foods
                .into_iter()
                .map(|(id, nutrients, composition)| (id, (nutrients, composition)))
                .collect(),
        }
    }

    pub(crate) fn contains(&self, id: i32) -> bool {
        self.foods.contains_key(&id)
    }

    pub(crate) fn effective_components(
        &self,
        id: i32,
    ) -> Result<Vec<BaseComponent>, CompositionError> {
        self.components_along(id, &mut Vec::new())
    }

    /// Nutrients per kilogram. Combinations are the amount-weighted average of
    /// their components; a key is unknown if any component lacks it.
    pub(crate) fn nutrients(&self, id: i32) -> Result<NutrientRecord, CompositionError> {
        self.nutrients_along(id, &mut Vec::new())
    }

    fn lookup(&self, id: i32) -> Result<&(NutrientRecord, Composition), CompositionError> {
        self.foods.get(&id).ok_or(CompositionError::UnknownFood(id))
    }

    fn components_along(
        &self,
        id: i32,
        path: &mut Vec<i32>,
    ) -> Result<Vec<BaseComponent>, CompositionError> {
        if path.contains(&id) {
            return Err(CompositionError::Cycle(id));
        }
        let (_, composition) = self.lookup(id)?;
        match composition {
            Composition::Simple => Ok(Vec::new()),
            Composition::Combination { components } => Ok(components.clone()),
            Composition::Extension { parent_id, overrides } => {
                let (_, parent) = self.lookup(*parent_id)?;
                if matches!(parent, Composition::Simple) {
                    return Err(CompositionError::NotCombination(id, *parent_id));
                }
                path.push(id);
                let inherited = self.components_along(*parent_id, path)?;
                path.pop();
                Ok(merge_components(&inherited, overrides))
            }
        }
    }

    fn nutrients_along(
        &self,
        id: i32,
        path: &mut Vec<i32>,
    ) -> Result<NutrientRecord, CompositionError> {
        if path.contains(&id) {
            return Err(CompositionError::Cycle(id));
        }
        let (own, composition) = self.lookup(id)?;
        if matches!(composition, Composition::Simple) {
            return Ok(own.clone());
        }

        let components = self.components_along(id, path)?;
        path.push(id);
        let mut parts = Vec::with_capacity(components.len());
        for component in &components {
            let nutrients = self.nutrients_along(component.component_id, path)?;
            parts.push((component.amount, nutrients));
        }
        path.pop();

        Ok(weighted_average(&parts))
    }
}

/// Amount-weighted average of the parts' nutrients. Everything is unknown when
/// an amount is missing or the amounts add up to zero.
pub(crate) fn weighted_average(parts: &[(Option<Decimal>, NutrientRecord)]) -> NutrientRecord {
    let mut result = NutrientRecord::default();
    let amounts: Option<Vec<Decimal>> = parts.iter().map(|(amount, _)| *amount).collect();
    let total = amounts
        .as_ref()
        .and_then(|amounts| amounts.iter().try_fold(Decimal::ZERO, |sum, a| sum.checked_add(*a)));
    let (Some(amounts), Some(total)) = (amounts, total) else {
        return result;
    };
    if parts.is_empty() || total.is_zero() {
        return result;
    }

    for key in NutrientKey::ALL {
        let weighted = parts
            .iter()
            .zip(&amounts)
            .try_fold(Decimal::ZERO, |sum, ((_, nutrients), amount)| {
                sum.checked_add(nutrients.get(key)?.checked_mul(*amount)?)
            });
        result.set(
            key,
            weighted.and_then(|w| w.checked_div(total)).map(|v| v.normalize()),
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn part(component_id: i32, amount: &str) -> BaseComponent {
        BaseComponent {
            component_id,
            amount: Some(dec(amount)),
            note: String::new(),
        }
    }

    fn simple(protein: &str, fat: Option<&str>) -> NutrientRecord {
        NutrientRecord {
            protein: Some(dec(protein)),
            fat: fat.map(dec),
            ..Default::default()
        }
    }

    fn catalog() -> FoodCatalog {
        FoodCatalog::new(vec![
            (1, simple("100", Some("10")), Composition::Simple),
            (2, simple("300", Some("30")), Composition::Simple),
            (3, simple("50", None), Composition::Simple),
            (
                10,
                NutrientRecord::default(),
                Composition::Combination {
                    components: vec![part(1, "0.75"), part(2, "0.25")],
                },
            ),
            (
                11,
                NutrientRecord::default(),
                Composition::Extension {
                    parent_id: 10,
                    overrides: vec![part(2, "0.75"), part(3, "0.5")],
                },
            ),
            (
                12,
                NutrientRecord::default(),
                Composition::Extension {
                    parent_id: 11,
                    overrides: vec![part(1, "0.25")],
                },
            ),
        ])
    }

    #[test]
    fn merge_replaces_by_identity_and_appends() {
        let merged = merge_components(
            &[part(1, "1"), part(2, "2")],
            &[part(2, "5"), part(3, "1")],
        );
        assert_eq!(merged, vec![part(1, "1"), part(2, "5"), part(3, "1")]);
    }

    #[test]
    fn simple_food_has_no_components() {
        assert_eq!(catalog().effective_components(1).unwrap(), Vec::new());
    }

    #[test]
    fn extension_components() {
        let catalog = catalog();
        assert_eq!(
            catalog.effective_components(11).unwrap(),
            vec![part(1, "0.75"), part(2, "0.75"), part(3, "0.5")]
        );
        assert_eq!(
            catalog.effective_components(12).unwrap(),
            vec![part(1, "0.25"), part(2, "0.75"), part(3, "0.5")]
        );
    }

    #[test]
    fn combination_nutrients_are_weighted() {
        let nutrients = catalog().nutrients(10).unwrap();
        // (100 * 0.75 + 300 * 0.25) / 1.0
        assert_eq!(nutrients.protein, Some(dec("150")));
        assert_eq!(nutrients.fat, Some(dec("15")));
        assert_eq!(nutrients.energy, None);
    }

    #[test]
    fn one_unknown_component_value_makes_the_key_unknown() {
        let nutrients = catalog().nutrients(11).unwrap();
        // (100 * 0.75 + 300 * 0.75 + 50 * 0.5) / 2.0
        assert_eq!(nutrients.protein, Some(dec("162.5")));
        assert_eq!(nutrients.fat, None);
    }

    #[test]
    fn missing_amount_leaves_everything_unknown() {
        let catalog = FoodCatalog::new(vec![
            (1, simple("100", Some("10")), Composition::Simple),
            (
                2,
                NutrientRecord::default(),
                Composition::Combination {
                    components: vec![BaseComponent {
                        component_id: 1,
                        amount: None,
                        note: "to taste".to_string(),
                    }],
                },
            ),
            (
                3,
                NutrientRecord::default(),
                Composition::Combination { components: vec![] },
            ),
        ]);
        assert!(catalog.nutrients(2).unwrap().is_empty());
        assert!(catalog.nutrients(3).unwrap().is_empty());
    }

    #[test]
    fn nested_combinations() {
        let catalog = FoodCatalog::new(vec![
            (1, simple("100", None), Composition::Simple),
            (2, simple("200", None), Composition::Simple),
            (
                3,
                NutrientRecord::default(),
                Composition::Combination {
                    components: vec![part(1, "1"), part(2, "1")],
                },
            ),
            (
                4,
                NutrientRecord::default(),
                Composition::Combination {
                    components: vec![part(3, "1"), part(2, "1")],
                },
            ),
        ]);
        assert_eq!(catalog.nutrients(4).unwrap().protein, Some(dec("175")));
    }

    #[test]
    fn cycles_are_errors() {
        let catalog = FoodCatalog::new(vec![
            (
                1,
                NutrientRecord::default(),
                Composition::Combination {
                    components: vec![part(2, "1")],
                },
            ),
            (
                2,
                NutrientRecord::default(),
                Composition::Combination {
                    components: vec![part(1, "1")],
                },
            ),
            (
                3,
                NutrientRecord::default(),
                Composition::Extension {
                    parent_id: 4,
                    overrides: vec![],
                },
            ),
            (
                4,
                NutrientRecord::default(),
                Composition::Extension {
                    parent_id: 3,
                    overrides: vec![],
                },
            ),
        ]);
        assert_eq!(catalog.nutrients(1), Err(CompositionError::Cycle(1)));
        assert_eq!(catalog.effective_components(3), Err(CompositionError::Cycle(3)));
    }

    #[test]
    fn unknown_and_simple_parents() {
        let catalog = FoodCatalog::new(vec![
            (1, simple("100", None), Composition::Simple),
            (
                2,
                NutrientRecord::default(),
                Composition::Extension {
                    parent_id: 1,
                    overrides: vec![],
                },
            ),
            (
                3,
                NutrientRecord::default(),
                Composition::Combination {
                    components: vec![part(99, "1")],
                },
            ),
        ]);
        assert_eq!(
            catalog.effective_components(2),
            Err(CompositionError::NotCombination(2, 1))
        );
        assert_eq!(catalog.nutrients(3), Err(CompositionError::UnknownFood(99)));
        assert_eq!(catalog.nutrients(42), Err(CompositionError::UnknownFood(42)));
    }
}
