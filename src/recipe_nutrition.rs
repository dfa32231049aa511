//! Nutrition of recipes, built up from the ingredients and sub-recipes they
//! use. Component quantities are kilograms, so a recipe is treated like a
//! combination food whose parts are weighed out.

use std::collections::HashMap;

use log::warn;
use rust_decimal::Decimal;

use crate::composition::weighted_average;
use crate::config::NutritionSettings;
use crate::models::Component;
use crate::nutrients::NutrientRecord;
use crate::ratios::{add_nutrition_ratios, NutritionData, NutritionInput};

const GRAMS_PER_KG: i64 = 1000;

/// What a kilogram of a recipe holds and costs, and how much the recipe makes.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RecipeMix {
    /// Per kilogram.
    pub nutrients: NutrientRecord,
    /// Per kilogram. Unknown unless every line has a quantity and a price.
    pub cost: Option<Decimal>,
    /// Kilograms made by the whole recipe.
    pub mass: Option<Decimal>,
}

impl RecipeMix {
    pub(crate) fn grams_serve(&self, serves: Option<Decimal>) -> Option<Decimal> {
        self.mass?
            .checked_mul(Decimal::from(GRAMS_PER_KG))?
            .checked_div(serves?)
            .map(|grams| grams.normalize())
    }

    pub(crate) fn nutrition_data(
        &self,
        serves: Option<Decimal>,
        settings: &NutritionSettings,
    ) -> NutritionData {
        add_nutrition_ratios(&NutritionInput::new(
            settings,
            self.cost
                .map(|cost| cost.round_dp(settings.cost_decimal_places)),
            self.grams_serve(serves),
            &self.nutrients,
        ))
    }
}

/// The recipes one viewer can see, their lines, and the nutrients and best
/// price per kilogram of every ingredient they can see.
#[derive(Debug, Default)]
pub(crate) struct RecipeBook {
    ingredients: HashMap<i32, (NutrientRecord, Option<Decimal>)>,
    lines: HashMap<i32, Vec<Component>>,
}

impl RecipeBook {
    pub(crate) fn new(
        ingredients: impl IntoIterator<Item = (i32, NutrientRecord, Option<Decimal>)>,
        components: &[Component],
    ) -> Self {
        let mut lines: HashMap<i32, Vec<Component>> = HashMap::new();
        for component in components {
            lines
                .entry(component.in_recipe_id)
                .or_default()
                .push(component.clone());
        }
        Self {
            ingredients: ingredients
                .into_iter()
                .map(|(id, nutrients, best_price)| (id, (nutrients, best_price)))
                .collect(),
            lines,
        }
    }

    /// Quantity-weighted mix of the recipe's lines. A line with an unknown
    /// quantity makes the whole mix unknown, and a recipe that contains
    /// itself has unknown nutrition rather than an endless one.
    pub(crate) fn mix(&self, recipe_id: i32) -> RecipeMix {
        self.mix_along(recipe_id, &mut Vec::new())
    }

    fn mix_along(&self, recipe_id: i32, path: &mut Vec<i32>) -> RecipeMix {
        if path.contains(&recipe_id) {
            warn!("recipe {recipe_id} is one of its own components, nutrition unknown");
            return RecipeMix::default();
        }
        let lines = match self.lines.get(&recipe_id) {
            Some(lines) if !lines.is_empty() => lines,
            _ => return RecipeMix::default(),
        };

        path.push(recipe_id);
        let mut parts = Vec::with_capacity(lines.len());
        let mut costs = Vec::with_capacity(lines.len());
        for line in lines {
            let (nutrients, cost) = match (line.of_ingredient_id, line.of_recipe_id) {
                (Some(ingredient_id), _) => match self.ingredients.get(&ingredient_id) {
                    Some((nutrients, best_price)) => (nutrients.clone(), *best_price),
                    None => {
                        warn!("recipe {recipe_id} uses hidden ingredient {ingredient_id}");
                        (NutrientRecord::default(), None)
                    }
                },
                (None, Some(sub_id)) => {
                    let sub = self.mix_along(sub_id, path);
                    (sub.nutrients, sub.cost)
                }
                (None, None) => (NutrientRecord::default(), None),
            };
            costs.push(line.quantity.zip(cost));
            parts.push((line.quantity, nutrients));
        }
        path.pop();

        let mass = parts
            .iter()
            .try_fold(Decimal::ZERO, |sum, (quantity, _)| sum.checked_add((*quantity)?));
        let cost = costs
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| {
                let (quantity, cost) = (*line)?;
                sum.checked_add(quantity.checked_mul(cost)?)
            })
            .zip(mass)
            .and_then(|(total, mass)| total.checked_div(mass))
            .map(|cost| cost.normalize());

        RecipeMix {
            nutrients: weighted_average(&parts),
            cost,
            mass,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn nutrients(energy: &str, protein: &str) -> NutrientRecord {
        NutrientRecord {
            energy: Some(dec(energy)),
            protein: Some(dec(protein)),
            ..Default::default()
        }
    }

    fn line(
        id: i32,
        in_recipe_id: i32,
        of: (Option<i32>, Option<i32>),
        kg: Option<&str>,
    ) -> Component {
        Component {
            id,
            in_recipe_id,
            of_ingredient_id: of.0,
            of_recipe_id: of.1,
            quantity: kg.map(dec),
            note: String::new(),
        }
    }

    fn ingredients() -> Vec<(i32, NutrientRecord, Option<Decimal>)> {
        vec![
            (1, nutrients("1600", "130"), Some(dec("4"))),
            (2, nutrients("280", "30"), Some(dec("1.2"))),
            (3, nutrients("400", "10"), Some(dec("3"))),
            (4, nutrients("3700", "0"), None),
        ]
    }

    fn book(components: &[Component]) -> RecipeBook {
        RecipeBook::new(ingredients(), components)
    }

    #[test]
    fn lines_are_weighed_by_quantity() {
        let porridge = book(&[
            line(1, 10, (Some(1), None), Some("0.1")),
            line(2, 10, (Some(2), None), Some("0.3")),
        ]);
        let mix = porridge.mix(10);
        assert_eq!(mix.nutrients.protein, Some(dec("55")));
        assert_eq!(mix.nutrients.energy, Some(dec("610")));
        assert_eq!(mix.nutrients.fat, None);
        assert_eq!(mix.cost, Some(dec("1.9")));
        assert_eq!(mix.mass, Some(dec("0.4")));
        assert_eq!(mix.grams_serve(Some(dec("2"))), Some(dec("200")));
        assert_eq!(mix.grams_serve(None), None);
        assert_eq!(mix.grams_serve(Some(Decimal::ZERO)), None);
    }

    #[test]
    fn sub_recipes_count_as_one_part() {
        let breakfast = book(&[
            line(1, 10, (Some(1), None), Some("0.1")),
            line(2, 10, (Some(2), None), Some("0.3")),
            line(3, 11, (None, Some(10)), Some("0.4")),
            line(4, 11, (Some(3), None), Some("0.1")),
        ]);
        let mix = breakfast.mix(11);
        assert_eq!(mix.nutrients.protein, Some(dec("46")));
        assert_eq!(mix.cost, Some(dec("2.12")));
        assert_eq!(mix.mass, Some(dec("0.5")));
    }

    #[test]
    fn unknown_quantities_and_prices_stay_unknown() {
        let unweighed = book(&[
            line(1, 10, (Some(1), None), Some("0.1")),
            line(2, 10, (Some(2), None), None),
        ]);
        assert_eq!(unweighed.mix(10), RecipeMix::default());

        let unpriced = book(&[
            line(1, 10, (Some(1), None), Some("0.1")),
            line(2, 10, (Some(4), None), Some("0.1")),
        ]);
        let mix = unpriced.mix(10);
        assert_eq!(mix.cost, None);
        assert_eq!(mix.nutrients.protein, Some(dec("65")));

        let hidden = book(&[line(1, 10, (Some(99), None), Some("0.1"))]);
        assert_eq!(hidden.mix(10).nutrients, NutrientRecord::default());
        assert_eq!(book(&[]).mix(10), RecipeMix::default());
    }

    #[test]
    fn recipes_containing_each_other_have_unknown_nutrition() {
        let looped = book(&[
            line(1, 20, (None, Some(21)), Some("0.1")),
            line(2, 21, (None, Some(20)), Some("0.1")),
            line(3, 21, (Some(1), None), Some("0.1")),
        ]);
        let mix = looped.mix(20);
        assert_eq!(mix.nutrients, NutrientRecord::default());
        assert_eq!(mix.cost, None);
        assert_eq!(mix.mass, Some(dec("0.1")));
    }

    #[test]
    fn nutrition_data_uses_the_serving_and_rounded_cost() {
        let porridge = book(&[
            line(1, 10, (Some(1), None), Some("0.1")),
            line(2, 10, (Some(2), None), Some("0.2")),
        ]);
        let mix = porridge.mix(10);
        // (0.4 + 0.24) / 0.3 = 2.1333...
        let data = mix.nutrition_data(Some(dec("3")), &NutritionSettings::default());
        assert_eq!(data.cost, Some(dec("2.13")));
        assert_eq!(data.grams_serve, Some(dec("100")));
        assert_eq!(data.nutrients.protein, mix.nutrients.protein);
        assert!(data.ratio("protein_serve").is_some());
    }
}
