//! Derived nutrition values.
//!
//! `add_nutrition_ratios` takes the known nutrient values of something, the
//! lowest cost of its reference mass and that reference mass, and produces the
//! `nutrition_data` mapping shown alongside ingredients and foods. It is a pure
//! function: the same input always yields the same output.
//!
//! Ratio names:
//! - `<nutrient>_per_d`: nutrient amount bought per unit of currency
//! - `<nutrient>_per_g`: nutrient amount per gram
//! - `<nutrient>_serve`: nutrient amount per serving
//! - `protein_per_j`, `fibre_per_j`: grams per kilojoule of energy
//! - `cost_per_g`, `cost_serve`: cost of one gram and of one serving
//!
//! An unknown input never becomes zero. A ratio whose inputs are missing, or
//! whose divisor is zero, is left out of the mapping.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::NutritionSettings;
use crate::nutrients::{NutrientKey, NutrientRecord};

/// Scales protein-per-kJ-per-dollar into a readable sort score.
const RANK_SCALE: i64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NutritionInput {
    /// Lowest cost of `grams` of the item.
    pub cost: Option<Decimal>,
    pub grams: Decimal,
    pub grams_serve: Option<Decimal>,
    pub nutrients: NutrientRecord,
}

impl NutritionInput {
    pub(crate) fn new(
        settings: &NutritionSettings,
        cost: Option<Decimal>,
        grams_serve: Option<Decimal>,
        nutrients: &NutrientRecord,
    ) -> Self {
        // only the configured keys take part
        let mut selected = NutrientRecord::default();
        for key in &settings.basic_keys {
            selected.set(*key, nutrients.get(*key));
        }
        Self {
            cost,
            grams: settings.reference_grams,
            grams_serve,
            nutrients: selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct NutritionData {
    pub cost: Option<Decimal>,
    pub grams: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grams_serve: Option<Decimal>,
    #[serde(flatten)]
    pub nutrients: NutrientRecord,
    #[serde(flatten)]
    pub ratios: BTreeMap<String, Decimal>,
    pub rank: Option<Decimal>,
}

impl NutritionData {
    #[cfg(test)]
    pub(crate) fn ratio(&self, name: &str) -> Option<Decimal> {
        self.ratios.get(name).copied()
    }

    /// The rank as a whole number, 0 when there is none. Used for ordering.
    pub(crate) fn sort_rank(&self) -> i64 {
        self.rank.and_then(|rank| rank.trunc().to_i64()).unwrap_or(0)
    }
}

pub(crate) fn add_nutrition_ratios(input: &NutritionInput) -> NutritionData {
    let mut ratios = BTreeMap::new();
    let mut put = |name: String, value: Option<Decimal>| {
        if let Some(value) = value {
            ratios.insert(name, value.normalize());
        }
    };

    put("cost_per_g".to_string(), per(input.cost, Some(input.grams)));
    put(
        "cost_serve".to_string(),
        scaled(input.cost, input.grams_serve, input.grams),
    );

    for key in NutrientKey::ALL {
        let value = input.nutrients.get(key);
        if value.is_none() {
            continue;
        }
        put(format!("{key}_per_d"), per(value, input.cost));
        put(format!("{key}_per_g"), per(value, Some(input.grams)));
        put(
            format!("{key}_serve"),
            scaled(value, input.grams_serve, input.grams),
        );
    }

    let energy = input.nutrients.energy;
    let protein_per_j = per(input.nutrients.protein, energy);
    put("protein_per_j".to_string(), protein_per_j);
    put("fibre_per_j".to_string(), per(input.nutrients.fibre, energy));

    let rank = protein_per_j
        .zip(per(input.nutrients.protein, input.cost))
        .and_then(|(per_j, per_d)| per_j.checked_mul(per_d))
        .and_then(|score| score.checked_mul(Decimal::from(RANK_SCALE)))
        .map(|score| score.round_dp(2).normalize());

    NutritionData {
        cost: input.cost,
        grams: input.grams,
        grams_serve: input.grams_serve,
        nutrients: input.nutrients.clone(),
        ratios,
        rank,
    }
}

fn per(value: Option<Decimal>, divisor: Option<Decimal>) -> Option<Decimal> {
    value?.checked_div(divisor?)
}

/// `value * part / whole`, e.g. the share of a per-kilogram value in one serving.
fn scaled(value: Option<Decimal>, part: Option<Decimal>, whole: Decimal) -> Option<Decimal> {
    value?.checked_mul(part?)?.checked_div(whole)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn oats() -> NutrientRecord {
        NutrientRecord {
            energy: Some(dec("15000")),
            protein: Some(dec("130")),
            fibre: Some(dec("100")),
            carbohydrate: Some(dec("600")),
            fat: Some(dec("70")),
            sugar: Some(dec("10")),
            saturated_fat: Some(dec("12")),
            sodium: Some(dec("20")),
        }
    }

    fn input(cost: Option<&str>, serve: Option<&str>, nutrients: NutrientRecord) -> NutritionInput {
        NutritionInput::new(
            &NutritionSettings::default(),
            cost.map(dec),
            serve.map(dec),
            &nutrients,
        )
    }

    #[test]
    fn empty_record_only_yields_cost_ratios() {
        let data = add_nutrition_ratios(&input(Some("4"), Some("50"), NutrientRecord::default()));

        let keys: Vec<&str> = data.ratios.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["cost_per_g", "cost_serve"]);
        assert_eq!(data.ratio("cost_per_g"), Some(dec("0.004")));
        assert_eq!(data.ratio("cost_serve"), Some(dec("0.2")));
        assert_eq!(data.rank, None);
        assert_eq!(data.sort_rank(), 0);
    }

    #[test]
    fn ratios_for_a_full_record() {
        let data = add_nutrition_ratios(&input(Some("4"), Some("40"), oats()));

        assert_eq!(data.ratio("protein_per_d"), Some(dec("32.5")));
        assert_eq!(data.ratio("protein_per_g"), Some(dec("0.13")));
        assert_eq!(data.ratio("protein_serve"), Some(dec("5.2")));
        assert_eq!(data.ratio("energy_serve"), Some(dec("600")));
        assert_eq!(data.ratio("fibre_per_j"), Some(dec("100") / dec("15000")));
        // 130 / 15000 * 32.5 * 1000
        assert_eq!(data.rank, Some(dec("281.67")));
        assert_eq!(data.sort_rank(), 281);
    }

    #[test]
    fn missing_nutrient_gives_missing_ratio_not_zero() {
        let nutrients = NutrientRecord {
            fibre: None,
            ..oats()
        };
        let data = add_nutrition_ratios(&input(Some("4"), None, nutrients));

        assert_eq!(data.nutrients.fibre, None);
        assert_eq!(data.ratio("fibre_per_d"), None);
        assert_eq!(data.ratio("fibre_per_j"), None);
        assert!(data.ratio("protein_per_d").is_some());
    }

    #[test]
    fn zero_cost_only_drops_per_cost_ratios() {
        let data = add_nutrition_ratios(&input(Some("0"), Some("40"), oats()));

        assert_eq!(data.ratio("protein_per_d"), None);
        assert_eq!(data.rank, None);
        assert_eq!(data.ratio("cost_per_g"), Some(Decimal::ZERO));
        assert_eq!(data.ratio("protein_per_g"), Some(dec("0.13")));
        assert_eq!(data.ratio("protein_serve"), Some(dec("5.2")));
    }

    #[test]
    fn zero_energy_only_drops_per_energy_ratios() {
        let nutrients = NutrientRecord {
            energy: Some(Decimal::ZERO),
            ..oats()
        };
        let data = add_nutrition_ratios(&input(Some("4"), None, nutrients));

        assert_eq!(data.ratio("protein_per_j"), None);
        assert_eq!(data.ratio("energy_per_d"), Some(Decimal::ZERO));
        assert_eq!(data.ratio("protein_per_d"), Some(dec("32.5")));
    }

    #[test]
    fn zero_reference_mass_only_drops_mass_ratios() {
        let mut data_input = input(Some("4"), Some("40"), oats());
        data_input.grams = Decimal::ZERO;
        let data = add_nutrition_ratios(&data_input);

        assert_eq!(data.ratio("protein_per_g"), None);
        assert_eq!(data.ratio("protein_serve"), None);
        assert_eq!(data.ratio("cost_per_g"), None);
        assert_eq!(data.ratio("protein_per_d"), Some(dec("32.5")));
    }

    #[test]
    fn no_cost_and_no_serving() {
        let data = add_nutrition_ratios(&input(None, None, oats()));

        assert!(data.ratios.keys().all(|k| !k.ends_with("_per_d")));
        assert!(data.ratios.keys().all(|k| !k.ends_with("_serve")));
        assert_eq!(data.ratio("cost_per_g"), None);
        assert_eq!(data.rank, None);
    }

    #[test]
    fn recomputing_is_identical() {
        let data_input = input(Some("3.37"), Some("45"), oats());
        let first = add_nutrition_ratios(&data_input);
        let second = add_nutrition_ratios(&data_input);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn serialized_mapping_is_flat() {
        let data = add_nutrition_ratios(&input(Some("4"), None, oats()));
        let json = serde_json::to_value(&data).unwrap();

        assert_eq!(json["protein"], serde_json::json!("130"));
        assert_eq!(json["protein_per_d"], serde_json::json!("32.5"));
        assert!(json.get("grams_serve").is_none());
    }

    #[test]
    fn unselected_keys_are_ignored() {
        let settings = NutritionSettings {
            basic_keys: vec![NutrientKey::Energy, NutrientKey::Protein],
            ..NutritionSettings::default()
        };
        let data_input = NutritionInput::new(&settings, Some(dec("4")), None, &oats());
        let data = add_nutrition_ratios(&data_input);

        assert_eq!(data.nutrients.fat, None);
        assert_eq!(data.ratio("fat_per_d"), None);
        assert!(data.ratio("protein_per_d").is_some());
    }
}
