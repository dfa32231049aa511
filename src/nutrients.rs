use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Macro nutrients tracked for every ingredient, food and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum NutrientKey {
    Energy,
    Protein,
    Fibre,
    Carbohydrate,
    Fat,
    Sugar,
    SaturatedFat,
    Sodium,
}

impl NutrientKey {
    pub(crate) const ALL: [NutrientKey; 8] = [
        NutrientKey::Energy,
        NutrientKey::Protein,
        NutrientKey::Fibre,
        NutrientKey::Carbohydrate,
        NutrientKey::Fat,
        NutrientKey::Sugar,
        NutrientKey::SaturatedFat,
        NutrientKey::Sodium,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            NutrientKey::Energy => "energy",
            NutrientKey::Protein => "protein",
            NutrientKey::Fibre => "fibre",
            NutrientKey::Carbohydrate => "carbohydrate",
            NutrientKey::Fat => "fat",
            NutrientKey::Sugar => "sugar",
            NutrientKey::SaturatedFat => "saturated_fat",
            NutrientKey::Sodium => "sodium",
        }
    }

    /// Decimal places the columns keep for this nutrient.
    pub(crate) fn decimal_places(self) -> u32 {
        match self {
            NutrientKey::Energy => 1,
            NutrientKey::Sodium => 0,
            _ => 3,
        }
    }
}

impl fmt::Display for NutrientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nutrient values of one entity, always stored per kilogram.
///
/// Energy is in kilojoules and sodium in milligrams; the rest are grams.
/// A `None` means the value is unknown, which is not the same as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NutrientRecord {
    pub energy: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fibre: Option<Decimal>,
    pub carbohydrate: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub sugar: Option<Decimal>,
    pub saturated_fat: Option<Decimal>,
    pub sodium: Option<Decimal>,
}

impl NutrientRecord {
    pub(crate) fn get(&self, key: NutrientKey) -> Option<Decimal> {
        match key {
            NutrientKey::Energy => self.energy,
            NutrientKey::Protein => self.protein,
            NutrientKey::Fibre => self.fibre,
            NutrientKey::Carbohydrate => self.carbohydrate,
            NutrientKey::Fat => self.fat,
            NutrientKey::Sugar => self.sugar,
            NutrientKey::SaturatedFat => self.saturated_fat,
            NutrientKey::Sodium => self.sodium,
        }
    }

    pub(crate) fn set(&mut self, key: NutrientKey, value: Option<Decimal>) {
        let slot = match key {
            NutrientKey::Energy => &mut self.energy,
            NutrientKey::Protein => &mut self.protein,
            NutrientKey::Fibre => &mut self.fibre,
            NutrientKey::Carbohydrate => &mut self.carbohydrate,
            NutrientKey::Fat => &mut self.fat,
            NutrientKey::Sugar => &mut self.sugar,
            NutrientKey::SaturatedFat => &mut self.saturated_fat,
            NutrientKey::Sodium => &mut self.sodium,
        };
        *slot = value;
    }

    pub(crate) fn is_empty(&self) -> bool {
        NutrientKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    /// Keys whose value is negative. Nutrient quantities cannot be below zero.
    pub(crate) fn negative_keys(&self) -> Vec<NutrientKey> {
        NutrientKey::ALL
            .iter()
            .copied()
            .filter(|key| matches!(self.get(*key), Some(v) if v < Decimal::ZERO))
            .collect()
    }

    /// Soft consistency problems that are reported but never rejected.
    pub(crate) fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let (Some(saturated), Some(fat)) = (self.saturated_fat, self.fat) {
            if saturated > fat {
                warnings.push(format!(
                    "saturated_fat ({saturated}) is greater than fat ({fat})"
                ));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_cover_every_key() {
        let mut record = NutrientRecord::default();
        assert!(record.is_empty());

        for (i, key) in NutrientKey::ALL.iter().enumerate() {
            record.set(*key, Some(Decimal::from(i as i64 + 1)));
        }
        for (i, key) in NutrientKey::ALL.iter().enumerate() {
            assert_eq!(record.get(*key), Some(Decimal::from(i as i64 + 1)));
        }
        assert!(!record.is_empty());
    }

    #[test]
    fn negative_values_are_reported() {
        let record = NutrientRecord {
            protein: Some(Decimal::from(-1)),
            fat: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert_eq!(record.negative_keys(), vec![NutrientKey::Protein]);
    }

    #[test]
    fn saturated_fat_above_fat_is_a_warning() {
        let record = NutrientRecord {
            fat: Some(Decimal::from(10)),
            saturated_fat: Some(Decimal::from(12)),
            ..Default::default()
        };
        assert_eq!(record.warnings().len(), 1);

        let fine = NutrientRecord {
            fat: Some(Decimal::from(10)),
            saturated_fat: Some(Decimal::from(4)),
            ..Default::default()
        };
        assert!(fine.warnings().is_empty());

        let unknown_fat = NutrientRecord {
            saturated_fat: Some(Decimal::from(4)),
            ..Default::default()
        };
        assert!(unknown_fat.warnings().is_empty());
    }

    #[test]
    fn keys_serialize_as_snake_case() {
        assert_eq!(NutrientKey::SaturatedFat.to_string(), "saturated_fat");
        assert_eq!(
            serde_json::to_string(&NutrientKey::SaturatedFat).unwrap(),
            "\"saturated_fat\""
        );
    }
}
