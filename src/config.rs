use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};
use rust_decimal::Decimal;

use crate::error::ServiceError;
use crate::nutrients::NutrientKey;

/// Grams of the reference mass every nutrient value is normalised to.
pub(crate) const STANDARD_WEIGHT: i64 = 1000;

/// Nutrients copied into `nutrition_data` and used for the derived ratios.
pub(crate) const NUTRITION_DATA_ITEMS_BASIC: [NutrientKey; 8] = NutrientKey::ALL;

/// Decimal places of a displayed price per kilogram (cents).
pub(crate) const DECIMAL_CENTS: u32 = 2;

pub(crate) const CACHE_POOL_MAX_OPEN: u32 = 16;
pub(crate) const CACHE_POOL_MIN_IDLE: u32 = 8;
pub(crate) const CACHE_POOL_EXPIRE_SECONDS: u64 = 60;

/// Column precision as `(max digits, decimal places)`, matching the
/// `DECIMAL(M, D)` definitions in the migrations.
pub(crate) type Precision = (u32, u32);

pub(crate) const SERVING_PRECISION: Precision = (4, 1);
pub(crate) const SERVES_PRECISION: Precision = (4, 1);
pub(crate) const PRICE_AMOUNT_PRECISION: Precision = (8, 2);
pub(crate) const PRICE_WEIGHT_PRECISION: Precision = (8, 3);
pub(crate) const QUANTITY_PRECISION: Precision = (8, 3);
pub(crate) const AMOUNT_PRECISION: Precision = (9, 5);

/// Max digits of an ingredient or food nutrient column. The places vary per
/// nutrient, see `NutrientKey::decimal_places`.
pub(crate) const NUTRIENT_MAX_DIGITS: u32 = 6;
/// Max digits of a target bound column.
pub(crate) const TARGET_MAX_DIGITS: u32 = 8;

pub(crate) const NAME_LENGTH: usize = 255;
pub(crate) const TAG_LENGTH: usize = 64;
pub(crate) const DESCR_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NutritionSettings {
    pub reference_grams: Decimal,
    pub basic_keys: Vec<NutrientKey>,
    pub cost_decimal_places: u32,
}

impl Default for NutritionSettings {
    fn default() -> Self {
        Self {
            reference_grams: Decimal::from(STANDARD_WEIGHT),
            basic_keys: NUTRITION_DATA_ITEMS_BASIC.to_vec(),
            cost_decimal_places: DECIMAL_CENTS,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub bind_host: String,
    pub bind_port: u16,
    pub cache_ttl_seconds: u64,
    pub nutrition: NutritionSettings,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self, ServiceError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ServiceError::Config("DATABASE_URL must be set".to_string()))?;
        let redis_url = lookup("REDIS_URL").filter(|url| !url.is_empty());
        if redis_url.is_none() {
            warn!("REDIS_URL not set, listing cache disabled");
        }

        let reference_grams: i64 = try_load(&lookup, "STANDARD_WEIGHT", STANDARD_WEIGHT)?;
        if reference_grams <= 0 {
            return Err(ServiceError::Config(
                "STANDARD_WEIGHT must be a positive number of grams".to_string(),
            ));
        }

        let cache_ttl_seconds: u64 = try_load(&lookup, "CACHE_TTL_SECONDS", 60)?;
        if cache_ttl_seconds == 0 {
            return Err(ServiceError::Config(
                "CACHE_TTL_SECONDS must be at least one second, unset REDIS_URL to disable the cache"
                    .to_string(),
            ));
        }

        Ok(Self {
            database_url,
            redis_url,
            bind_host: try_load(&lookup, "BIND_HOST", "127.0.0.1".to_string())?,
            bind_port: try_load(&lookup, "BIND_PORT", 8080)?,
            cache_ttl_seconds,
            nutrition: NutritionSettings {
                reference_grams: Decimal::from(reference_grams),
                basic_keys: NUTRITION_DATA_ITEMS_BASIC.to_vec(),
                cost_decimal_places: try_load(&lookup, "COST_DECIMAL_PLACES", DECIMAL_CENTS)?,
            },
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ServiceError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ServiceError::Config(format!("invalid {key} value {raw:?}: {e}"))),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
