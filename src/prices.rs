use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Price;

const CENTS: i64 = 100;

impl Price {
    /// Cost of one kilogram in cents.
    ///
    /// The amount is scaled to cents before dividing so a backend doing
    /// whole-number division cannot drop the fractional cents.
    pub(crate) fn cents_per_mass(&self) -> Option<Decimal> {
        self.amount
            .checked_mul(Decimal::from(CENTS))?
            .checked_div(self.weight)
    }

    /// Cost of one kilogram. `None` when the weight is zero.
    pub(crate) fn per_mass(&self) -> Option<Decimal> {
        self.cents_per_mass()?.checked_div(Decimal::from(CENTS))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PricedOffer {
    #[serde(flatten)]
    pub price: Price,
    pub cents_per_kg: Option<Decimal>,
    pub per_kg: Option<Decimal>,
}

/// The offers of one ingredient ordered from cheapest to dearest per kilogram.
/// Offers whose cost cannot be computed sort last and never count as lowest.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PriceIndex {
    offers: Vec<PricedOffer>,
}

impl PriceIndex {
    pub(crate) fn new(prices: impl IntoIterator<Item = Price>) -> Self {
        let mut offers: Vec<PricedOffer> = prices
            .into_iter()
            .map(|price| PricedOffer {
                cents_per_kg: price.cents_per_mass(),
                per_kg: price.per_mass(),
                price,
            })
            .collect();
        offers.sort_by(|a, b| by_cost(a.cents_per_kg, b.cents_per_kg));
        Self { offers }
    }

    pub(crate) fn sorted_prices(&self) -> &[PricedOffer] {
        &self.offers
    }

    pub(crate) fn lowest_price(&self) -> Option<&PricedOffer> {
        self.offers.first().filter(|offer| offer.per_kg.is_some())
    }

    /// Lowest cost per kilogram rounded for display.
    pub(crate) fn best_price(&self, decimal_places: u32) -> Option<Decimal> {
        self.lowest_price()?
            .per_kg
            .map(|per_kg| per_kg.round_dp(decimal_places))
    }

    pub(crate) fn price_count(&self) -> usize {
        self.offers.len()
    }
}

fn by_cost(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn price(id: i32, amount: &str, weight: &str) -> Price {
        Price {
            id,
            ingredient_id: 1,
            amount: dec(amount),
            weight: dec(weight),
            notes: String::new(),
            created_at: chrono::NaiveDate::from_ymd_opt(2020, 3, 10)
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .unwrap(),
        }
    }

    #[test]
    fn no_prices_means_no_lowest_or_best() {
        let index = PriceIndex::new(Vec::new());
        assert!(index.lowest_price().is_none());
        assert_eq!(index.best_price(2), None);
        assert_eq!(index.price_count(), 0);
    }

    #[test]
    fn sorted_by_cost_per_mass() {
        let per_kg: Vec<Option<Decimal>> = [price(1, "250", "2"), price(2, "100", "1")]
            .iter()
            .map(Price::per_mass)
            .collect();
        assert_eq!(per_kg, vec![Some(dec("125")), Some(dec("100"))]);

        let index = PriceIndex::new(vec![price(1, "250", "2"), price(2, "100", "1")]);

        let per_kg: Vec<Option<Decimal>> =
            index.sorted_prices().iter().map(|offer| offer.per_kg).collect();
        assert_eq!(per_kg, vec![Some(dec("100")), Some(dec("125"))]);
        assert_eq!(index.lowest_price().map(|offer| offer.price.id), Some(2));
        assert_eq!(index.best_price(2), Some(dec("100.00")));
        assert_eq!(index.price_count(), 2);
    }

    #[test]
    fn cost_per_mass_keeps_fractional_cents() {
        let third = price(1, "1", "3");
        assert_eq!(third.cents_per_mass().map(|c| c.round_dp(4)), Some(dec("33.3333")));

        let index = PriceIndex::new(vec![third]);
        assert_eq!(index.best_price(2), Some(dec("0.33")));
    }

    #[test]
    fn whole_numbers_do_not_truncate() {
        let offer = price(1, "7", "2");
        assert_eq!(offer.cents_per_mass(), Some(dec("350")));
        assert_eq!(offer.per_mass(), Some(dec("3.5")));
    }

    #[test]
    fn best_price_is_rounded_for_display() {
        let index = PriceIndex::new(vec![price(1, "4.99", "0.75")]);
        assert_eq!(index.best_price(2), Some(dec("6.65")));
    }

    #[test]
    fn zero_weight_sorts_last_and_is_never_lowest() {
        let index = PriceIndex::new(vec![price(1, "5", "0"), price(2, "9", "1")]);
        assert_eq!(index.sorted_prices()[1].price.id, 1);
        assert_eq!(index.sorted_prices()[1].per_kg, None);
        assert_eq!(index.lowest_price().map(|offer| offer.price.id), Some(2));

        let only_broken = PriceIndex::new(vec![price(1, "5", "0")]);
        assert!(only_broken.lowest_price().is_none());
        assert_eq!(only_broken.best_price(2), None);
    }
}
