//! Offline rate table used when the live carrier is missing or unreachable.

use super::entities::{PostalCode, QuoteSource, ServiceLevel, ShippingOption};

/// Carrier name shown on estimated options.
pub const SIMULATED_CARRIER: &str = "Frete Estimado";

/// Insurance share of the declared value added to every tier.
const AD_VALOREM_RATE: f64 = 0.005;

/// Destination region inferred from the CEP prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    SaoPaulo,
    Southeast,
    South,
    Midwest,
    Northeast,
    North,
}

impl Region {
    pub fn from_postal_code(postal_code: &PostalCode) -> Self {
        match postal_code.prefix() {
            0..=19 => Self::SaoPaulo,
            20..=39 => Self::Southeast,
            40..=65 => Self::Northeast,
            66..=69 | 77 => Self::North,
            70..=79 => Self::Midwest,
            _ => Self::South,
        }
    }

    fn price_multiplier(&self) -> f64 {
        match self {
            Self::SaoPaulo => 1.0,
            Self::Southeast => 1.15,
            Self::South => 1.25,
            Self::Midwest => 1.40,
            Self::Northeast => 1.55,
            Self::North => 1.80,
        }
    }

    fn extra_days(&self) -> u32 {
        match self {
            Self::SaoPaulo => 0,
            Self::Southeast => 1,
            Self::South => 2,
            Self::Midwest => 3,
            Self::Northeast => 4,
            Self::North => 6,
        }
    }
}

struct Tier {
    level: ServiceLevel,
    base_fee: f64,
    per_kg: f64,
    min_days: u32,
    max_days: u32,
}

const TIERS: [Tier; 3] = [
    Tier {
        level: ServiceLevel::Economy,
        base_fee: 14.90,
        per_kg: 2.10,
        min_days: 5,
        max_days: 9,
    },
    Tier {
        level: ServiceLevel::Standard,
        base_fee: 19.90,
        per_kg: 3.20,
        min_days: 3,
        max_days: 6,
    },
    Tier {
        level: ServiceLevel::Express,
        base_fee: 29.90,
        per_kg: 4.90,
        min_days: 1,
        max_days: 3,
    },
];

/// Deterministic economy/standard/express estimates for a destination.
///
/// Never fails; every option is flagged [`QuoteSource::Simulated`].
pub fn compute_simulated_options(
    destination: &PostalCode,
    billable_weight_kg: f64,
    declared_value: f64,
) -> Vec<ShippingOption> {
    let region = Region::from_postal_code(destination);
    let weight = billable_weight_kg.max(0.0);
    let insurance = declared_value.max(0.0) * AD_VALOREM_RATE;

    TIERS
        .iter()
        .map(|tier| {
            let freight = (tier.base_fee + tier.per_kg * weight) * region.price_multiplier();
            let min_days = tier.min_days + region.extra_days();
            let max_days = tier.max_days + region.extra_days();
            ShippingOption::new(
                SIMULATED_CARRIER,
                tier.level,
                tier.level.label(),
                freight + insurance,
                format!("{min_days} a {max_days} dias úteis"),
                QuoteSource::Simulated,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cep(raw: &str) -> PostalCode {
        PostalCode::parse(raw).unwrap()
    }

    #[test]
    fn regions_follow_cep_ranges() {
        assert_eq!(Region::from_postal_code(&cep("01310-100")), Region::SaoPaulo);
        assert_eq!(Region::from_postal_code(&cep("20040-002")), Region::Southeast);
        assert_eq!(Region::from_postal_code(&cep("30130-010")), Region::Southeast);
        assert_eq!(Region::from_postal_code(&cep("40020-000")), Region::Northeast);
        assert_eq!(Region::from_postal_code(&cep("69005-070")), Region::North);
        assert_eq!(Region::from_postal_code(&cep("77001-002")), Region::North);
        assert_eq!(Region::from_postal_code(&cep("70040-010")), Region::Midwest);
        assert_eq!(Region::from_postal_code(&cep("90010-000")), Region::South);
    }

    #[test]
    fn sao_paulo_three_kilos() {
        let options = compute_simulated_options(&cep("01310-100"), 3.0, 250.0);
        assert_eq!(options.len(), 3);
        // 14.90 + 2.10 * 3 + 250 * 0.005
        assert_eq!(options[0].price, 22.45);
        assert_eq!(options[0].id, "frete-estimado-economy");
        assert_eq!(options[0].delivery_estimate, "5 a 9 dias úteis");
        assert!(options.iter().all(ShippingOption::is_simulated));
        assert!(options.iter().all(|option| option.price > 0.0));
    }

    #[test]
    fn farther_regions_cost_more_and_take_longer() {
        let near = compute_simulated_options(&cep("01310-100"), 2.0, 100.0);
        let far = compute_simulated_options(&cep("69005-070"), 2.0, 100.0);
        for (n, f) in near.iter().zip(&far) {
            assert!(f.price > n.price);
            assert_ne!(f.delivery_estimate, n.delivery_estimate);
        }
    }

    #[test]
    fn price_grows_with_weight() {
        let light = compute_simulated_options(&cep("80010-000"), 1.0, 0.0);
        let heavy = compute_simulated_options(&cep("80010-000"), 15.0, 0.0);
        for (l, h) in light.iter().zip(&heavy) {
            assert!(h.price > l.price);
        }
    }

    #[test]
    fn deterministic_for_same_input() {
        let a = compute_simulated_options(&cep("50010-000"), 4.5, 899.9);
        let b = compute_simulated_options(&cep("50010-000"), 4.5, 899.9);
        assert_eq!(a, b);
    }
}
