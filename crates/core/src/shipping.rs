//! Shipping fee resolution.
//!
//! A [`RateBand`] prices deliveries to a contiguous CEP range as
//! `fixed_fee + per_kg_fee * weight`. Bands are scanned in the order they are
//! given (creation order, as loaded by the storefront) and the first band
//! whose range contains the destination wins. When nothing matches, the band
//! configured for "other states" is used as a catch-all.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::types::cep::normalize_boundary;
use crate::{Cep, ShippingRateId, round_money};

/// Weight assumed for one unit of a product that has no weight configured.
pub const DEFAULT_UNIT_WEIGHT_KG: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Heaviest parcel the shop quotes.
pub const MAX_PARCEL_WEIGHT_KG: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Description fragments that mark a band as the catch-all band.
const FALLBACK_MARKERS: &[&str] = &["outros estados", "demais estados", "other states"];

/// Errors from [`resolve_shipping`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingError {
    #[error("weight cannot be negative")]
    NegativeWeight,
    #[error("weight cannot exceed 1000 kg")]
    WeightTooLarge,
    #[error("we do not deliver to CEP {0} yet")]
    RegionNotServed(Cep),
}

/// A configured shipping-fee rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateBand {
    pub id: ShippingRateId,
    /// First CEP of the range, inclusive.
    pub cep_start: String,
    /// Last CEP of the range, inclusive.
    pub cep_end: String,
    pub fixed_fee: Decimal,
    pub per_kg_fee: Decimal,
    pub lead_time_days: i32,
    pub description: String,
}

impl RateBand {
    /// Whether `cep` falls inside this band's range.
    ///
    /// Boundaries are zero-padded to 8 digits before comparing, so the
    /// string comparison is equivalent to a numeric one.
    #[must_use]
    pub fn contains(&self, cep: &Cep) -> bool {
        let start = normalize_boundary(&self.cep_start);
        let end = normalize_boundary(&self.cep_end);
        let cep = cep.as_str();
        start.as_str() <= cep && cep <= end.as_str()
    }

    /// Whether this band is the "other states" catch-all.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        let description = self.description.to_lowercase();
        FALLBACK_MARKERS
            .iter()
            .any(|marker| description.contains(marker))
    }

    /// Fee for a parcel of `weight_kg`, rounded to cents.
    ///
    /// `None` when the fee does not fit in a `Decimal`.
    #[must_use]
    pub fn fee_for(&self, weight_kg: Decimal) -> Option<Decimal> {
        self.per_kg_fee
            .checked_mul(weight_kg)
            .and_then(|variable| self.fixed_fee.checked_add(variable))
            .map(round_money)
    }
}

/// Result of a successful shipping lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    pub band_id: ShippingRateId,
    pub fee: Decimal,
    pub lead_time_days: i32,
    pub description: String,
    pub weight_kg: Decimal,
}

/// One line of a parcel: a product's unit weight (if known) and a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParcelLine {
    pub unit_weight_kg: Option<Decimal>,
    pub quantity: u32,
}

/// Total parcel weight: Σ unit weight × quantity, with unknown weights
/// counted as [`DEFAULT_UNIT_WEIGHT_KG`]. Saturates at `Decimal::MAX`, which
/// [`check_weight`] then rejects.
#[must_use]
pub fn parcel_weight<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = ParcelLine>,
{
    lines
        .into_iter()
        .map(|line| {
            line.unit_weight_kg
                .unwrap_or(DEFAULT_UNIT_WEIGHT_KG)
                .saturating_mul(Decimal::from(line.quantity))
        })
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Reject weights outside `0..=MAX_PARCEL_WEIGHT_KG`.
///
/// # Errors
///
/// Returns [`ShippingError::NegativeWeight`] or [`ShippingError::WeightTooLarge`].
pub fn check_weight(weight_kg: Decimal) -> Result<(), ShippingError> {
    if weight_kg.is_sign_negative() && !weight_kg.is_zero() {
        return Err(ShippingError::NegativeWeight);
    }
    if weight_kg > MAX_PARCEL_WEIGHT_KG {
        return Err(ShippingError::WeightTooLarge);
    }
    Ok(())
}

/// Pick the band for `cep` and price a parcel of `weight_kg`.
///
/// `bands` must already be filtered to active bands and ordered by creation
/// time.
///
/// # Errors
///
/// Returns the [`check_weight`] errors and [`ShippingError::RegionNotServed`]
/// when neither a matching band nor a fallback band exists.
pub fn resolve_shipping(
    bands: &[RateBand],
    cep: &Cep,
    weight_kg: Decimal,
) -> Result<ShippingQuote, ShippingError> {
    check_weight(weight_kg)?;

    let band = bands
        .iter()
        .find(|band| band.contains(cep))
        .or_else(|| bands.iter().find(|band| band.is_fallback()))
        .ok_or_else(|| ShippingError::RegionNotServed(cep.clone()))?;

    Ok(ShippingQuote {
        band_id: band.id,
        fee: band.fee_for(weight_kg).ok_or(ShippingError::WeightTooLarge)?,
        lead_time_days: band.lead_time_days,
        description: band.description.clone(),
        weight_kg,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn band(id: i64, start: &str, end: &str, fixed: &str, per_kg: &str, desc: &str) -> RateBand {
        RateBand {
            id: ShippingRateId::new(id),
            cep_start: start.to_string(),
            cep_end: end.to_string(),
            fixed_fee: dec(fixed),
            per_kg_fee: dec(per_kg),
            lead_time_days: 3,
            description: desc.to_string(),
        }
    }

    fn sao_paulo_bands() -> Vec<RateBand> {
        vec![
            band(1, "01000-000", "01999-999", "10", "2", "São Paulo capital"),
            band(2, "20000000", "28999999", "18", "3.5", "Rio de Janeiro"),
            band(3, "00000000", "00000000", "35", "6", "Outros estados"),
        ]
    }

    #[test]
    fn test_example_fee() {
        let cep = Cep::parse("01310-100").unwrap();
        let quote = resolve_shipping(&sao_paulo_bands(), &cep, dec("2.3")).unwrap();
        assert_eq!(quote.fee, dec("14.60"));
        assert_eq!(quote.band_id, ShippingRateId::new(1));
        assert_eq!(quote.weight_kg, dec("2.3"));
        assert_eq!(quote.description, "São Paulo capital");
    }

    #[test]
    fn test_range_boundaries_are_inclusive() {
        let bands = sao_paulo_bands();
        let first = Cep::parse("01000000").unwrap();
        let last = Cep::parse("01999999").unwrap();
        assert_eq!(resolve_shipping(&bands, &first, dec("1")).unwrap().band_id.as_i64(), 1);
        assert_eq!(resolve_shipping(&bands, &last, dec("1")).unwrap().band_id.as_i64(), 1);
    }

    #[test]
    fn test_unpadded_boundaries() {
        let bands = vec![band(7, "1000000", "1999999", "10", "2", "SP")];
        let cep = Cep::parse("01310-100").unwrap();
        assert_eq!(resolve_shipping(&bands, &cep, dec("1")).unwrap().fee, dec("12"));
    }

    #[test]
    fn test_first_matching_band_wins() {
        let mut bands = sao_paulo_bands();
        bands.push(band(9, "01000000", "01999999", "1", "1", "Duplicate SP"));
        let cep = Cep::parse("01310100").unwrap();
        assert_eq!(resolve_shipping(&bands, &cep, dec("1")).unwrap().band_id.as_i64(), 1);
    }

    #[test]
    fn test_fallback_band() {
        let cep = Cep::parse("69900-000").unwrap();
        let quote = resolve_shipping(&sao_paulo_bands(), &cep, dec("1.5")).unwrap();
        assert_eq!(quote.band_id, ShippingRateId::new(3));
        assert_eq!(quote.fee, dec("44"));
    }

    #[test]
    fn test_fallback_marker_is_case_insensitive() {
        assert!(band(1, "0", "0", "1", "1", "DEMAIS ESTADOS").is_fallback());
        assert!(band(1, "0", "0", "1", "1", "Other States (PAC)").is_fallback());
        assert!(!band(1, "0", "0", "1", "1", "Rio de Janeiro").is_fallback());
    }

    #[test]
    fn test_region_not_served() {
        let bands: Vec<RateBand> = sao_paulo_bands().into_iter().take(2).collect();
        let cep = Cep::parse("69900-000").unwrap();
        assert_eq!(
            resolve_shipping(&bands, &cep, dec("1")),
            Err(ShippingError::RegionNotServed(cep))
        );
    }

    #[test]
    fn test_negative_weight_rejected() {
        let cep = Cep::parse("01310-100").unwrap();
        assert_eq!(
            resolve_shipping(&sao_paulo_bands(), &cep, dec("-0.1")),
            Err(ShippingError::NegativeWeight)
        );
    }

    #[test]
    fn test_weight_cap() {
        let cep = Cep::parse("01310-100").unwrap();
        let bands = sao_paulo_bands();
        assert_eq!(
            resolve_shipping(&bands, &cep, MAX_PARCEL_WEIGHT_KG).unwrap().fee,
            dec("2010")
        );
        assert_eq!(
            resolve_shipping(&bands, &cep, dec("1000.001")),
            Err(ShippingError::WeightTooLarge)
        );
        assert_eq!(
            resolve_shipping(&bands, &cep, Decimal::MAX),
            Err(ShippingError::WeightTooLarge)
        );
    }

    #[test]
    fn test_fee_overflow_is_none() {
        let band = &sao_paulo_bands()[0];
        assert_eq!(band.fee_for(Decimal::MAX), None);
    }

    #[test]
    fn test_fee_is_monotonic_in_weight() {
        let band = &sao_paulo_bands()[0];
        let mut previous = band.fee_for(Decimal::ZERO).unwrap();
        for tenths in 1..200 {
            let fee = band.fee_for(Decimal::new(tenths, 1)).unwrap();
            assert!(fee >= previous, "fee dropped at {tenths} tenths of a kg");
            previous = fee;
        }
    }

    #[test]
    fn test_parcel_weight_defaults_missing_weights() {
        let lines = [
            ParcelLine {
                unit_weight_kg: Some(dec("1.2")),
                quantity: 2,
            },
            ParcelLine {
                unit_weight_kg: None,
                quantity: 3,
            },
        ];
        assert_eq!(parcel_weight(lines), dec("3.9"));
        assert_eq!(parcel_weight([]), Decimal::ZERO);
    }
}
