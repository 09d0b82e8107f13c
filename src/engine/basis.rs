//! Basis and derived-metric calculators
//!
//! Pure functions. Undefined inputs (non-finite values, zero denominators)
//! yield `None`, never NaN, never infinity.

/// Funding paid 3x/day on the tracked perp
pub const FUNDING_PERIODS_PER_YEAR: f64 = 1_095.0;

fn defined(venue_price: f64, reference_price: f64) -> bool {
    venue_price.is_finite() && reference_price.is_finite() && reference_price != 0.0
}

/// Absolute USD deviation of a venue price from the reference price
pub fn basis_usd(venue_price: f64, reference_price: f64) -> Option<f64> {
    defined(venue_price, reference_price).then(|| venue_price - reference_price)
}

/// Deviation in basis points relative to the reference price
pub fn basis_bps(venue_price: f64, reference_price: f64) -> Option<f64> {
    defined(venue_price, reference_price).then(|| (venue_price / reference_price - 1.0) * 10_000.0)
}

/// Annualized funding yield (percent) from a periodic funding rate
pub fn funding_apy_pct(periodic_rate: f64, periods_per_year: f64) -> Option<f64> {
    if !periodic_rate.is_finite() || !periods_per_year.is_finite() {
        return None;
    }
    let apy = ((1.0 + periodic_rate).powf(periods_per_year) - 1.0) * 100.0;
    apy.is_finite().then_some(apy)
}

/// Venue-vs-venue deviation in USD, `b` as the anchor
pub fn dislocation_usd(venue_a: f64, venue_b: f64) -> Option<f64> {
    basis_usd(venue_a, venue_b)
}

/// Venue-vs-venue deviation in bps, `b` as the denominator
pub fn dislocation_bps(venue_a: f64, venue_b: f64) -> Option<f64> {
    basis_bps(venue_a, venue_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_exact_values() {
        assert_eq!(basis_usd(2651.0, 2650.12), Some(2651.0 - 2650.12));
        let bps = basis_bps(2651.0, 2650.12).unwrap();
        assert!((bps - (2651.0 / 2650.12 - 1.0) * 10_000.0).abs() < 1e-12);
        // ~3.32 bps for the reference scenario
        assert!((bps - 3.32).abs() < 0.01);
    }

    #[test]
    fn test_undefined_inputs_yield_none() {
        for (px, r) in [
            (f64::NAN, 2650.0),
            (2651.0, f64::NAN),
            (f64::INFINITY, 2650.0),
            (2651.0, f64::NEG_INFINITY),
            (2651.0, 0.0),
        ] {
            assert_eq!(basis_usd(px, r), None);
            assert_eq!(basis_bps(px, r), None);
        }
    }

    #[test]
    fn test_funding_apy_zero_rate() {
        assert_eq!(funding_apy_pct(0.0, FUNDING_PERIODS_PER_YEAR), Some(0.0));
    }

    #[test]
    fn test_funding_apy_representative_rate() {
        // ((1.0001)^1095 - 1) * 100
        let apy = funding_apy_pct(0.0001, FUNDING_PERIODS_PER_YEAR).unwrap();
        assert!((apy - 11.5714).abs() < 0.001, "got {}", apy);
    }

    #[test]
    fn test_funding_apy_non_finite_rate() {
        assert_eq!(funding_apy_pct(f64::NAN, FUNDING_PERIODS_PER_YEAR), None);
    }

    #[test]
    fn test_dislocation_mirrors_basis() {
        assert_eq!(dislocation_usd(2652.0, 2651.0), Some(1.0));
        assert_eq!(
            dislocation_bps(2652.0, 2651.0),
            basis_bps(2652.0, 2651.0)
        );
        assert_eq!(dislocation_bps(2652.0, 0.0), None);
    }
}
