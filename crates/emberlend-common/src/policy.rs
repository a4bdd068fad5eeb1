//! Lending policy constants
//!
//! Single source of truth for risk bands, APR bounds, and the acceptable
//! risk ceiling. The gateway and the ledger collaborator both read
//! [`MAX_ACCEPTABLE_RISK`] so the advisory and authoritative paths cannot
//! diverge on policy.

/// Smallest on-chain unit per whole token (18 decimals)
pub const TOKEN: u128 = 1_000_000_000_000_000_000;

/// Maximum combined risk score a loan decision will accept
pub const MAX_ACCEPTABLE_RISK: u8 = 60;

/// APR floor in basis points (3%)
pub const APR_MIN_BPS: u16 = 300;

/// APR ceiling in basis points (6%)
pub const APR_MAX_BPS: u16 = 600;

/// APR jitter magnitude in basis points
pub const APR_JITTER_BPS: i16 = 50;

/// Utilization can add at most this many basis points to APR
pub const MAX_UTILIZATION_PREMIUM_BPS: u16 = 200;

/// How long a submitted credit profile remains valid
pub const PROFILE_VALIDITY_DAYS: i64 = 30;

/// TradFi score upper bound
pub const TRADFI_SCORE_MAX: u16 = 1000;

/// OnChain score upper bound
pub const ONCHAIN_SCORE_MAX: u8 = 100;

/// Estimated wallet-age cap in days (2 years)
pub const WALLET_AGE_CAP_DAYS: u32 = 730;

/// Assumed days per on-chain transaction when estimating wallet age
pub const DAYS_PER_TRANSACTION: u32 = 7;

/// Risk bands: (inclusive risk ceiling, max borrow in whole tokens).
/// The ceiling is a non-increasing step function of risk.
pub const RISK_BANDS: [(u8, u128); 5] = [
    (20, 50_000),
    (40, 25_000),
    (60, 10_000),
    (80, 5_000),
    (100, 1_000),
];

/// Max borrow ceiling in smallest units for a combined risk score.
pub fn max_borrow_for_risk(risk: u8) -> u128 {
    for (ceiling, tokens) in RISK_BANDS {
        if risk <= ceiling {
            return tokens * TOKEN;
        }
    }
    1_000 * TOKEN
}

/// Clamp an APR (possibly pushed out of range by premiums or jitter)
/// back into the allowed band.
pub fn clamp_apr(apr_bps: i32) -> u16 {
    apr_bps.clamp(APR_MIN_BPS as i32, APR_MAX_BPS as i32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_non_increasing() {
        let mut prev = u128::MAX;
        for risk in 0..=100u8 {
            let ceiling = max_borrow_for_risk(risk);
            assert!(ceiling <= prev, "ceiling rose at risk {risk}");
            prev = ceiling;
        }
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(max_borrow_for_risk(0), 50_000 * TOKEN);
        assert_eq!(max_borrow_for_risk(20), 50_000 * TOKEN);
        assert_eq!(max_borrow_for_risk(21), 25_000 * TOKEN);
        assert_eq!(max_borrow_for_risk(60), 10_000 * TOKEN);
        assert_eq!(max_borrow_for_risk(61), 5_000 * TOKEN);
        assert_eq!(max_borrow_for_risk(81), 1_000 * TOKEN);
        assert_eq!(max_borrow_for_risk(100), 1_000 * TOKEN);
    }

    #[test]
    fn test_clamp_apr() {
        assert_eq!(clamp_apr(250), 300);
        assert_eq!(clamp_apr(342), 342);
        assert_eq!(clamp_apr(650), 600);
    }
}
