use crate::UsdMicros;

/// Default fee model: total modeled fees in percentage points
/// (0.1% taker on each leg).
pub const DEFAULT_FEE_PCT: f64 = 0.2;

pub const MICROS_PER_USD: i64 = 1_000_000;

#[inline(always)]
pub fn usd_to_micros(usd: f64) -> UsdMicros {
    (usd * MICROS_PER_USD as f64).round() as UsdMicros
}

#[inline(always)]
pub fn micros_to_usd(micros: UsdMicros) -> f64 {
    micros as f64 / MICROS_PER_USD as f64
}

/// Spread between a sell-side bid and a buy-side ask, in percentage
/// points of the ask. Returns 0 for a non-positive ask.
#[inline(always)]
pub fn spread_pct(bid: f64, ask: f64) -> f64 {
    if ask <= 0.0 {
        return 0.0;
    }
    (bid - ask) / ask * 100.0
}

/// Scale a fixed-point balance by a mark ratio, rounding to the
/// nearest micro-dollar.
#[inline(always)]
pub fn scale_micros(value: UsdMicros, ratio: f64) -> UsdMicros {
    (value as f64 * ratio).round() as UsdMicros
}

/// Scale rounding toward zero. Participant balances use this on marks so
/// their sum can never exceed the scaled pool value; the remainder is
/// house dust.
#[inline(always)]
pub fn scale_micros_down(value: UsdMicros, ratio: f64) -> UsdMicros {
    (value as f64 * ratio).floor() as UsdMicros
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_micros_round_trip() {
        assert_eq!(usd_to_micros(100_000.0), 100_000_000_000);
        assert_eq!(micros_to_usd(2_500_000), 2.5);
        // Sub-micro amounts round to nearest
        assert_eq!(usd_to_micros(0.0000004), 0);
        assert_eq!(usd_to_micros(0.0000006), 1);
    }

    #[test]
    fn test_spread_pct() {
        // Buy at 49100, sell at 49900: 800 / 49100 = 1.629...%
        let s = spread_pct(49_900.0, 49_100.0);
        assert!((s - 1.6293).abs() < 0.001);
        assert_eq!(spread_pct(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_scale_micros_preserves_ratio() {
        let v: UsdMicros = 2_000 * MICROS_PER_USD;
        let scaled = scale_micros(v, 1.2);
        assert_eq!(scaled, 2_400 * MICROS_PER_USD);
        // Relative error of rounding stays far below 1e-9
        let odd = scale_micros(33_333_333, 1.1);
        let exact = 33_333_333f64 * 1.1;
        assert!(((odd as f64 - exact) / exact).abs() < 1e-7);
    }
}
