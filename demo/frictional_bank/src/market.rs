//! Random portfolios and rate scenarios.
//!
//! Three OIS curves (SOFR, ESTR, SONIA) on the ten standard pillars, each
//! with `trades_per_curve` pay-fixed swaps. Everything is driven by one
//! seeded generator so a run is reproducible from its seed.

use pricer_core::types::Tenor;
use pricer_models::curves::{CurveKind, OisCurve};
use pricer_models::instruments::{OisSwap, SwapDirection};
use pricer_models::portfolio::Portfolio;
use pricer_models::ModelResult;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Starting zero rates on [`Tenor::STANDARD_PILLARS`].
pub const BASE_RATES: [f64; 10] = [
    0.01, 0.01, 0.01, 0.01, 0.01, 0.02, 0.02, 0.025, 0.03, 0.035,
];

/// Notional of every generated swap.
pub const NOTIONAL: f64 = 1_000_000.0;

/// Maturity of generated swaps when maturities are not randomised.
pub const DEFAULT_MATURITY: &str = "10Y";

/// Scenario rates are `SCENARIO_FLOOR + SCENARIO_STEP * k`, `k` in `0..=99`.
pub const SCENARIO_FLOOR: f64 = 0.0025;

/// See [`SCENARIO_FLOOR`].
pub const SCENARIO_STEP: f64 = 0.005 * 0.02;

/// Seeded source of portfolios and scenarios.
#[derive(Debug)]
pub struct MarketGenerator {
    rng: StdRng,
}

impl MarketGenerator {
    /// Generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds the three-curve portfolio.
    ///
    /// Fixed rates are uniform in `[0.005, 0.05)`. With
    /// `random_maturities` each swap takes a maturity drawn from the curve
    /// pillars, otherwise every swap is [`DEFAULT_MATURITY`].
    pub fn portfolio(
        &mut self,
        trades_per_curve: usize,
        random_maturities: bool,
    ) -> ModelResult<Portfolio> {
        let curves = CurveKind::ALL
            .iter()
            .map(|&kind| OisCurve::standard(kind, &BASE_RATES))
            .collect::<ModelResult<Vec<_>>>()?;
        let pillars = Tenor::standard_pillars();
        let default_maturity: Tenor = DEFAULT_MATURITY.parse()?;

        let mut portfolio = Portfolio::new(curves);
        for curve in 0..CurveKind::ALL.len() {
            for _ in 0..trades_per_curve {
                let fixed_rate = self.rng.gen_range(0.005..0.05);
                let maturity = if random_maturities {
                    pillars
                        .choose(&mut self.rng)
                        .copied()
                        .unwrap_or(default_maturity)
                } else {
                    default_maturity
                };
                let swap = OisSwap::new(NOTIONAL, fixed_rate, maturity, SwapDirection::PayFixed)?;
                portfolio.add_trade(curve, swap)?;
            }
        }
        Ok(portfolio)
    }

    /// One scenario: a rate vector per curve, one rate per pillar.
    pub fn scenario(&mut self, portfolio: &Portfolio) -> Vec<Vec<f64>> {
        portfolio
            .curves()
            .iter()
            .map(|curve| {
                (0..curve.tenors().len())
                    .map(|_| SCENARIO_FLOOR + SCENARIO_STEP * f64::from(self.rng.gen_range(0..=99u32)))
                    .collect()
            })
            .collect()
    }

    /// `count` scenarios.
    pub fn scenarios(&mut self, portfolio: &Portfolio, count: usize) -> Vec<Vec<Vec<f64>>> {
        (0..count).map(|_| self.scenario(portfolio)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_shape() {
        let portfolio = MarketGenerator::new(42).portfolio(5, false).unwrap();
        assert_eq!(portfolio.curves().len(), 3);
        assert_eq!(portfolio.len(), 15);
        for trade in portfolio.trades() {
            let swap = trade.swap();
            assert!((0.005..0.05).contains(&swap.fixed_rate()));
            assert_eq!(swap.maturity().to_string(), DEFAULT_MATURITY);
            assert_eq!(swap.notional(), NOTIONAL);
        }
    }

    #[test]
    fn test_random_maturities_use_pillars() {
        let portfolio = MarketGenerator::new(7).portfolio(20, true).unwrap();
        let pillars = Tenor::standard_pillars();
        assert!(portfolio
            .trades()
            .iter()
            .all(|t| pillars.contains(&t.swap().maturity())));
    }

    #[test]
    fn test_same_seed_same_market() {
        let mut a = MarketGenerator::new(42);
        let mut b = MarketGenerator::new(42);
        let pa = a.portfolio(10, true).unwrap();
        let pb = b.portfolio(10, true).unwrap();
        assert_eq!(pa.fingerprint(), pb.fingerprint());
        assert_eq!(a.scenarios(&pa, 3), b.scenarios(&pb, 3));
    }

    #[test]
    fn test_scenario_rates_on_grid() {
        let mut generator = MarketGenerator::new(1);
        let portfolio = generator.portfolio(1, false).unwrap();
        let scenario = generator.scenario(&portfolio);
        assert_eq!(scenario.len(), 3);
        for rates in &scenario {
            assert_eq!(rates.len(), 10);
            for &r in rates {
                let k = (r - SCENARIO_FLOOR) / SCENARIO_STEP;
                assert!((k - k.round()).abs() < 1e-6);
                assert!((0.0..=99.0 + 1e-9).contains(&k));
            }
        }
    }
}
