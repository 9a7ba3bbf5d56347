//! Swap portfolios priced through the kernel engine.
//!
//! A [`Portfolio`] owns its curves and trades. Its NPV functions are pure
//! functions of the curve quotes, so the first pricing call records them
//! into a kernel (one input group per curve) and every later call only
//! binds scenario rates and replays.
//!
//! # Examples
//!
//! ```
//! use pricer_kernel::{Engine, EvaluatorConfig};
//! use pricer_models::curves::{CurveKind, OisCurve};
//! use pricer_models::instruments::{OisSwap, SwapDirection};
//! use pricer_models::portfolio::{Aggregation, Portfolio};
//!
//! let sofr = OisCurve::standard(CurveKind::Sofr, &[0.02; 10]).unwrap();
//! let mut portfolio = Portfolio::new(vec![sofr]);
//! let swap = OisSwap::new(1e6, 0.02, "10Y".parse().unwrap(), SwapDirection::PayFixed).unwrap();
//! portfolio.add_trade(0, swap).unwrap();
//!
//! let engine = Engine::new(EvaluatorConfig::default()).unwrap();
//! let results = portfolio
//!     .price(&engine, Aggregation::Total, &[vec![0.03; 10]])
//!     .unwrap();
//! assert!(results.scalar("npv").unwrap() > 0.0);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use pricer_core::types::Currency;
use pricer_kernel::{Engine, Kernel, OutputSpec, Outputs, QuoteSource, ResultMap, Traced};
use tracing::debug;

use crate::curves::OisCurve;
use crate::error::{ModelError, ModelResult};
use crate::instruments::OisSwap;

/// Output name of the total NPV.
pub const TOTAL_OUTPUT: &str = "npv";

/// How portfolio NPVs are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    /// One scalar output, [`TOTAL_OUTPUT`].
    #[default]
    Total,
    /// One scalar output per currency, named by ISO code.
    ByCurrency,
}

impl Aggregation {
    /// Name of the recorded kernel.
    pub fn kernel_name(&self) -> &'static str {
        match self {
            Aggregation::Total => "portfolio_npv",
            Aggregation::ByCurrency => "portfolio_npv_by_currency",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kernel_name())
    }
}

/// A swap booked against one of the portfolio's curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    curve: usize,
    swap: OisSwap,
}

impl Trade {
    /// Index of the discounting curve.
    #[inline]
    pub fn curve(&self) -> usize {
        self.curve
    }

    /// Trade terms.
    #[inline]
    pub fn swap(&self) -> &OisSwap {
        &self.swap
    }
}

/// Curves plus the swaps priced on them.
#[derive(Debug, Clone)]
pub struct Portfolio {
    curves: Vec<OisCurve>,
    trades: Vec<Trade>,
}

impl Portfolio {
    /// Creates an empty portfolio over `curves`.
    pub fn new(curves: Vec<OisCurve>) -> Self {
        Self {
            curves,
            trades: Vec::new(),
        }
    }

    /// Curves in input-group order.
    pub fn curves(&self) -> &[OisCurve] {
        &self.curves
    }

    /// Booked trades.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Number of trades.
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Whether no trade is booked.
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Books `swap` on curve `curve`.
    ///
    /// # Errors
    ///
    /// `ModelError::UnknownCurve` if `curve` is out of range.
    pub fn add_trade(&mut self, curve: usize, swap: OisSwap) -> ModelResult<()> {
        if curve >= self.curves.len() {
            return Err(ModelError::UnknownCurve {
                index: curve,
                len: self.curves.len(),
            });
        }
        self.trades.push(Trade { curve, swap });
        Ok(())
    }

    /// Curves as quote sources, one kernel input group each.
    pub fn sources(&self) -> Vec<&dyn QuoteSource> {
        self.curves.iter().map(|c| c as &dyn QuoteSource).collect()
    }

    /// Currencies of the curves, first occurrence order.
    ///
    /// This is the output keyspace of [`Aggregation::ByCurrency`]; it does
    /// not depend on which curves carry trades.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut out: Vec<Currency> = Vec::with_capacity(self.curves.len());
        for currency in self.curves.iter().map(|c| c.kind().currency()) {
            if !out.contains(&currency) {
                out.push(currency);
            }
        }
        out
    }

    /// Sum of all trade NPVs.
    pub fn total_npv(&self) -> Traced {
        self.trades
            .iter()
            .map(|t| t.swap.npv(&self.curves[t.curve]))
            .sum()
    }

    /// NPV per currency, every currency of [`Portfolio::currencies`]
    /// present even without trades.
    pub fn npv_by_currency(&self) -> Outputs {
        let mut outputs = Outputs::new();
        for currency in self.currencies() {
            outputs.insert(currency.code(), 0.0);
        }
        for trade in &self.trades {
            let curve = &self.curves[trade.curve];
            outputs.accumulate(curve.kind().currency().code(), trade.swap.npv(curve));
        }
        outputs
    }

    /// Declared outputs for `aggregation`.
    pub fn output_spec(&self, aggregation: Aggregation) -> OutputSpec {
        match aggregation {
            Aggregation::Total => OutputSpec::single(TOTAL_OUTPUT),
            Aggregation::ByCurrency => OutputSpec::new(self.currencies().iter().map(|c| c.code())),
        }
    }

    /// Structural hash of curves and trade terms.
    ///
    /// Two portfolios with equal fingerprints record identical tapes; quote
    /// values are not part of it.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.curves.len().hash(&mut hasher);
        for curve in &self.curves {
            curve.kind().hash(&mut hasher);
            curve.tenors().hash(&mut hasher);
        }
        self.trades.len().hash(&mut hasher);
        for trade in &self.trades {
            trade.curve.hash(&mut hasher);
            trade.swap.notional().to_bits().hash(&mut hasher);
            trade.swap.fixed_rate().to_bits().hash(&mut hasher);
            trade.swap.maturity().hash(&mut hasher);
            trade.swap.direction().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Kernel for `aggregation`, recorded on first use.
    ///
    /// # Errors
    ///
    /// `ModelError::Kernel` if recording fails.
    pub fn kernel(&self, engine: &Engine, aggregation: Aggregation) -> ModelResult<Arc<Kernel>> {
        let sources = self.sources();
        let spec = self.output_spec(aggregation);
        let kernel = engine.quote_kernel(
            aggregation.kernel_name(),
            self.fingerprint(),
            &sources,
            &spec,
            || Ok(self.outputs(aggregation)),
        )?;
        Ok(kernel)
    }

    /// Prices one scenario, one rate vector per curve.
    ///
    /// # Errors
    ///
    /// `ModelError::Kernel` if recording fails or `scenario` does not match
    /// the curves.
    pub fn price<V: AsRef<[f64]>>(
        &self,
        engine: &Engine,
        aggregation: Aggregation,
        scenario: &[V],
    ) -> ModelResult<ResultMap> {
        let sources = self.sources();
        let spec = self.output_spec(aggregation);
        debug!(
            aggregation = %aggregation,
            curves = self.curves.len(),
            trades = self.trades.len(),
            "Pricing portfolio scenario"
        );
        let results = engine.price_with_quotes(
            aggregation.kernel_name(),
            self.fingerprint(),
            &sources,
            &spec,
            || Ok(self.outputs(aggregation)),
            scenario,
        )?;
        Ok(results)
    }

    /// Prices many scenarios on the engine's worker pool, in scenario order.
    ///
    /// # Errors
    ///
    /// As for [`Portfolio::price`]; binding errors name the scenario.
    pub fn price_batch<V: AsRef<[f64]>>(
        &self,
        engine: &Engine,
        aggregation: Aggregation,
        scenarios: &[Vec<V>],
    ) -> ModelResult<Vec<ResultMap>> {
        let sources = self.sources();
        let spec = self.output_spec(aggregation);
        debug!(
            aggregation = %aggregation,
            scenarios = scenarios.len(),
            "Pricing portfolio batch"
        );
        let results = engine.price_batch_with_quotes(
            aggregation.kernel_name(),
            self.fingerprint(),
            &sources,
            &spec,
            || Ok(self.outputs(aggregation)),
            scenarios,
        )?;
        Ok(results)
    }

    fn outputs(&self, aggregation: Aggregation) -> Outputs {
        match aggregation {
            Aggregation::Total => Outputs::single(TOTAL_OUTPUT, self.total_npv()),
            Aggregation::ByCurrency => self.npv_by_currency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurveKind;
    use crate::instruments::SwapDirection;
    use approx::assert_relative_eq;
    use pricer_kernel::{EvaluatorConfig, KernelError, TracedOutput};

    const BASE_RATES: [f64; 10] = [
        0.01, 0.01, 0.01, 0.01, 0.01, 0.02, 0.02, 0.025, 0.03, 0.035,
    ];

    fn swap(rate: f64, maturity: &str) -> OisSwap {
        OisSwap::new(1_000_000.0, rate, maturity.parse().unwrap(), SwapDirection::PayFixed).unwrap()
    }

    fn three_curves() -> Portfolio {
        let curves = CurveKind::ALL
            .iter()
            .map(|&k| OisCurve::standard(k, &BASE_RATES).unwrap())
            .collect();
        let mut portfolio = Portfolio::new(curves);
        portfolio.add_trade(0, swap(0.01, "10Y")).unwrap();
        portfolio.add_trade(0, swap(0.03, "5Y")).unwrap();
        portfolio.add_trade(1, swap(0.02, "20Y")).unwrap();
        portfolio.add_trade(2, swap(0.015, "3Y")).unwrap();
        portfolio
    }

    fn engine() -> Engine {
        Engine::new(EvaluatorConfig::builder().workers(2).build().unwrap()).unwrap()
    }

    fn scalar(outputs: &Outputs, name: &str) -> f64 {
        match outputs.get(name) {
            Some(TracedOutput::Scalar(v)) => v.concrete().unwrap(),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_unknown_curve() {
        let mut portfolio = three_curves();
        assert_eq!(
            portfolio.add_trade(3, swap(0.01, "1Y")),
            Err(ModelError::UnknownCurve { index: 3, len: 3 })
        );
        assert_eq!(portfolio.len(), 4);
    }

    #[test]
    fn test_currency_keyspace_declared_without_trades() {
        let curves = vec![
            OisCurve::standard(CurveKind::Sofr, &BASE_RATES).unwrap(),
            OisCurve::standard(CurveKind::Sonia, &BASE_RATES).unwrap(),
        ];
        let mut portfolio = Portfolio::new(curves);
        portfolio.add_trade(0, swap(0.01, "10Y")).unwrap();

        assert_eq!(portfolio.currencies(), vec![Currency::USD, Currency::GBP]);
        let outputs = portfolio.npv_by_currency();
        assert_eq!(outputs.len(), 2);
        assert_eq!(scalar(&outputs, "GBP"), 0.0);
    }

    #[test]
    fn test_by_currency_sums_to_total() {
        let portfolio = three_curves();
        let outputs = portfolio.npv_by_currency();
        let sum: f64 = ["USD", "EUR", "GBP"].iter().map(|c| scalar(&outputs, c)).sum();
        assert_relative_eq!(
            sum,
            portfolio.total_npv().concrete().unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_fingerprint_tracks_terms_not_rates() {
        let a = three_curves();
        let b = three_curves();
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.curves()[0].set_quote(3, 0.05).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = three_curves();
        c.add_trade(1, swap(0.02, "1Y")).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_replay_matches_direct_pricing() {
        let portfolio = three_curves();
        let engine = engine();
        let scenario: Vec<Vec<f64>> = (0..3)
            .map(|c| (0..10).map(|i| 0.0025 + 0.001 * (i + c) as f64).collect())
            .collect();

        let replayed = portfolio
            .price(&engine, Aggregation::Total, &scenario)
            .unwrap()
            .scalar(TOTAL_OUTPUT)
            .unwrap();

        for (curve, rates) in portfolio.curves().iter().zip(&scenario) {
            curve.set_quotes(rates).unwrap();
        }
        let direct = portfolio.total_npv().concrete().unwrap();
        assert_relative_eq!(replayed, direct, max_relative = 1e-12);
    }

    #[test]
    fn test_by_currency_kernel_outputs() {
        let portfolio = three_curves();
        let engine = engine();
        let scenario = vec![BASE_RATES.to_vec(); 3];

        let results = portfolio
            .price(&engine, Aggregation::ByCurrency, &scenario)
            .unwrap();
        let direct = portfolio.npv_by_currency();
        for code in ["USD", "EUR", "GBP"] {
            assert_relative_eq!(
                results.scalar(code).unwrap(),
                scalar(&direct, code),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_recorded_once_across_calls() {
        let portfolio = three_curves();
        let engine = engine();
        for i in 0..5 {
            let rates = vec![vec![0.01 + 0.001 * i as f64; 10]; 3];
            portfolio.price(&engine, Aggregation::Total, &rates).unwrap();
        }
        assert_eq!(engine.cache().recordings(), 1);

        portfolio
            .price(&engine, Aggregation::ByCurrency, &[BASE_RATES; 3])
            .unwrap();
        assert_eq!(engine.cache().recordings(), 2);
    }

    #[test]
    fn test_quotes_restored_after_recording() {
        let portfolio = three_curves();
        portfolio.kernel(&engine(), Aggregation::Total).unwrap();
        assert_eq!(portfolio.curves()[1].rates()[7], Some(0.025));
    }

    #[test]
    fn test_batch_matches_single() {
        let portfolio = three_curves();
        let engine = engine();
        let scenarios: Vec<Vec<Vec<f64>>> = (0..8)
            .map(|s| vec![vec![0.0025 + 0.0001 * s as f64; 10]; 3])
            .collect();

        let batch = portfolio
            .price_batch(&engine, Aggregation::Total, &scenarios)
            .unwrap();
        assert_eq!(batch.len(), 8);
        for (scenario, result) in scenarios.iter().zip(&batch) {
            let single = portfolio.price(&engine, Aggregation::Total, scenario).unwrap();
            assert_eq!(single.scalar(TOTAL_OUTPUT), result.scalar(TOTAL_OUTPUT));
        }
    }

    #[test]
    fn test_wrong_scenario_shape() {
        let portfolio = three_curves();
        let err = portfolio
            .price(&engine(), Aggregation::Total, &[vec![0.01; 10]])
            .unwrap_err();
        assert!(matches!(err, ModelError::Kernel(KernelError::Binding(_))));
    }

    #[test]
    fn test_kernel_stats() {
        let portfolio = three_curves();
        let kernel = portfolio.kernel(&engine(), Aggregation::Total).unwrap();
        let stats = kernel.stats();
        assert_eq!(stats.inputs, 30);
        assert_eq!(stats.outputs, 1);
        assert!(stats.operations > 0);
    }
}
