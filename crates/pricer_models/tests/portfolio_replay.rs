//! Integration tests: recorded portfolio kernels against direct pricing.

use approx::assert_relative_eq;
use pricer_core::types::Tenor;
use pricer_kernel::{Engine, EvaluatorConfig, QuoteSource};
use pricer_models::curves::{CurveKind, OisCurve};
use pricer_models::instruments::{OisSwap, SwapDirection};
use pricer_models::portfolio::{Aggregation, Portfolio, TOTAL_OUTPUT};
use proptest::prelude::*;

const BASE_RATES: [f64; 10] = [
    0.01, 0.01, 0.01, 0.01, 0.01, 0.02, 0.02, 0.025, 0.03, 0.035,
];

fn portfolio(fixed_rates: &[f64]) -> Portfolio {
    let curves = CurveKind::ALL
        .iter()
        .map(|&k| OisCurve::standard(k, &BASE_RATES).unwrap())
        .collect();
    let mut portfolio = Portfolio::new(curves);
    let pillars = Tenor::standard_pillars();
    for (i, &rate) in fixed_rates.iter().enumerate() {
        let maturity = pillars[i % pillars.len()];
        let direction = if i % 2 == 0 {
            SwapDirection::PayFixed
        } else {
            SwapDirection::ReceiveFixed
        };
        let swap = OisSwap::new(1_000_000.0, rate, maturity, direction).unwrap();
        portfolio.add_trade(i % 3, swap).unwrap();
    }
    portfolio
}

fn direct_total(portfolio: &Portfolio, scenario: &[Vec<f64>]) -> f64 {
    for (curve, rates) in portfolio.curves().iter().zip(scenario) {
        curve.set_quotes(rates).unwrap();
    }
    let npv = portfolio.total_npv().concrete().unwrap();
    for curve in portfolio.curves() {
        curve.set_quotes(&BASE_RATES).unwrap();
    }
    npv
}

#[test]
fn test_many_trades_one_recording() {
    let fixed: Vec<f64> = (0..60).map(|i| 0.005 + 0.0007 * i as f64).collect();
    let portfolio = portfolio(&fixed);
    let engine = Engine::new(EvaluatorConfig::default()).unwrap();

    for step in 0..10 {
        let scenario = vec![vec![0.0025 + 0.0001 * step as f64; 10]; 3];
        let replayed = portfolio
            .price(&engine, Aggregation::Total, &scenario)
            .unwrap()
            .scalar(TOTAL_OUTPUT)
            .unwrap();
        assert_relative_eq!(
            replayed,
            direct_total(&portfolio, &scenario),
            max_relative = 1e-12,
            epsilon = 1e-6
        );
    }
    assert_eq!(engine.cache().recordings(), 1);
}

#[test]
fn test_different_portfolios_get_different_kernels() {
    let engine = Engine::new(EvaluatorConfig::default()).unwrap();
    let a = portfolio(&[0.01, 0.02, 0.03]);
    let b = portfolio(&[0.01, 0.02, 0.04]);
    let scenario = vec![BASE_RATES.to_vec(); 3];

    let pa = a.price(&engine, Aggregation::Total, &scenario).unwrap();
    let pb = b.price(&engine, Aggregation::Total, &scenario).unwrap();
    assert_eq!(engine.cache().len(), 2);
    assert_ne!(pa.scalar(TOTAL_OUTPUT), pb.scalar(TOTAL_OUTPUT));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_replay_equals_direct(
        fixed in proptest::collection::vec(0.005f64..0.05, 1..12),
        shift in 0.0f64..0.02,
    ) {
        let portfolio = portfolio(&fixed);
        let engine = Engine::new(EvaluatorConfig::builder().workers(1).build().unwrap()).unwrap();
        let scenario: Vec<Vec<f64>> = (0..3)
            .map(|c| BASE_RATES.iter().map(|r| r + shift * (c + 1) as f64 / 3.0).collect())
            .collect();

        let replayed = portfolio
            .price(&engine, Aggregation::Total, &scenario)
            .unwrap()
            .scalar(TOTAL_OUTPUT)
            .unwrap();
        let direct = direct_total(&portfolio, &scenario);
        prop_assert!((replayed - direct).abs() <= 1e-9 * direct.abs().max(1.0));
    }
}
