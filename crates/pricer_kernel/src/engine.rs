//! Cache plus evaluator behind one handle.
//!
//! [`Engine`] is the entry point for "record once, price many times" usage:
//! the first call for a computation records its kernel through the quote
//! sources, every call binds the scenario rates and replays.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{KernelCache, KernelKey};
use crate::error::{ConfigError, KernelError, RecordingError, Result};
use crate::evaluator::{Evaluator, EvaluatorConfig, InputBindings, OutputRequest, ResultMap};
use crate::kernel::Kernel;
use crate::quote::QuoteSource;
use crate::recorder::{record_with_quotes, OutputSpec, Outputs};

/// Kernel cache and evaluator sharing one lifetime.
///
/// # Examples
///
/// ```
/// use pricer_kernel::{Engine, EvaluatorConfig, OutputSpec, Outputs, Quote, QuoteSource};
///
/// struct Strip(Vec<Quote>);
///
/// impl QuoteSource for Strip {
///     fn name(&self) -> &str { "strip" }
///     fn quotes(&self) -> &[Quote] { &self.0 }
/// }
///
/// let strip = Strip(vec![Quote::new(0.0); 10]);
/// let engine = Engine::new(EvaluatorConfig::default()).unwrap();
/// let price = || Ok(Outputs::single("sum", strip.0.iter().map(Quote::get).sum::<pricer_kernel::Traced>()));
///
/// let results = engine
///     .price_with_quotes("sum", 0, &[&strip], &OutputSpec::single("sum"), price, &[vec![0.01; 10]])
///     .unwrap();
/// assert!((results.scalar("sum").unwrap() - 0.1).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Engine {
    cache: KernelCache,
    evaluator: Evaluator,
}

impl Engine {
    /// Creates an engine with an empty cache.
    ///
    /// # Errors
    ///
    /// See [`Evaluator::new`].
    pub fn new(config: EvaluatorConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            cache: KernelCache::new(),
            evaluator: Evaluator::new(config)?,
        })
    }

    /// The kernel cache.
    pub fn cache(&self) -> &KernelCache {
        &self.cache
    }

    /// The evaluator.
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Kernel for `key`, recorded by `recorder` on first use.
    ///
    /// # Errors
    ///
    /// `KernelError::Recording`; see [`KernelCache::get_or_record`].
    pub fn kernel<F>(&self, key: &KernelKey, recorder: F) -> Result<Arc<Kernel>>
    where
        F: FnOnce() -> std::result::Result<Kernel, RecordingError>,
    {
        Ok(self.cache.get_or_record(key, recorder)?)
    }

    /// See [`Evaluator::evaluate`].
    pub fn evaluate(
        &self,
        kernel: &Kernel,
        request: &OutputRequest,
        bindings: &InputBindings,
    ) -> Result<ResultMap> {
        self.evaluator.evaluate(kernel, request, bindings)
    }

    /// See [`Evaluator::evaluate_batch`].
    pub fn evaluate_batch(
        &self,
        kernel: &Kernel,
        request: &OutputRequest,
        scenarios: &[InputBindings],
    ) -> Result<Vec<ResultMap>> {
        self.evaluator.evaluate_batch(kernel, request, scenarios)
    }

    /// Kernel of a quote-driven computation, recorded on first use.
    ///
    /// The key is `name`, the group sizes of `sources`, and `fingerprint`.
    ///
    /// # Errors
    ///
    /// `KernelError::Recording` if recording fails.
    pub fn quote_kernel<F>(
        &self,
        name: &str,
        fingerprint: u64,
        sources: &[&dyn QuoteSource],
        spec: &OutputSpec,
        traced_fn: F,
    ) -> Result<Arc<Kernel>>
    where
        F: FnOnce() -> std::result::Result<Outputs, RecordingError>,
    {
        let key = KernelKey::for_sources(name, sources).with_fingerprint(fingerprint);
        self.kernel(&key, || record_with_quotes(name, sources, spec, traced_fn))
    }

    /// Prices one scenario of a quote-driven computation.
    ///
    /// `scenario` holds one rate vector per source, in source order. All
    /// declared outputs are evaluated.
    ///
    /// # Errors
    ///
    /// - `KernelError::Recording` if the first-use recording fails
    /// - `KernelError::Binding` if `scenario` does not match the sources
    pub fn price_with_quotes<F, V>(
        &self,
        name: &str,
        fingerprint: u64,
        sources: &[&dyn QuoteSource],
        spec: &OutputSpec,
        traced_fn: F,
        scenario: &[V],
    ) -> Result<ResultMap>
    where
        F: FnOnce() -> std::result::Result<Outputs, RecordingError>,
        V: AsRef<[f64]>,
    {
        let kernel = self.quote_kernel(name, fingerprint, sources, spec, traced_fn)?;
        let bindings = kernel.bindings(scenario)?;
        self.evaluator
            .evaluate(&kernel, &kernel.request_all(), &bindings)
    }

    /// Prices many scenarios of a quote-driven computation on the worker
    /// pool. Results are in scenario order.
    ///
    /// # Errors
    ///
    /// As for [`Engine::price_with_quotes`]; binding errors name the
    /// offending scenario.
    pub fn price_batch_with_quotes<F, V>(
        &self,
        name: &str,
        fingerprint: u64,
        sources: &[&dyn QuoteSource],
        spec: &OutputSpec,
        traced_fn: F,
        scenarios: &[Vec<V>],
    ) -> Result<Vec<ResultMap>>
    where
        F: FnOnce() -> std::result::Result<Outputs, RecordingError>,
        V: AsRef<[f64]>,
    {
        let kernel = self.quote_kernel(name, fingerprint, sources, spec, traced_fn)?;
        let bindings = scenarios
            .iter()
            .enumerate()
            .map(|(i, scenario)| {
                kernel
                    .bindings(scenario)
                    .map_err(|e| KernelError::from(e).in_scenario(i))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(kernel = kernel.name(), scenarios = bindings.len(), "Bound scenarios");
        self.evaluator
            .evaluate_batch(&kernel, &kernel.request_all(), &bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingError;
    use crate::quote::Quote;
    use crate::traced::Traced;
    use std::cell::Cell;

    struct Strip {
        name: &'static str,
        quotes: Vec<Quote>,
    }

    impl QuoteSource for Strip {
        fn name(&self) -> &str {
            self.name
        }

        fn quotes(&self) -> &[Quote] {
            &self.quotes
        }
    }

    fn strip(name: &'static str, n: usize) -> Strip {
        Strip {
            name,
            quotes: (0..n).map(|_| Quote::new(0.0)).collect(),
        }
    }

    fn engine() -> Engine {
        Engine::new(EvaluatorConfig::builder().workers(2).build().unwrap()).unwrap()
    }

    #[test]
    fn test_price_records_once() {
        let engine = engine();
        let usd = strip("usd", 3);
        let calls = Cell::new(0);
        let spec = OutputSpec::single("total");
        let price = || {
            calls.set(calls.get() + 1);
            let total: Traced = usd.quotes.iter().map(Quote::get).sum();
            Ok(Outputs::single("total", total))
        };

        for i in 0..5 {
            let rates = vec![vec![i as f64, 1.0, 2.0]];
            let results = engine
                .price_with_quotes("total", 0, &[&usd], &spec, price, &rates)
                .unwrap();
            assert_eq!(results.scalar("total"), Some(i as f64 + 3.0));
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(engine.cache().recordings(), 1);
    }

    #[test]
    fn test_fingerprint_separates_kernels() {
        let engine = engine();
        let usd = strip("usd", 2);
        let spec = OutputSpec::single("y");
        let sum = || Ok(Outputs::single("y", usd.quotes[0].get() + usd.quotes[1].get()));
        let diff = || Ok(Outputs::single("y", usd.quotes[0].get() - usd.quotes[1].get()));

        let a = engine.quote_kernel("f", 1, &[&usd], &spec, sum).unwrap();
        let b = engine.quote_kernel("f", 2, &[&usd], &spec, diff).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(engine.cache().len(), 2);
    }

    #[test]
    fn test_batch_binding_error_names_scenario() {
        let engine = engine();
        let usd = strip("usd", 2);
        let spec = OutputSpec::single("y");
        let price = || Ok(Outputs::single("y", usd.quotes[0].get() * 2.0));
        let scenarios = vec![vec![vec![1.0, 2.0]], vec![vec![1.0]]];

        let err = engine
            .price_batch_with_quotes("double", 0, &[&usd], &spec, price, &scenarios)
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::Binding(BindingError::InScenario { scenario: 1, .. })
        ));
    }

    #[test]
    fn test_batch_over_two_sources() {
        let engine = engine();
        let usd = strip("usd", 2);
        let eur = strip("eur", 1);
        let spec = OutputSpec::new(["usd", "eur"]);
        let price = || {
            Ok(Outputs::new()
                .with("usd", usd.quotes[0].get() + usd.quotes[1].get())
                .with("eur", eur.quotes[0].get() * 10.0))
        };
        let scenarios: Vec<Vec<Vec<f64>>> = (0..10)
            .map(|i| vec![vec![i as f64, 1.0], vec![i as f64]])
            .collect();

        let results = engine
            .price_batch_with_quotes("two", 0, &[&usd, &eur], &spec, price, &scenarios)
            .unwrap();
        assert_eq!(results.len(), 10);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.scalar("usd"), Some(i as f64 + 1.0));
            assert_eq!(r.scalar("eur"), Some(i as f64 * 10.0));
        }
    }
}
