//! Zero-rate OIS curve backed by quotes.

use pricer_core::types::{DayCount, Tenor};
use pricer_kernel::{Quote, QuoteSource, Traced};

use super::CurveKind;
use crate::error::{ModelError, ModelResult};

/// Zero-rate curve on tenor pillars.
///
/// Each pillar rate is a [`Quote`]. Outside recording the quotes carry
/// market rates and the curve prices directly; while a kernel is recorded
/// they carry placeholders and every discount factor becomes part of the
/// tape.
///
/// Zero rates are interpolated linearly in time between pillars and held
/// flat beyond the first and last pillar. Discount factors are
/// `DF(t) = exp(-z(t) * t)` with `t` measured in the index day count.
///
/// # Examples
///
/// ```
/// use pricer_models::curves::{CurveKind, OisCurve};
///
/// let curve = OisCurve::standard(CurveKind::Sofr, &[0.02; 10]).unwrap();
/// let df = curve.discount(1.0).concrete().unwrap();
/// assert!((df - (-0.02f64).exp()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct OisCurve {
    kind: CurveKind,
    tenors: Vec<Tenor>,
    /// Pillar times in the index day count, strictly increasing.
    times: Vec<f64>,
    quotes: Vec<Quote>,
}

impl OisCurve {
    /// Builds a curve from pillars and their zero rates.
    ///
    /// # Errors
    ///
    /// - `ModelError::EmptyCurve` if `tenors` is empty
    /// - `ModelError::QuoteCount` if `rates` has a different length
    /// - `ModelError::UnorderedPillars` if pillar times do not increase
    pub fn new(kind: CurveKind, tenors: Vec<Tenor>, rates: &[f64]) -> ModelResult<Self> {
        if tenors.is_empty() {
            return Err(ModelError::EmptyCurve(kind.to_string()));
        }
        if tenors.len() != rates.len() {
            return Err(ModelError::QuoteCount {
                curve: kind.to_string(),
                tenors: tenors.len(),
                rates: rates.len(),
            });
        }

        let day_count = kind.day_count();
        let times: Vec<f64> = tenors.iter().map(|t| t.year_fraction(day_count)).collect();
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ModelError::UnorderedPillars {
                curve: kind.to_string(),
                tenor: tenors[i + 1].to_string(),
            });
        }

        Ok(Self {
            kind,
            tenors,
            times,
            quotes: rates.iter().copied().map(Quote::new).collect(),
        })
    }

    /// Builds a curve on [`Tenor::STANDARD_PILLARS`] (1D through 30Y).
    ///
    /// # Errors
    ///
    /// `ModelError::QuoteCount` unless `rates` has ten entries.
    pub fn standard(kind: CurveKind, rates: &[f64]) -> ModelResult<Self> {
        Self::new(kind, Tenor::standard_pillars(), rates)
    }

    /// Index of the curve.
    #[inline]
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Day count used for pillar and payment times.
    #[inline]
    pub fn day_count(&self) -> DayCount {
        self.kind.day_count()
    }

    /// Pillar tenors.
    #[inline]
    pub fn tenors(&self) -> &[Tenor] {
        &self.tenors
    }

    /// Pillar times in years.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Concrete pillar rates, or `None` for pillars holding a placeholder.
    pub fn rates(&self) -> Vec<Option<f64>> {
        self.quotes.iter().map(Quote::value).collect()
    }

    /// Zero rate at time `t`.
    ///
    /// The bracketing search only looks at `t` and the pillar times, so it
    /// never compares a traced value. A NaN `t` gives a NaN rate.
    pub fn zero_rate(&self, t: f64) -> Traced {
        if t.is_nan() {
            return Traced::Concrete(f64::NAN);
        }
        let last = self.times.len() - 1;
        if t <= self.times[0] {
            return self.quotes[0].get();
        }
        if t >= self.times[last] {
            return self.quotes[last].get();
        }

        // First pillar strictly after t; exists because t < times[last].
        let hi = self.times.partition_point(|&p| p <= t);
        let lo = hi - 1;
        let (t0, t1) = (self.times[lo], self.times[hi]);
        let w = (t - t0) / (t1 - t0);
        self.quotes[lo].get() * (1.0 - w) + self.quotes[hi].get() * w
    }

    /// Discount factor `exp(-z(t) * t)`.
    pub fn discount(&self, t: f64) -> Traced {
        (-(self.zero_rate(t) * t)).exp()
    }
}

impl QuoteSource for OisCurve {
    fn name(&self) -> &str {
        self.kind.index_name()
    }

    fn quotes(&self) -> &[Quote] {
        &self.quotes
    }
}
