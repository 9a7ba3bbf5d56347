//! Mutable market quotes read by traced functions.
//!
//! A [`Quote`] holds a [`Traced`] value. Outside recording it carries a
//! concrete market value; for the duration of a recording it carries the
//! placeholder of its input slot. Replay never reads quotes.

use std::cell::Cell;

use crate::error::BindingError;
use crate::traced::Traced;

/// Value cell for a single market quote.
#[derive(Debug, Clone, Default)]
pub struct Quote {
    value: Cell<Traced>,
}

impl Quote {
    /// Creates a quote with a concrete value.
    pub fn new(value: f64) -> Self {
        Self {
            value: Cell::new(Traced::Concrete(value)),
        }
    }

    /// Current value, concrete or symbolic.
    #[inline]
    pub fn get(&self) -> Traced {
        self.value.get()
    }

    /// Replaces the current value.
    #[inline]
    pub fn set(&self, value: impl Into<Traced>) {
        self.value.set(value.into());
    }

    /// Concrete value, or `None` while a placeholder is installed.
    ///
    /// Reading a quote this way during a recording poisons it; see
    /// [`Traced::concrete`].
    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.value.get().concrete()
    }
}

impl From<f64> for Quote {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// An object exposing an ordered set of quotes.
///
/// Recording with quote sources creates one input group per source, one
/// placeholder per quote, in the order returned by [`QuoteSource::quotes`].
pub trait QuoteSource {
    /// Name used for the input group.
    fn name(&self) -> &str;

    /// Quotes in input order.
    fn quotes(&self) -> &[Quote];

    /// Number of quotes.
    fn quote_count(&self) -> usize {
        self.quotes().len()
    }

    /// Sets the quote at `index`.
    ///
    /// # Errors
    ///
    /// `BindingError::QuoteIndex` if `index` is out of range.
    fn set_quote(&self, index: usize, value: f64) -> Result<(), BindingError> {
        let quotes = self.quotes();
        let quote = quotes.get(index).ok_or_else(|| BindingError::QuoteIndex {
            source_name: self.name().to_string(),
            index,
            len: quotes.len(),
        })?;
        quote.set(value);
        Ok(())
    }

    /// Sets all quotes from `values`.
    ///
    /// # Errors
    ///
    /// `BindingError::GroupLength` if `values` does not have one value per
    /// quote. No quote is modified in that case.
    fn set_quotes(&self, values: &[f64]) -> Result<(), BindingError> {
        let quotes = self.quotes();
        if values.len() != quotes.len() {
            return Err(BindingError::GroupLength {
                group: self.name().to_string(),
                expected: quotes.len(),
                actual: values.len(),
            });
        }
        for (quote, &value) in quotes.iter().zip(values) {
            quote.set(value);
        }
        Ok(())
    }
}
