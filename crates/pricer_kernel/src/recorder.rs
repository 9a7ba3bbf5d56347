//! Tape recorder: traces a function once and seals the result into a
//! [`Kernel`].
//!
//! # Recording Flow
//!
//! 1. Validate the declared [`OutputSpec`]
//! 2. Install a thread-local recording context
//! 3. Allocate one placeholder per declared input, grouped by [`InputShape`]
//! 4. Run the traced function exactly once, catching panics
//! 5. Check declared outputs against produced outputs, record concrete
//!    outputs as constants, and seal tape, groups and outputs
//!
//! The recording context is removed when the call returns, also on error or
//! panic, so no state leaks into the next recording on the thread.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, info, info_span};

use crate::error::RecordingError;
use crate::kernel::{InputGroup, Kernel, OutputSlot};
use crate::quote::{Quote, QuoteSource};
use crate::tape::builder::RecordingScope;
use crate::traced::{KernelId, Traced};

// ============================================================================
// Input shape
// ============================================================================

/// Name and size of one input group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputGroupSpec {
    name: String,
    len: usize,
}

impl InputGroupSpec {
    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of scalar inputs in the group.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the group declares no inputs.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Structural description of a kernel's inputs: ordered named groups of
/// scalar placeholders.
///
/// # Examples
///
/// ```
/// use pricer_kernel::InputShape;
///
/// let shape = InputShape::new().group("usd", 10).group("eur", 10);
/// assert_eq!(shape.sizes(), vec![10, 10]);
/// assert_eq!(shape.input_count(), 20);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InputShape {
    groups: Vec<InputGroupSpec>,
}

impl InputShape {
    /// Creates an empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a group of `len` scalar inputs.
    pub fn group(mut self, name: impl Into<String>, len: usize) -> Self {
        self.groups.push(InputGroupSpec {
            name: name.into(),
            len,
        });
        self
    }

    /// One group per quote source, one input per quote.
    pub fn from_sources(sources: &[&dyn QuoteSource]) -> Self {
        sources.iter().fold(Self::new(), |shape, source| {
            shape.group(source.name(), source.quote_count())
        })
    }

    /// Declared groups in order.
    pub fn groups(&self) -> &[InputGroupSpec] {
        &self.groups
    }

    /// Group sizes in order.
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.len).collect()
    }

    /// Total number of scalar inputs.
    pub fn input_count(&self) -> usize {
        self.groups.iter().map(|g| g.len).sum()
    }
}

/// Input values handed to the traced function, one slice per group.
#[derive(Debug)]
pub struct TracedInputs {
    names: Vec<String>,
    groups: Vec<Vec<Traced>>,
}

impl TracedInputs {
    /// Values of group `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared group.
    pub fn group(&self, index: usize) -> &[Traced] {
        &self.groups[index]
    }

    /// Values of the group called `name`.
    pub fn group_named(&self, name: &str) -> Option<&[Traced]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.groups[i].as_slice())
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no groups were declared.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// Declared output keyspace of a kernel.
///
/// Names are kept in declaration order; the kernel's output handles follow
/// the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    names: Vec<String>,
}

impl OutputSpec {
    /// Declares the given output names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Declares one output.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
        }
    }

    /// Declared names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn validate(&self, kernel: &str) -> Result<(), RecordingError> {
        if self.names.is_empty() {
            return Err(RecordingError::EmptyOutputSpec {
                kernel: kernel.to_string(),
            });
        }
        let mut seen = HashSet::with_capacity(self.names.len());
        for name in &self.names {
            if !seen.insert(name.as_str()) {
                return Err(RecordingError::DuplicateOutput {
                    kernel: kernel.to_string(),
                    output: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// One output value produced by a traced function.
#[derive(Debug, Clone)]
pub enum TracedOutput {
    /// Single value
    Scalar(Traced),
    /// Ordered values
    Vector(Vec<Traced>),
}

impl From<Traced> for TracedOutput {
    fn from(value: Traced) -> Self {
        TracedOutput::Scalar(value)
    }
}

impl From<f64> for TracedOutput {
    fn from(value: f64) -> Self {
        TracedOutput::Scalar(Traced::Concrete(value))
    }
}

impl From<Vec<Traced>> for TracedOutput {
    fn from(values: Vec<Traced>) -> Self {
        TracedOutput::Vector(values)
    }
}

/// Output map returned by a traced function.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    entries: Vec<(String, TracedOutput)>,
}

impl Outputs {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with a single scalar output.
    pub fn single(name: impl Into<String>, value: impl Into<TracedOutput>) -> Self {
        Self::new().with(name, value)
    }

    /// Builder form of [`Outputs::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TracedOutput>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets an output, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TracedOutput>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Adds `value` to the scalar output `name`, creating it at zero first.
    ///
    /// A vector output under the same name is replaced.
    pub fn accumulate(&mut self, name: &str, value: Traced) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, TracedOutput::Scalar(acc))) => *acc += value,
            Some((_, slot)) => *slot = TracedOutput::Scalar(value),
            None => self
                .entries
                .push((name.to_string(), TracedOutput::Scalar(value))),
        }
    }

    /// Output called `name`.
    pub fn get(&self, name: &str) -> Option<&TracedOutput> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of outputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take(&mut self, name: &str) -> Option<TracedOutput> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.swap_remove(index).1)
    }
}

// ============================================================================
// Recording
// ============================================================================

/// Traces `traced_fn` once and seals the result into a [`Kernel`].
///
/// # Arguments
///
/// * `name` - Kernel name, used in logs and errors
/// * `shape` - Input groups; one placeholder is allocated per scalar
/// * `spec` - Declared outputs
/// * `traced_fn` - Function of the placeholder values
///
/// # Errors
///
/// Any [`RecordingError`]. A violation detected during tracing (branch on a
/// placeholder, foreign value) takes precedence over the function's own
/// result.
///
/// # Examples
///
/// ```
/// use pricer_kernel::{record, InputShape, OutputSpec, Outputs, Traced};
///
/// let kernel = record(
///     "sum",
///     &InputShape::new().group("x", 10),
///     &OutputSpec::single("total"),
///     |inputs| Ok(Outputs::single("total", inputs.group(0).iter().sum::<Traced>())),
/// )
/// .unwrap();
///
/// assert_eq!(kernel.input_count(), 10);
/// assert_eq!(kernel.output_names().len(), 1);
/// ```
pub fn record<F>(
    name: &str,
    shape: &InputShape,
    spec: &OutputSpec,
    traced_fn: F,
) -> Result<Kernel, RecordingError>
where
    F: FnOnce(&TracedInputs) -> Result<Outputs, RecordingError>,
{
    let _span = info_span!("record", kernel = name).entered();
    let start = Instant::now();

    spec.validate(name)?;

    let id = KernelId::next();
    let scope = RecordingScope::begin(id, name)?;

    let mut groups = Vec::with_capacity(shape.groups().len());
    let mut traced = Vec::with_capacity(shape.groups().len());
    {
        let mut builder = scope.builder();
        for group in shape.groups() {
            let (placeholders, values): (Vec<_>, Vec<_>) =
                (0..group.len()).map(|_| builder.push_input()).unzip();
            groups.push(InputGroup::new(group.name(), placeholders));
            traced.push(values);
        }
    }
    let inputs = TracedInputs {
        names: shape.groups().iter().map(|g| g.name().to_string()).collect(),
        groups: traced,
    };

    let result = catch_unwind(AssertUnwindSafe(|| traced_fn(&inputs)));

    if let Some(violation) = scope.builder().take_violation() {
        return Err(violation);
    }
    let mut produced = match result {
        Ok(Ok(outputs)) => outputs,
        Ok(Err(err)) => return Err(err.in_kernel(name)),
        Err(payload) => {
            return Err(RecordingError::Panicked {
                kernel: name.to_string(),
                message: panic_message(payload.as_ref()),
            })
        }
    };

    let mut slots = Vec::with_capacity(spec.names().len());
    {
        let mut builder = scope.builder();
        for output in spec.names() {
            let value = produced
                .take(output)
                .ok_or_else(|| RecordingError::MissingOutput {
                    kernel: name.to_string(),
                    output: output.clone(),
                })?;
            let slot = match value {
                TracedOutput::Scalar(v) => OutputSlot::scalar(output, builder.operand(v)),
                TracedOutput::Vector(vs) => OutputSlot::vector(
                    output,
                    vs.into_iter().map(|v| builder.operand(v)).collect(),
                ),
            };
            slots.push(slot);
        }
        if let Some((extra, _)) = produced.entries.first() {
            return Err(RecordingError::UndeclaredOutput {
                kernel: name.to_string(),
                output: extra.clone(),
            });
        }
        if let Some(violation) = builder.take_violation() {
            return Err(violation);
        }
    }

    let tape = scope.builder().take_tape();
    drop(scope);

    let kernel = Kernel::new(id, name, tape, groups, slots);
    let stats = kernel.stats();
    info!(
        kernel = name,
        operations = stats.operations,
        inputs = stats.inputs,
        outputs = stats.outputs,
        elapsed_us = start.elapsed().as_micros() as u64,
        "Recorded kernel"
    );
    debug!(
        kernel = name,
        constants = stats.constants,
        passive = stats.passive,
        dead = stats.dead,
        "Kernel node statistics"
    );
    Ok(kernel)
}

/// Restores previous quote values when dropped.
struct QuoteRestore<'a> {
    saved: Vec<(&'a Quote, Traced)>,
}

impl Drop for QuoteRestore<'_> {
    fn drop(&mut self) {
        for (quote, value) in self.saved.drain(..) {
            quote.set(value);
        }
    }
}

/// Records a function that reads its inputs through quote sources.
///
/// The input shape is derived from `sources`: one group per source, named
/// after it, one placeholder per quote. The placeholders are installed into
/// the quotes for the duration of the trace; previous quote values are
/// restored afterwards, including when the trace fails.
///
/// # Errors
///
/// As for [`record`].
pub fn record_with_quotes<F>(
    name: &str,
    sources: &[&dyn QuoteSource],
    spec: &OutputSpec,
    traced_fn: F,
) -> Result<Kernel, RecordingError>
where
    F: FnOnce() -> Result<Outputs, RecordingError>,
{
    let shape = InputShape::from_sources(sources);
    record(name, &shape, spec, |inputs| {
        let mut restore = QuoteRestore {
            saved: Vec::with_capacity(shape.input_count()),
        };
        for (group, source) in sources.iter().enumerate() {
            for (quote, &value) in source.quotes().iter().zip(inputs.group(group)) {
                restore.saved.push((quote, quote.get()));
                quote.set(value);
            }
        }
        traced_fn()
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
