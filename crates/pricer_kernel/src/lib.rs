//! # Pricer Kernel (L3: Record-Once Engine)
//!
//! Traces a pure numeric function once into an immutable [`Kernel`] and
//! replays it against many sets of concrete inputs, optionally in parallel.
//!
//! ## Layer 3 Role
//!
//! pricer_kernel is model-agnostic: it implements no pricing model. Layer 2
//! (`pricer_models`) writes pricing functions against [`Traced`] values and
//! [`Quote`]s; this crate turns them into kernels and evaluates them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            pricer_kernel (L3)           │
//! ├─────────────────────────────────────────┤
//! │  traced/    - Traced values, placeholders│
//! │  tape/      - Recorded ops, builder     │
//! │  recorder/  - record, record_with_quotes│
//! │  kernel/    - Sealed kernels, stats     │
//! │  cache/     - KernelKey → Arc<Kernel>   │
//! │  evaluator/ - Bindings, replay, rayon   │
//! │  engine/    - Cache + evaluator facade  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Recording Rules
//!
//! - Arithmetic on concrete values is computed immediately; arithmetic on
//!   placeholder-derived values is recorded.
//! - Comparing a placeholder-derived value fails the recording: the tape
//!   has no control flow.
//! - Outputs are declared up front and have a fixed shape.
//!
//! ## Example
//!
//! ```rust
//! use pricer_kernel::{
//!     record, Evaluator, EvaluatorConfig, InputShape, KernelCache, KernelKey, OutputSpec,
//!     Outputs, Traced,
//! };
//!
//! let shape = InputShape::new().group("rates", 10);
//! let cache = KernelCache::new();
//! let kernel = cache
//!     .get_or_record(&KernelKey::new("sum", &shape), || {
//!         record("sum", &shape, &OutputSpec::single("total"), |inputs| {
//!             Ok(Outputs::single("total", inputs.group(0).iter().sum::<Traced>()))
//!         })
//!     })
//!     .unwrap();
//!
//! let evaluator = Evaluator::new(EvaluatorConfig::default()).unwrap();
//! let bindings = kernel.bindings(&[vec![0.0; 10]]).unwrap();
//! let results = evaluator.evaluate(&kernel, &kernel.request_all(), &bindings).unwrap();
//! assert_eq!(results.scalar("total"), Some(0.0));
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod kernel;
pub mod quote;
pub mod recorder;
pub mod tape;
pub mod traced;

pub use cache::{KernelCache, KernelKey};
pub use engine::Engine;
pub use error::{BindingError, ConfigError, KernelError, RecordingError, ReplayError, Result};
pub use evaluator::{
    Evaluator, EvaluatorConfig, EvaluatorConfigBuilder, InputBindings, OutputRequest, OutputValue,
    ResultMap,
};
pub use kernel::{InputGroup, Kernel, KernelStats, OutputHandle};
pub use quote::{Quote, QuoteSource};
pub use recorder::{
    record, record_with_quotes, InputGroupSpec, InputShape, OutputSpec, Outputs, TracedInputs,
    TracedOutput,
};
pub use tape::{BinaryOp, Op, Tape, UnaryOp};
pub use traced::{KernelId, Placeholder, Traced};
