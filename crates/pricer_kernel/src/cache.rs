//! Kernel cache keyed by computation identity.
//!
//! Each key maps to at most one recorded [`Kernel`]. Lookups for present keys
//! take a read lock only. Recording for a key is serialized on a per-key
//! slot, so concurrent first callers record once and all observe the same
//! `Arc<Kernel>`; callers for other keys are not blocked by it.
//!
//! A failed recording leaves the key absent and the next caller retries.
//! [`KernelCache::clear`] keeps slots whose recording is still in flight, so
//! callers arriving after a clear wait for that recording instead of starting
//! a second one.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::RecordingError;
use crate::kernel::Kernel;
use crate::quote::QuoteSource;
use crate::recorder::InputShape;
use crate::tape::builder::is_recording;

/// Computation identity: name, input group sizes and a caller fingerprint.
///
/// Two calls with the same name but a different input structure or
/// fingerprint get different kernels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelKey {
    name: String,
    shape: Vec<usize>,
    fingerprint: u64,
}

impl KernelKey {
    /// Key for `name` over inputs of the given shape, with fingerprint 0.
    pub fn new(name: impl Into<String>, shape: &InputShape) -> Self {
        Self {
            name: name.into(),
            shape: shape.sizes(),
            fingerprint: 0,
        }
    }

    /// Key over the shape derived from quote sources.
    pub fn for_sources(name: impl Into<String>, sources: &[&dyn QuoteSource]) -> Self {
        Self::new(name, &InputShape::from_sources(sources))
    }

    /// Sets the caller fingerprint (e.g. a hash of the portfolio terms).
    pub fn with_fingerprint(mut self, fingerprint: u64) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Computation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input group sizes.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Caller fingerprint.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}#{:016x}", self.name, self.shape, self.fingerprint)
    }
}

/// Per-key entry. `recording` serializes recorders; `kernel` is set once.
#[derive(Default)]
struct KernelSlot {
    recording: Mutex<()>,
    kernel: OnceLock<Arc<Kernel>>,
}

type Slot = Arc<KernelSlot>;

/// Thread-safe map from [`KernelKey`] to its recorded kernel.
///
/// Entries are never evicted; [`KernelCache::clear`] drops every recorded
/// one.
///
/// # Examples
///
/// ```
/// use pricer_kernel::{record, InputShape, KernelCache, KernelKey, OutputSpec, Outputs};
///
/// let cache = KernelCache::new();
/// let shape = InputShape::new().group("x", 1);
/// let key = KernelKey::new("double", &shape);
///
/// let record_double = || {
///     record("double", &shape, &OutputSpec::single("y"), |inputs| {
///         Ok(Outputs::single("y", inputs.group(0)[0] * 2.0))
///     })
/// };
///
/// let first = cache.get_or_record(&key, record_double).unwrap();
/// let second = cache.get_or_record(&key, || unreachable!()).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.recordings(), 1);
/// ```
#[derive(Default)]
pub struct KernelCache {
    entries: RwLock<HashMap<KernelKey, Slot>>,
    recordings: AtomicUsize,
}

impl KernelCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the kernel for `key`, recording it with `recorder` if absent.
    ///
    /// `recorder` runs at most once per successful key, and never when the
    /// key is present.
    ///
    /// # Errors
    ///
    /// - `RecordingError::Reentrant` when called from inside a recording
    /// - `RecordingError::ShapeMismatch` if the recorded kernel's input
    ///   shape differs from the key's
    /// - any error returned by `recorder`
    ///
    /// The entry stays absent on error.
    pub fn get_or_record<F>(&self, key: &KernelKey, recorder: F) -> Result<Arc<Kernel>, RecordingError>
    where
        F: FnOnce() -> Result<Kernel, RecordingError>,
    {
        // Waiting on a slot while this thread holds a recording context could
        // wait on ourselves.
        if is_recording() {
            return Err(RecordingError::Reentrant {
                kernel: key.name.clone(),
            });
        }

        let slot = self.slot(key);
        if let Some(kernel) = slot.kernel.get() {
            debug!(key = %key, "Kernel cache hit");
            return Ok(Arc::clone(kernel));
        }

        let guard = slot.recording.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(kernel) = slot.kernel.get() {
            debug!(key = %key, "Kernel cache hit after waiting on recording");
            return Ok(Arc::clone(kernel));
        }

        let start = Instant::now();
        let recorded = recorder().and_then(|kernel| {
            let actual = kernel.input_shape();
            if actual == key.shape {
                Ok(kernel)
            } else {
                Err(RecordingError::ShapeMismatch {
                    kernel: key.name.clone(),
                    expected: key.shape.clone(),
                    actual,
                })
            }
        });
        let kernel = match recorded {
            Ok(kernel) => Arc::new(kernel),
            Err(err) => {
                warn!(key = %key, error = %err, "Kernel recording failed");
                drop(guard);
                self.discard_empty(key, slot);
                return Err(err);
            }
        };

        // Only the holder of `recording` sets the kernel.
        let kernel = Arc::clone(slot.kernel.get_or_init(|| kernel));
        drop(guard);
        self.recordings.fetch_add(1, Ordering::Relaxed);
        info!(
            key = %key,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Kernel cached"
        );
        Ok(kernel)
    }

    /// The kernel for `key`, if recorded.
    pub fn get(&self, key: &KernelKey) -> Option<Arc<Kernel>> {
        let slot = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.get(key)?)
        };
        if let Some(kernel) = slot.kernel.get() {
            return Some(Arc::clone(kernel));
        }
        // Blocks while a recording for this key is in progress.
        let _guard = slot.recording.lock().unwrap_or_else(PoisonError::into_inner);
        slot.kernel.get().cloned()
    }

    /// Whether `key` has a recorded kernel.
    pub fn contains(&self, key: &KernelKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of recorded kernels.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|slot| slot.kernel.get().is_some())
            .count()
    }

    /// Whether no kernel is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful recordings since creation.
    pub fn recordings(&self) -> usize {
        self.recordings.load(Ordering::Relaxed)
    }

    /// Drops every recorded entry. Kernels still held by callers stay valid.
    ///
    /// Slots without a kernel belong to a recording in flight and are kept,
    /// so a caller arriving after the clear waits for that recording.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, slot| slot.kernel.get().is_none());
    }

    /// Removes the empty slot of a failed recording unless another caller
    /// is waiting on it.
    fn discard_empty(&self, key: &KernelKey, slot: Slot) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let unshared = entries.get(key).is_some_and(|current| {
            // Clones are only taken under the map lock: the map and `slot`
            // are the only holders when nobody else is waiting.
            Arc::ptr_eq(current, &slot) && Arc::strong_count(&slot) == 2
        });
        if unshared && slot.kernel.get().is_none() {
            entries.remove(key);
        }
    }

    fn slot(&self, key: &KernelKey) -> Slot {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = entries.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key.clone()).or_default())
    }
}

impl fmt::Debug for KernelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelCache")
            .field("len", &self.len())
            .field("recordings", &self.recordings())
            .finish()
    }
}
