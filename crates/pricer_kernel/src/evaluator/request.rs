//! Output requests.

use crate::kernel::OutputHandle;

/// Set of outputs to compute in an evaluation.
///
/// Only tape nodes with a path to a requested output are replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRequest {
    handles: Vec<OutputHandle>,
}

impl OutputRequest {
    /// Request for the given handles.
    pub fn new(handles: Vec<OutputHandle>) -> Self {
        Self { handles }
    }

    /// Adds a handle.
    pub fn with(mut self, handle: OutputHandle) -> Self {
        self.handles.push(handle);
        self
    }

    /// Requested handles.
    pub fn handles(&self) -> &[OutputHandle] {
        &self.handles
    }

    /// Number of requested handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl FromIterator<OutputHandle> for OutputRequest {
    fn from_iter<I: IntoIterator<Item = OutputHandle>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<OutputHandle> for OutputRequest {
    fn from(handle: OutputHandle) -> Self {
        Self::new(vec![handle])
    }
}
