// vim: tw=80
//! Per-mock configuration.

use std::{fmt, sync::Arc};

use crate::{
    answers::{Answer, ReturnsDefaults},
    listener::StubbingLookupListener,
    stubbing::Strictness
};

/// Creation settings of one mock.
///
/// # Examples
/// ```
/// # use mockcore::*;
/// let settings = MockSettings::new()
///     .name("calculator")
///     .default_answer(answers::CallsRealMethods)
///     .lenient();
/// assert_eq!(settings.get_name(), Some("calculator"));
/// ```
#[derive(Clone)]
pub struct MockSettings {
    name: Option<String>,
    default_answer: Arc<dyn Answer>,
    stub_only: bool,
    strictness: Option<Strictness>,
    listeners: Vec<Arc<dyn StubbingLookupListener>>,
}

impl MockSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Answer used for calls that no stubbing matches.
    pub fn default_answer<A: Answer + 'static>(mut self, answer: A) -> Self {
        self.default_answer = Arc::new(answer);
        self
    }

    /// Keep only the most recent call instead of the full call history.
    /// Such a mock saves memory but cannot be verified.
    pub fn stub_only(mut self) -> Self {
        self.stub_only = true;
        self
    }

    /// Shorthand for `strictness(Strictness::Lenient)`.
    pub fn lenient(self) -> Self {
        self.strictness(Strictness::Lenient)
    }

    /// Strictness of stubbings that don't declare their own.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = Some(strictness);
        self
    }

    pub fn stubbing_lookup_listener<L>(mut self, listener: L) -> Self
        where L: StubbingLookupListener + 'static
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get_default_answer(&self) -> &Arc<dyn Answer> {
        &self.default_answer
    }

    pub fn is_stub_only(&self) -> bool {
        self.stub_only
    }

    pub fn get_strictness(&self) -> Option<Strictness> {
        self.strictness
    }

    pub fn stubbing_lookup_listeners(&self)
        -> &[Arc<dyn StubbingLookupListener>]
    {
        &self.listeners
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        MockSettings {
            name: None,
            default_answer: Arc::new(ReturnsDefaults),
            stub_only: false,
            strictness: None,
            listeners: Vec::new()
        }
    }
}

impl fmt::Debug for MockSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MockSettings")
            .field("name", &self.name)
            .field("stub_only", &self.stub_only)
            .field("strictness", &self.strictness)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
