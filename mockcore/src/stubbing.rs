// vim: tw=80
//! Stub records: "when a call matches X, answer with Y".

use std::{
    collections::VecDeque,
    fmt,
    panic::Location,
    sync::{
        Arc,
        Weak,
        atomic::{AtomicUsize, Ordering}
    }
};

use parking_lot::Mutex;

use crate::{
    answers::Answer,
    binder::MatchableInvocation,
    invocation::Invocation
};

/// How strictly a stubbing treats calls with unexpected arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strictness {
    /// Calls to a stubbed method with other arguments are a usage error.
    Strict,
    /// Anything goes.
    Lenient,
    /// Like `Lenient`, but the mismatch is logged.
    Warn,
}

/// One stubbing declaration.
///
/// The answer list is never empty.  Answers are handed out in declaration
/// order, and the last one is reused once the others are used up.
pub struct Stubbing {
    key: MatchableInvocation,
    answers: Mutex<VecDeque<Arc<dyn Answer>>>,
    strictness: Option<Strictness>,
    usage: AtomicUsize,
}

impl Stubbing {
    pub(crate) fn new(
        key: MatchableInvocation,
        answer: Arc<dyn Answer>,
        strictness: Option<Strictness>) -> Self
    {
        let answers = Mutex::new(VecDeque::from([answer]));
        Stubbing{key, answers, strictness, usage: AtomicUsize::new(0)}
    }

    /// The matchable invocation this stubbing was declared with.
    pub fn invocation(&self) -> &MatchableInvocation {
        &self.key
    }

    pub fn strictness(&self) -> Option<Strictness> {
        self.strictness
    }

    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.key.matches(invocation)
    }

    /// Let the declaration's matchers capture the arguments of a call this
    /// stubbing answers.
    pub fn capture_arguments_from(&self, invocation: &Invocation) {
        self.key.capture_arguments_from(invocation);
    }

    /// How many calls this stubbing has answered.
    pub fn usage(&self) -> usize {
        self.usage.load(Ordering::Relaxed)
    }

    pub fn was_used(&self) -> bool {
        self.usage() > 0
    }

    /// Number of answers not yet consumed, including the sticky last one.
    pub fn remaining_answers(&self) -> usize {
        self.answers.lock().len()
    }

    pub(crate) fn add_answer(&self, answer: Arc<dyn Answer>) {
        self.answers.lock().push_back(answer);
    }

    /// Count one use and hand out the answer for it.
    pub(crate) fn consume(&self) -> Option<Arc<dyn Answer>> {
        self.usage.fetch_add(1, Ordering::Relaxed);
        let mut answers = self.answers.lock();
        if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().cloned()
        }
    }
}

impl fmt::Debug for Stubbing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Stubbing")
            .field("invocation", &self.key.to_string())
            .field("remaining_answers", &self.remaining_answers())
            .field("strictness", &self.strictness)
            .field("usage", &self.usage())
            .finish()
    }
}

impl fmt::Display for Stubbing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}", self.key, self.key.invocation().location())
    }
}

/// Back-reference from an invocation to the stubbing that answered it.
///
/// Used only by diagnostics.  It does not keep the stubbing alive.
#[derive(Clone, Debug)]
pub struct StubInfo {
    stubbed_at: &'static Location<'static>,
    stubbing: Weak<Stubbing>,
}

impl StubInfo {
    pub(crate) fn new(stubbing: &Arc<Stubbing>) -> Self {
        StubInfo {
            stubbed_at: stubbing.invocation().invocation().location(),
            stubbing: Arc::downgrade(stubbing)
        }
    }

    /// Where the answering stubbing was declared.
    pub fn stubbed_at(&self) -> &'static Location<'static> {
        self.stubbed_at
    }

    pub fn stubbing(&self) -> Option<Arc<Stubbing>> {
        self.stubbing.upgrade()
    }
}
