// vim: tw=80
//! Per-thread mocking session.
//!
//! Declarations such as "the next call is being stubbed", "the next call is
//! being verified" or "these matchers apply to the next call" belong to the
//! thread that made them.  A [`Session`] holds that state.  Each thread has
//! its own, created lazily on first use and reachable through
//! [`Session::with_current`].

use std::{
    cell::RefCell,
    fmt,
    mem,
    panic::Location,
    sync::atomic::{AtomicU64, Ordering}
};

use tracing::debug;

use crate::{
    error::UsageError,
    matchers::LocalizedMatcher,
    ongoing::OngoingStubbing,
    verification::MockAwareVerificationMode
};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Next value of the process-wide invocation counter.
pub(crate) fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

thread_local! {
    static CURRENT: Session = Session::new();
}

#[derive(Default)]
struct State {
    stubbing_in_progress: Option<&'static Location<'static>>,
    verification: Option<MockAwareVerificationMode>,
    ongoing: Option<OngoingStubbing>,
    matchers: Vec<LocalizedMatcher>,
}

/// Declaration state of one thread.
///
/// A pending verification and a stubbing in progress never coexist: starting
/// either one first validates that nothing else is pending.
///
/// No borrow of the state is ever held across a call into user code, so a
/// mock may be called re-entrantly from inside an answer.
#[derive(Default)]
pub struct Session {
    state: RefCell<State>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the calling thread's session.
    pub fn with_current<R, F: FnOnce(&Session) -> R>(f: F) -> R {
        CURRENT.with(f)
    }

    /// A `when(..)` style declaration started at `at`.
    pub fn stubbing_started(&self, at: &'static Location<'static>)
        -> Result<(), UsageError>
    {
        self.validate_state()?;
        self.state.borrow_mut().stubbing_in_progress = Some(at);
        Ok(())
    }

    pub fn stubbing_completed(&self) {
        self.state.borrow_mut().stubbing_in_progress = None;
    }

    /// Publish the most recent call on this thread, so a following
    /// `when(..)` can stub it.
    pub fn report_ongoing_stubbing(&self, ongoing: OngoingStubbing) {
        self.state.borrow_mut().ongoing = Some(ongoing);
    }

    pub fn pull_ongoing_stubbing(&self) -> Option<OngoingStubbing> {
        self.state.borrow_mut().ongoing.take()
    }

    pub fn reset_ongoing_stubbing(&self) {
        self.state.borrow_mut().ongoing = None;
    }

    /// A `verify(..)` declaration: the next call on `mode`'s mock will be
    /// checked instead of executed.
    pub fn verification_started(&self, mode: MockAwareVerificationMode)
        -> Result<(), UsageError>
    {
        self.validate_state()?;
        self.reset_ongoing_stubbing();
        self.state.borrow_mut().verification = Some(mode);
        Ok(())
    }

    /// Put back a verification that was pulled by a call on some other mock.
    pub fn restore_verification(&self, mode: MockAwareVerificationMode) {
        debug!(at = %mode.location(), "verification pushed back");
        self.state.borrow_mut().verification = Some(mode);
    }

    pub fn pull_verification_mode(&self) -> Option<MockAwareVerificationMode> {
        self.state.borrow_mut().verification.take()
    }

    pub fn report_matcher(&self, matcher: LocalizedMatcher) {
        self.state.borrow_mut().matchers.push(matcher);
    }

    /// Take every pending matcher, leaving none.
    pub fn pull_matchers(&self) -> Vec<LocalizedMatcher> {
        mem::take(&mut self.state.borrow_mut().matchers)
    }

    /// Fail if a declaration was left incomplete.
    ///
    /// The offending state is cleared on the way out, so one mistake is
    /// reported once.
    pub fn validate_state(&self) -> Result<(), UsageError> {
        let mut state = self.state.borrow_mut();
        if let Some(mode) = state.verification.take() {
            return Err(UsageError::UnfinishedVerification {
                at: mode.location()
            });
        }
        if !state.matchers.is_empty() {
            let at = state.matchers.drain(..)
                .map(|m| m.location())
                .collect();
            return Err(UsageError::MisplacedMatchers{at});
        }
        if let Some(at) = state.stubbing_in_progress.take() {
            return Err(UsageError::UnfinishedStubbing{at});
        }
        Ok(())
    }

    /// Forget everything declared on this session.
    pub fn reset(&self) {
        *self.state.borrow_mut() = State::default();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Session")
            .field("stubbing_in_progress", &state.stubbing_in_progress)
            .field("verification", &state.verification.is_some())
            .field("ongoing", &state.ongoing.is_some())
            .field("matchers", &state.matchers)
            .finish()
    }
}

/// Unit tests for `Session`.
#[cfg(test)]
mod t {
    use std::sync::Arc;

    use super::*;
    use crate::{
        invocation::MockRef,
        matchers::Anything,
        registry::Registry,
        settings::MockSettings,
        verification::times
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn unfinished_stubbing_is_reported_once() {
        let s = Session::new();
        let here = Location::caller();
        s.stubbing_started(here).unwrap();
        assert_eq!(s.validate_state(),
                   Err(UsageError::UnfinishedStubbing{at: here}));
        s.validate_state().unwrap();
    }

    #[test]
    fn stubbing_completed() {
        let s = Session::new();
        s.stubbing_started(Location::caller()).unwrap();
        s.stubbing_completed();
        s.validate_state().unwrap();
    }

    #[test]
    fn second_stubbing_while_first_unfinished() {
        let s = Session::new();
        let first = Location::caller();
        s.stubbing_started(first).unwrap();
        assert_eq!(s.stubbing_started(Location::caller()),
                   Err(UsageError::UnfinishedStubbing{at: first}));
    }

    #[test]
    fn misplaced_matchers() {
        let s = Session::new();
        let m = LocalizedMatcher::new(Anything);
        let at = m.location();
        s.report_matcher(m);
        assert_eq!(s.validate_state(),
                   Err(UsageError::MisplacedMatchers{at: vec![at]}));
        assert!(s.pull_matchers().is_empty());
    }

    #[test]
    fn verification_and_stubbing_are_exclusive() {
        let s = Session::new();
        let mode = MockAwareVerificationMode::new(MockRef::detached(),
                                                  times(1));
        s.verification_started(mode).unwrap();
        assert!(matches!(s.stubbing_started(Location::caller()),
                         Err(UsageError::UnfinishedVerification{..})));

        s.stubbing_started(Location::caller()).unwrap();
        let mode = MockAwareVerificationMode::new(MockRef::detached(),
                                                  times(1));
        assert!(matches!(s.verification_started(mode),
                         Err(UsageError::UnfinishedStubbing{..})));
    }

    #[test]
    fn verification_forgets_ongoing_stubbing() {
        let s = Session::new();
        let registry = Arc::new(Registry::new(&MockSettings::default()));
        s.report_ongoing_stubbing(OngoingStubbing::new(registry.clone()));
        let mode = MockAwareVerificationMode::new(MockRef::detached(),
                                                  times(1));
        s.verification_started(mode).unwrap();
        assert!(s.pull_ongoing_stubbing().is_none());

        s.report_ongoing_stubbing(OngoingStubbing::new(registry));
        s.reset_ongoing_stubbing();
        assert!(s.pull_ongoing_stubbing().is_none());
    }

    #[test]
    fn pull_verification_clears_it() {
        let s = Session::new();
        let mode = MockAwareVerificationMode::new(MockRef::detached(),
                                                  times(1));
        s.verification_started(mode).unwrap();
        assert!(s.pull_verification_mode().is_some());
        assert!(s.pull_verification_mode().is_none());
        s.validate_state().unwrap();
    }

    #[test]
    fn sessions_are_per_thread() {
        Session::with_current(|s| {
            s.stubbing_started(Location::caller()).unwrap()
        });
        std::thread::spawn(|| {
            Session::with_current(|s| s.validate_state().unwrap());
        }).join().unwrap();
        Session::with_current(|s| {
            assert!(s.validate_state().is_err());
        });
    }
}
