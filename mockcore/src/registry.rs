// vim: tw=80
//! Per-mock storage of stubbings and recorded calls.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    panic::Location,
    sync::Arc,
    thread::{self, ThreadId}
};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    answers::Answer,
    binder::MatchableInvocation,
    error::UsageError,
    invocation::Invocation,
    settings::MockSettings,
    stubbing::{Strictness, StubInfo, Stubbing}
};

/// Recorded calls.  Stub-only mocks keep just the latest one.
enum History {
    All(Vec<Arc<Invocation>>),
    Latest(Option<Arc<Invocation>>),
}

impl History {
    fn new(stub_only: bool) -> Self {
        if stub_only {
            History::Latest(None)
        } else {
            History::All(Vec::new())
        }
    }

    fn push(&mut self, invocation: Arc<Invocation>) {
        match self {
            History::All(v) => v.push(invocation),
            History::Latest(l) => *l = Some(invocation)
        }
    }

    /// Forget the most recent record of `invocation`.
    fn remove(&mut self, invocation: &Arc<Invocation>) {
        match self {
            History::All(v) => {
                if let Some(i) = v.iter().rposition(|x| Arc::ptr_eq(x, invocation))
                {
                    v.remove(i);
                }
            },
            History::Latest(l) => {
                if l.as_ref().map_or(false, |x| Arc::ptr_eq(x, invocation)) {
                    *l = None;
                }
            }
        }
    }

    fn to_vec(&self) -> Vec<Arc<Invocation>> {
        match self {
            History::All(v) => v.clone(),
            History::Latest(l) => l.iter().cloned().collect()
        }
    }

    fn clear(&mut self) {
        match self {
            History::All(v) => v.clear(),
            History::Latest(l) => *l = None
        }
    }
}

/// Answers registered ahead of the call they will stub, `do_answer` style.
struct Staged {
    answers: Vec<Arc<dyn Answer>>,
    strictness: Option<Strictness>,
    at: &'static Location<'static>,
}

/// A stubbing that matched a call, and the answer it handed out.
pub struct StubbedAnswer {
    pub stubbing: Arc<Stubbing>,
    pub answer: Arc<dyn Answer>,
}

/// Stubbings and call history of one mock.
///
/// Stubbings are kept newest first, so the last declaration that matches a
/// call wins.  Each thread has its own stubbing candidate: the latest call
/// it made on this mock, which the next `then_*` on that thread turns into
/// a stubbing.
///
/// Every method takes `&self` and may be used from several threads at once.
/// No lock is held while an answer runs.
pub struct Registry {
    stubbed: Mutex<VecDeque<Arc<Stubbing>>>,
    history: Mutex<History>,
    candidates: Mutex<HashMap<ThreadId, MatchableInvocation>>,
    staged: Mutex<Option<Staged>>,
    mock_strictness: Option<Strictness>,
}

impl Registry {
    pub fn new(settings: &MockSettings) -> Self {
        Registry {
            stubbed: Mutex::new(VecDeque::new()),
            history: Mutex::new(History::new(settings.is_stub_only())),
            candidates: Mutex::new(HashMap::new()),
            staged: Mutex::new(None),
            mock_strictness: settings.get_strictness()
        }
    }

    /// Record a call, and make it this thread's stubbing candidate.
    pub fn register_for_potential_stubbing(&self, invocation: MatchableInvocation)
    {
        self.history.lock().push(invocation.invocation().clone());
        self.reset_candidate(invocation);
    }

    /// Make `invocation` this thread's stubbing candidate without recording
    /// it.
    pub fn reset_candidate(&self, invocation: MatchableInvocation) {
        self.candidates.lock().insert(thread::current().id(), invocation);
    }

    /// This thread's stubbing candidate, if it has one.
    pub fn invocation_for_stubbing(&self) -> Option<MatchableInvocation> {
        self.candidates.lock().get(&thread::current().id()).cloned()
    }

    /// Turn this thread's candidate into a stubbing.
    ///
    /// The candidate call is dropped from the history first: it was made to
    /// declare the stubbing, not by the code under test.  The thread has no
    /// candidate afterwards.
    ///
    /// With `consecutive`, `answer` is instead appended to the newest
    /// stubbing declared from this thread's candidate, or else to the
    /// newest stubbing of all.  Prefer [`chain_answer`](Self::chain_answer)
    /// when the stubbing is at hand.
    pub fn add_answer(
        &self,
        answer: Arc<dyn Answer>,
        consecutive: bool,
        strictness: Option<Strictness>) -> Result<Arc<Stubbing>, UsageError>
    {
        if consecutive {
            let candidate = self.invocation_for_stubbing();
            let stubbing = {
                let stubbed = self.stubbed.lock();
                candidate.as_ref()
                    .and_then(|c| stubbed.iter()
                        .find(|s| Arc::ptr_eq(s.invocation().invocation(),
                                              c.invocation())))
                    .or_else(|| stubbed.front())
                    .cloned()
                    .ok_or(UsageError::NothingToChain)?
            };
            self.chain_answer(&stubbing, answer)?;
            return Ok(stubbing);
        }
        let candidate = self.invocation_for_stubbing()
            .ok_or(UsageError::NoCandidate)?;
        answer.validate_for(candidate.invocation())?;
        self.candidates.lock().remove(&thread::current().id());
        self.history.lock().remove(candidate.invocation());
        Ok(self.insert_stubbing(candidate, answer, strictness))
    }

    /// Append `answer` to `stubbing`, which must belong to this mock.
    pub fn chain_answer(
        &self,
        stubbing: &Arc<Stubbing>,
        answer: Arc<dyn Answer>) -> Result<(), UsageError>
    {
        answer.validate_for(stubbing.invocation().invocation())?;
        let _stubbed = self.stubbed.lock();
        stubbing.add_answer(answer);
        trace!(stubbing = %stubbing, "chained answer");
        Ok(())
    }

    fn insert_stubbing(
        &self,
        key: MatchableInvocation,
        answer: Arc<dyn Answer>,
        strictness: Option<Strictness>) -> Arc<Stubbing>
    {
        let strictness = strictness.or(self.mock_strictness);
        let stubbing = Arc::new(Stubbing::new(key, answer, strictness));
        debug!(stubbing = %stubbing, "added stubbing");
        self.stubbed.lock().push_front(stubbing.clone());
        stubbing
    }

    /// Find the newest stubbing matching `invocation` and take one answer
    /// from it.  The invocation is marked as stubbed by it.
    pub fn find_answer(&self, invocation: &Invocation) -> Option<StubbedAnswer> {
        let stubbed = self.stubbed.lock();
        let stubbing = stubbed.iter().find(|s| s.matches(invocation))?;
        let answer = stubbing.consume()?;
        invocation.mark_stubbed(StubInfo::new(stubbing));
        Some(StubbedAnswer{stubbing: stubbing.clone(), answer})
    }

    /// Stage answers for the next call on this mock, which will be
    /// stubbed with them instead of executed.
    pub fn set_staged_answers(
        &self,
        answers: Vec<Arc<dyn Answer>>,
        strictness: Option<Strictness>,
        at: &'static Location<'static>) -> Result<(), UsageError>
    {
        let mut staged = self.staged.lock();
        if let Some(pending) = staged.as_ref() {
            return Err(UsageError::StagedAnswersPending{at: pending.at});
        }
        *staged = Some(Staged{answers, strictness, at});
        Ok(())
    }

    pub fn has_staged_answers(&self) -> bool {
        self.staged.lock().is_some()
    }

    /// Stub `invocation` with the staged answers, in order, and clear them.
    /// The call is not recorded in the history.
    ///
    /// Returns `false` if there was nothing staged, which happens when
    /// another thread's call took the answers first.
    pub fn commit_staged_answers(&self, invocation: MatchableInvocation)
        -> Result<bool, UsageError>
    {
        let Some(staged) = self.staged.lock().take() else {
            return Ok(false);
        };
        let mut answers = staged.answers.into_iter();
        let Some(first) = answers.next() else {
            return Ok(true);
        };
        first.validate_for(invocation.invocation())?;
        let stubbing = self.insert_stubbing(invocation, first,
                                            staged.strictness);
        for answer in answers {
            self.chain_answer(&stubbing, answer)?;
        }
        Ok(true)
    }

    /// All stubbings, oldest first.
    pub fn stubbings_ascending(&self) -> Vec<Arc<Stubbing>> {
        self.stubbed.lock().iter().rev().cloned().collect()
    }

    /// All stubbings, newest first.
    pub fn stubbings_descending(&self) -> Vec<Arc<Stubbing>> {
        self.stubbed.lock().iter().cloned().collect()
    }

    /// Stubbings that never answered a call, oldest first.
    pub fn unused_stubbings(&self) -> Vec<Arc<Stubbing>> {
        self.stubbed.lock().iter().rev()
            .filter(|s| !s.was_used())
            .cloned()
            .collect()
    }

    /// Recorded calls, oldest first.
    pub fn invocations(&self) -> Vec<Arc<Invocation>> {
        self.history.lock().to_vec()
    }

    /// Forget recorded calls but keep the stubbings.
    pub fn clear_invocations(&self) {
        self.history.lock().clear();
    }

    /// Forget everything: stubbings, history, candidates and staged
    /// answers.
    pub fn reset(&self) {
        self.stubbed.lock().clear();
        self.history.lock().clear();
        self.candidates.lock().clear();
        *self.staged.lock() = None;
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("stubbed", &self.stubbed.lock().len())
            .field("history", &self.history.lock().to_vec().len())
            .field("staged", &self.has_staged_answers())
            .field("mock_strictness", &self.mock_strictness)
            .finish()
    }
}
