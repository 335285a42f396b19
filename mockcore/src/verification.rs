// vim: tw=80
//! Verification of recorded calls.

use std::{fmt, ops::Range, panic::Location, sync::Arc};

use crate::{
    binder::MatchableInvocation,
    error::VerificationFailure,
    invocation::{Invocation, MockRef}
};

/// What a verification mode gets to look at: every call recorded on the
/// mock, and the call being verified.
pub struct VerificationData {
    invocations: Vec<Arc<Invocation>>,
    target: MatchableInvocation,
}

impl VerificationData {
    pub fn new(invocations: Vec<Arc<Invocation>>, target: MatchableInvocation)
        -> Self
    {
        VerificationData{invocations, target}
    }

    /// Recorded calls, oldest first.
    pub fn all_invocations(&self) -> &[Arc<Invocation>] {
        &self.invocations
    }

    pub fn target(&self) -> &MatchableInvocation {
        &self.target
    }

    /// Recorded calls that the target accepts.
    pub fn matching(&self) -> impl Iterator<Item=&Arc<Invocation>> + '_ {
        self.invocations.iter()
            .filter(move |i| self.target.matches(i))
    }

    /// Recorded calls of the same method that the target rejects.
    pub fn similar(&self) -> impl Iterator<Item=&Arc<Invocation>> + '_ {
        self.invocations.iter()
            .filter(move |i| self.target.has_same_method(i)
                    && !self.target.arguments_match(i))
    }
}

/// A policy checked against a mock's call history, like "called exactly
/// once".
pub trait VerificationMode: Send + Sync {
    fn verify(&self, data: &VerificationData)
        -> Result<(), VerificationFailure>;
}

/// A verification mode bound to the mock it was declared for.
#[derive(Clone)]
pub struct MockAwareVerificationMode {
    mock: MockRef,
    mode: Arc<dyn VerificationMode>,
    location: &'static Location<'static>,
}

impl MockAwareVerificationMode {
    #[track_caller]
    pub fn new<M: VerificationMode + 'static>(mock: MockRef, mode: M) -> Self
    {
        Self::at(Location::caller(), mock, Arc::new(mode))
    }

    pub fn at(
        location: &'static Location<'static>,
        mock: MockRef,
        mode: Arc<dyn VerificationMode>) -> Self
    {
        MockAwareVerificationMode{mock, mode, location}
    }

    pub fn mock(&self) -> &MockRef {
        &self.mock
    }

    /// Where `verify(..)` was called.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn verify(&self, data: &VerificationData)
        -> Result<(), VerificationFailure>
    {
        self.mode.verify(data)
    }
}

impl fmt::Debug for MockAwareVerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MockAwareVerificationMode")
            .field("mock", &self.mock)
            .field("location", &self.location)
            .finish()
    }
}

/// How many times the verified call must have happened.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Times {
    range: Range<usize>
}

impl Times {
    pub fn is_exact(&self) -> bool {
        (self.range.end - self.range.start) == 1
    }
}

impl VerificationMode for Times {
    fn verify(&self, data: &VerificationData)
        -> Result<(), VerificationFailure>
    {
        let actual = data.matching().count();
        if self.range.contains(&actual) {
            return Ok(());
        }
        let mut msg = format!("Wanted {} {} but it was called {}.",
                              data.target(), self, NCalls(actual));
        if actual == 0 {
            for call in data.similar() {
                msg.push_str(&format!("\n  Similar call {} at {}", call,
                                      call.location()));
                for why in data.target().explain_mismatch(call) {
                    msg.push_str(&format!("\n    {}", why));
                }
            }
        }
        Err(VerificationFailure::new(msg))
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_exact() {
            write!(f, "to be called {}", NCalls(self.range.start))
        } else if self.range.end == usize::MAX {
            write!(f, "to be called at least {}", NCalls(self.range.start))
        } else if self.range.start == 0 {
            write!(f, "to be called at most {}", NCalls(self.range.end - 1))
        } else {
            write!(f, "to be called between {} and {}", self.range.start,
                   NCalls(self.range.end - 1))
        }
    }
}

struct NCalls(usize);

impl fmt::Display for NCalls {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            1 => write!(f, "1 time"),
            n => write!(f, "{} times", n),
        }
    }
}

/// Exactly `n` calls.
// https://github.com/rust-lang/rust-clippy/issues/3307
#[allow(clippy::range_plus_one)]
pub fn times(n: usize) -> Times {
    Times{range: n..(n+1)}
}

pub fn never() -> Times {
    times(0)
}

pub fn at_least(n: usize) -> Times {
    Times{range: n..usize::MAX}
}

pub fn at_most(n: usize) -> Times {
    Times{range: 0..(n + 1)}
}

/// Any number of calls within `range`.
pub fn times_range(range: Range<usize>) -> Times {
    Times{range}
}
