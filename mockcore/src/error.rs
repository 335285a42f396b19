// vim: tw=80
//! Errors produced while handling an intercepted call.
//!
//! There are three kinds of outcome that are not a plain return value:
//! misuse of the mocking API ([`UsageError`]), a verification mode whose
//! expectation was not met ([`VerificationFailure`]), and an error that a
//! stubbed answer deliberately produced ([`Thrown`]).

use std::panic::Location;

use thiserror::Error;

/// An error deliberately produced by an [`Answer`](crate::Answer).
///
/// It is part of the mocked behavior, so the handler hands it back to the
/// caller untouched.
pub type Thrown = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type of [`MockHandler::handle`](crate::MockHandler::handle).
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong with one intercepted call.
#[derive(Debug, Error)]
pub enum Error {
    /// The mocking API was misused.  Always fatal to the current test.
    #[error(transparent)]
    Usage(#[from] UsageError),
    /// A verification mode rejected the recorded calls.
    #[error(transparent)]
    Verification(#[from] VerificationFailure),
    /// The stubbed answer produced an error on purpose.
    #[error("{0}")]
    Thrown(Thrown),
}

impl Error {
    /// Was this error caused by misusing the mocking API?
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// Borrow the answer's own error, if that is what this is.
    pub fn thrown(&self)
        -> Option<&(dyn std::error::Error + Send + Sync + 'static)>
    {
        match self {
            Error::Thrown(t) => Some(t.as_ref()),
            _ => None
        }
    }
}

/// Violations of the stubbing/verification state machine.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum UsageError {
    #[error("Unfinished stubbing detected at {at}.  `when(..)` must be \
            followed by an answer such as `then_return(..)`")]
    UnfinishedStubbing {
        at: &'static Location<'static>
    },
    #[error("Unfinished verification detected at {at}.  `verify(..)` must be \
            followed by a call on the verified mock")]
    UnfinishedVerification {
        at: &'static Location<'static>
    },
    #[error("Misplaced argument matchers detected at {}.  Matchers can only \
            be used as arguments of a stubbed or verified call",
            .at.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    MisplacedMatchers {
        at: Vec<&'static Location<'static>>
    },
    #[error("Invalid use of argument matchers for {method}: {expected} \
            matchers expected, {recorded} recorded.  When using matchers, \
            every argument must be provided by a matcher")]
    InvalidMatcherCount {
        method: String,
        expected: usize,
        recorded: usize
    },
    #[error("{method} takes {expected} argument(s) but was invoked with \
            {actual}")]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize
    },
    #[error("{method} should return {expected} but the answer produced \
            {actual}")]
    WrongTypeOfReturnValue {
        method: String,
        expected: &'static str,
        actual: &'static str
    },
    #[error("`when(..)` requires an argument which is a call on a mock")]
    MissingMethodInvocation,
    #[error("Staged answers from {at} have not been bound to a method call \
            yet")]
    StagedAnswersPending {
        at: &'static Location<'static>
    },
    #[error("Cannot chain an answer: no stubbing has been registered yet")]
    NothingToChain,
    #[error("No call is available to stub on this thread")]
    NoCandidate,
    #[error("Invalid answer for {method}: {reason}")]
    InvalidAnswer {
        method: String,
        reason: String
    },
    #[error("{mock} was created as stub-only and cannot be verified")]
    StubOnlyVerification {
        mock: String
    },
    #[error("Strict stubbing argument mismatch.  {call} was invoked with \
            different arguments than any stubbing:\n{stubbings}")]
    PotentialStubbingProblem {
        call: String,
        stubbings: String
    },
}

/// A verification mode's expectation was not satisfied.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct VerificationFailure {
    message: String
}

impl VerificationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        VerificationFailure{message: message.into()}
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
