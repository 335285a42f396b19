// vim: tw=80
//! The declaration front end: `when`, `do_answer` and `verify`.
//!
//! # Examples
//! ```
//! # use std::sync::Arc;
//! # use mockcore::*;
//! struct Calc(MockHandler);
//! impl Calc {
//!     fn double(self: &Arc<Self>, x: u32) -> u32 {
//!         let m = Method::shared("Calc", "double", 1,
//!                                ReturnType::with_default::<u32>());
//!         let i = Invocation::new(MockRef::of(self), m, args![x],
//!                                 RealMethod::Absent).unwrap();
//!         self.0.handle(i).unwrap()
//!             .and_then(|r| r.downcast::<u32>().ok())
//!             .map_or(0, |r| *r)
//!     }
//! }
//!
//! let calc = Arc::new(Calc(MockHandler::new(MockSettings::default())));
//! when(calc.double(2)).unwrap().then_return(4u32).unwrap();
//! assert_eq!(calc.double(2), 4);
//! assert_eq!(calc.double(3), 0);
//! verify(&calc, times(1)).unwrap().double(3);
//! ```

use std::{any::Any, fmt, panic::Location, sync::Arc};

use crate::{
    answers::{self, Answer},
    error::{Thrown, UsageError},
    handler::MockHandler,
    invocation::MockRef,
    registry::Registry,
    session::Session,
    stubbing::{Strictness, Stubbing},
    verification::{MockAwareVerificationMode, VerificationMode}
};

/// A call that may still be turned into a stubbing.
///
/// Every call on a mock publishes one of these on the calling thread.
/// [`when`] picks it up.  The first `then_*` declares the stubbing; every
/// further one chains another answer onto it, even if the mock was called
/// again in between.
#[derive(Clone)]
pub struct OngoingStubbing {
    registry: Arc<Registry>,
    stubbing: Option<Arc<Stubbing>>,
    strictness: Option<Strictness>,
}

impl OngoingStubbing {
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        OngoingStubbing{registry, stubbing: None, strictness: None}
    }

    /// Override the mock's strictness for this one stubbing.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = Some(strictness);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn then_answer<A: Answer + 'static>(mut self, answer: A)
        -> Result<Self, UsageError>
    {
        Session::with_current(|s| s.stubbing_completed());
        let answer = Arc::new(answer);
        match self.stubbing.as_ref() {
            Some(stubbing) => self.registry.chain_answer(stubbing, answer)?,
            None => {
                let stubbing = self.registry.add_answer(answer, false,
                                                        self.strictness)?;
                self.stubbing = Some(stubbing);
            }
        }
        Ok(self)
    }

    pub fn then_return<T>(self, value: T) -> Result<Self, UsageError>
        where T: Clone + fmt::Debug + Send + Sync + 'static
    {
        self.then_answer(answers::returns(value))
    }

    pub fn then_throw<F, E>(self, f: F) -> Result<Self, UsageError>
        where F: Fn() -> E + Send + Sync + 'static,
              E: Into<Thrown> + 'static
    {
        self.then_answer(answers::throws(f))
    }

    pub fn then_call_real_method(self) -> Result<Self, UsageError> {
        self.then_answer(answers::CallsRealMethod)
    }

    /// The stubbing declared so far, if any.
    pub fn stubbing(&self) -> Option<&Arc<Stubbing>> {
        self.stubbing.as_ref()
    }
}

impl fmt::Debug for OngoingStubbing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OngoingStubbing")
            .field("stubbing", &self.stubbing)
            .field("strictness", &self.strictness)
            .finish()
    }
}

/// Start stubbing the call made while evaluating the argument.
///
/// The argument's value is ignored.  What matters is that a mock was
/// called on this thread just before.
#[track_caller]
pub fn when<T>(_call: T) -> Result<OngoingStubbing, UsageError> {
    let at = Location::caller();
    Session::with_current(|s| {
        s.stubbing_started(at)?;
        s.pull_ongoing_stubbing().ok_or_else(|| {
            s.reset();
            UsageError::MissingMethodInvocation
        })
    })
}

/// Answers declared before the call they stub.
///
/// Useful for methods that can't be called inside `when(..)`, such as ones
/// returning `()`.
///
/// # Examples
/// ```
/// # use std::sync::Arc;
/// # use mockcore::*;
/// # let handler = Arc::new(MockHandler::new(MockSettings::default()));
/// # let m = Method::shared("Log", "write", 1, ReturnType::unit());
/// do_throw(|| "disk full").when(&handler).unwrap();
/// let i = Invocation::new(MockRef::of(&handler), m.clone(), args!["x"],
///                         RealMethod::Absent).unwrap();
/// handler.handle(i).unwrap();
/// let i = Invocation::new(MockRef::of(&handler), m, args!["x"],
///                         RealMethod::Absent).unwrap();
/// assert!(handler.handle(i).is_err());
/// ```
pub struct Stubber {
    answers: Vec<Arc<dyn Answer>>,
    strictness: Option<Strictness>,
}

impl Stubber {
    /// Add another answer, used after the previous ones.
    pub fn and<A: Answer + 'static>(mut self, answer: A) -> Self {
        self.answers.push(Arc::new(answer));
        self
    }

    pub fn and_return<T>(self, value: T) -> Self
        where T: Clone + fmt::Debug + Send + Sync + 'static
    {
        self.and(answers::returns(value))
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = Some(strictness);
        self
    }

    /// Stage the answers on `handler`'s mock.  The next call on it will be
    /// stubbed with them instead of executed.
    #[track_caller]
    pub fn when(self, handler: &MockHandler) -> Result<(), UsageError> {
        let at = Location::caller();
        Session::with_current(|s| s.stubbing_started(at))?;
        handler.registry().set_staged_answers(self.answers, self.strictness, at)
            .map_err(|e| {
                Session::with_current(|s| s.stubbing_completed());
                e
            })
    }
}

impl fmt::Debug for Stubber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Stubber")
            .field("answers", &self.answers.len())
            .field("strictness", &self.strictness)
            .finish()
    }
}

pub fn do_answer<A: Answer + 'static>(answer: A) -> Stubber {
    Stubber{answers: vec![Arc::new(answer)], strictness: None}
}

pub fn do_return<T>(value: T) -> Stubber
    where T: Clone + fmt::Debug + Send + Sync + 'static
{
    do_answer(answers::returns(value))
}

pub fn do_throw<F, E>(f: F) -> Stubber
    where F: Fn() -> E + Send + Sync + 'static, E: Into<Thrown> + 'static
{
    do_answer(answers::throws(f))
}

pub fn do_nothing() -> Stubber {
    do_answer(answers::DoesNothing)
}

pub fn do_call_real_method() -> Stubber {
    do_answer(answers::CallsRealMethod)
}

/// Check the next call made on `mock` against `mode` instead of executing
/// it.
///
/// Returns `mock`, so the call to check can follow directly.
#[track_caller]
pub fn verify<M, V>(mock: &Arc<M>, mode: V) -> Result<&Arc<M>, UsageError>
    where M: Any + Send + Sync, V: VerificationMode + 'static
{
    let mode = MockAwareVerificationMode::at(Location::caller(),
                                             MockRef::of(mock), Arc::new(mode));
    Session::with_current(|s| s.verification_started(mode))?;
    Ok(mock)
}
