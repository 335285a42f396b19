// vim: tw=80
//! Call-handling core of a dynamic mock object framework.
//!
//! A proxy layer, hand written or generated, turns every call on a mock
//! object into an [`Invocation`] and passes it to the mock's
//! [`MockHandler`].  The handler decides what the call means:
//!
//! * If answers were staged with [`do_answer`] and friends, the call is the
//!   target of that declaration.  It gets stubbed and returns nothing.
//! * If a [`verify`] is pending for this mock, the call describes what to
//!   look for in the mock's history.  It is checked, not executed.
//! * Otherwise it is a real call.  It is recorded, becomes the thread's
//!   stubbing candidate for a following [`when`], and is answered by the
//!   newest matching stubbing or by the mock's default answer.
//!
//! Declarations like "stubbing in progress", "verification pending" and
//! "argument matchers reported" live in a per-thread [`Session`].  Stubbings
//! and recorded calls live in each mock's [`Registry`], which may be shared
//! between threads.
//!
//! # Examples
//!
//! A minimal hand-written proxy:
//! ```
//! # use std::sync::Arc;
//! use mockcore::*;
//!
//! struct MockCalc {
//!     handler: MockHandler,
//!     add: Arc<Method>,
//! }
//!
//! impl MockCalc {
//!     fn new() -> Arc<Self> {
//!         Arc::new(MockCalc {
//!             handler: MockHandler::new(MockSettings::new().name("calc")),
//!             add: Method::shared("Calc", "add", 2,
//!                                 ReturnType::with_default::<i64>()),
//!         })
//!     }
//!
//!     fn add(self: &Arc<Self>, a: i64, b: i64) -> Result<i64> {
//!         let i = Invocation::new(MockRef::of(self), self.add.clone(),
//!                                 args![a, b], RealMethod::Absent)?;
//!         Ok(self.handler.handle(i)?
//!             .and_then(|r| r.downcast::<i64>().ok())
//!             .map_or(0, |r| *r))
//!     }
//! }
//!
//! let calc = MockCalc::new();
//! when(calc.add(matchers::any(), matchers::eq(1))).unwrap()
//!     .then_return(100i64).unwrap();
//! assert_eq!(calc.add(41, 1).unwrap(), 100);
//! assert_eq!(calc.add(41, 2).unwrap(), 0);
//! verify(&calc, times(1)).unwrap().add(41, 2).unwrap();
//! ```

mod argument;
pub mod answers;
mod binder;
mod error;
mod handler;
mod invocation;
mod listener;
pub mod matchers;
mod method;
mod ongoing;
mod registry;
mod session;
mod settings;
mod stubbing;
mod verification;

pub use crate::{
    answers::{Answer, Answered},
    argument::{Argument, Arguments},
    binder::{MatchableInvocation, MatcherBinder},
    error::{Error, Result, Thrown, UsageError, VerificationFailure},
    handler::MockHandler,
    invocation::{Invocation, MockRef, RealMethod},
    listener::{StrictStubs, StubbingLookupEvent, StubbingLookupListener},
    method::{Method, ReturnType, Returned},
    ongoing::{
        OngoingStubbing,
        Stubber,
        do_answer,
        do_call_real_method,
        do_nothing,
        do_return,
        do_throw,
        verify,
        when
    },
    registry::{Registry, StubbedAnswer},
    session::Session,
    settings::MockSettings,
    stubbing::{Strictness, StubInfo, Stubbing},
    verification::{
        MockAwareVerificationMode,
        Times,
        VerificationData,
        VerificationMode,
        at_least,
        at_most,
        never,
        times,
        times_range
    }
};
pub use predicates::prelude::{Predicate, predicate};
