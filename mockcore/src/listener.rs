// vim: tw=80
//! Hooks run after every stubbing lookup.

use std::sync::Arc;

use tracing::warn;

use crate::{
    error::UsageError,
    invocation::Invocation,
    settings::MockSettings,
    stubbing::{Strictness, Stubbing}
};

/// The outcome of looking up a stubbing for one call.
pub struct StubbingLookupEvent<'a> {
    pub invocation: &'a Invocation,
    /// The stubbing that will answer the call, if any.
    pub stubbing: Option<&'a Arc<Stubbing>>,
    /// All stubbings of the mock, oldest first.
    pub all_stubbings: &'a [Arc<Stubbing>],
    pub settings: &'a MockSettings,
}

/// Observer of stubbing lookups.  Returning an error aborts the call.
pub trait StubbingLookupListener: Send + Sync {
    fn on_stubbing_lookup(&self, event: &StubbingLookupEvent)
        -> Result<(), UsageError>;
}

/// Reports calls to a stubbed method whose arguments match none of that
/// method's stubbings.
///
/// Stubbings default to [`Strictness::Strict`] under this listener.
/// Stubbings that already answered a call, and stubbings declared in the
/// same source file as the call, are never flagged.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictStubs;

impl StubbingLookupListener for StrictStubs {
    fn on_stubbing_lookup(&self, event: &StubbingLookupEvent)
        -> Result<(), UsageError>
    {
        if event.stubbing.is_some() {
            return Ok(());
        }
        let call = event.invocation;
        let mut mismatches = Vec::new();
        for s in event.all_stubbings {
            let key = s.invocation();
            if s.was_used()
                || !key.has_same_method(call)
                || key.invocation().location().file() == call.location().file()
            {
                continue;
            }
            match s.strictness().unwrap_or(Strictness::Strict) {
                Strictness::Strict => mismatches.push(format!("  - {}", s)),
                Strictness::Warn => warn!(call = %call, stubbing = %s,
                    "stubbing argument mismatch"),
                Strictness::Lenient => ()
            }
        }
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(UsageError::PotentialStubbingProblem {
                call: format!("{} at {}", call, call.location()),
                stubbings: mismatches.join("\n")
            })
        }
    }
}
