// vim: tw=80
//! The entry point every intercepted call goes through.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    binder::{MatchableInvocation, MatcherBinder},
    error::{Error, Result, UsageError},
    invocation::Invocation,
    listener::StubbingLookupEvent,
    method::Returned,
    ongoing::OngoingStubbing,
    registry::{Registry, StubbedAnswer},
    session::Session,
    settings::MockSettings,
    verification::{MockAwareVerificationMode, VerificationData}
};

/// Publishes the ongoing stubbing again when dropped.
///
/// An answer may itself call mocks, which replaces the thread's ongoing
/// stubbing.  This puts back the outer call's whether the answer returns,
/// fails or panics.
struct Republish<'a> {
    session: &'a Session,
    ongoing: Option<OngoingStubbing>,
}

impl Drop for Republish<'_> {
    fn drop(&mut self) {
        if let Some(ongoing) = self.ongoing.take() {
            self.session.report_ongoing_stubbing(ongoing);
        }
    }
}

/// Decides what each call on one mock does: stub it with staged answers,
/// verify it, answer it from a stubbing, or fall back to the default
/// answer.
#[derive(Debug)]
pub struct MockHandler {
    settings: MockSettings,
    registry: Arc<Registry>,
    binder: MatcherBinder,
}

impl MockHandler {
    pub fn new(settings: MockSettings) -> Self {
        let registry = Arc::new(Registry::new(&settings));
        MockHandler{settings, registry, binder: MatcherBinder}
    }

    pub fn settings(&self) -> &MockSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handle a call on the calling thread's session.
    ///
    /// `Ok(None)` is the neutral result: the call was consumed by a
    /// declaration, or nothing produced a value.
    pub fn handle(&self, invocation: Invocation) -> Result<Option<Returned>> {
        Session::with_current(|session| self.handle_in(session, invocation))
    }

    pub fn handle_in(&self, session: &Session, invocation: Invocation)
        -> Result<Option<Returned>>
    {
        let invocation = Arc::new(invocation);
        trace!(call = %invocation, seq = invocation.sequence(), "intercepted");

        let mut bound = None;
        if self.registry.has_staged_answers() {
            let matchable = self.binder.bind(session, invocation.clone())?;
            match self.registry.commit_staged_answers(matchable.clone()) {
                Ok(true) => {
                    session.stubbing_completed();
                    debug!("stubbed with staged answers");
                    return Ok(None);
                },
                Ok(false) => {
                    trace!("staged answers were taken by another call");
                    bound = Some(matchable);
                },
                Err(e) => {
                    session.stubbing_completed();
                    return Err(e.into());
                }
            }
        }

        let mode = session.pull_verification_mode();
        let matchable = match bound {
            Some(matchable) => matchable,
            None => self.binder.bind(session, invocation.clone())?
        };
        session.validate_state()?;

        if let Some(mode) = mode {
            if mode.mock().same_as(invocation.mock()) {
                return self.verify(&mode, matchable);
            }
            session.restore_verification(mode);
        }

        self.registry.register_for_potential_stubbing(matchable.clone());
        session.report_ongoing_stubbing(
            OngoingStubbing::new(self.registry.clone()));

        let found = self.registry.find_answer(&invocation);
        self.notify_listeners(&invocation, found.as_ref())?;

        let _republish = Republish {
            session,
            ongoing: Some(OngoingStubbing::new(self.registry.clone()))
        };
        match found {
            Some(StubbedAnswer{stubbing, answer}) => {
                trace!(stubbing = %stubbing, "answering from stubbing");
                stubbing.capture_arguments_from(&invocation);
                answer.answer(&invocation).map_err(Error::Thrown)
            },
            None => self.answer_by_default(&invocation, matchable)
        }
    }

    fn verify(
        &self,
        mode: &MockAwareVerificationMode,
        target: MatchableInvocation) -> Result<Option<Returned>>
    {
        if self.settings.is_stub_only() {
            return Err(UsageError::StubOnlyVerification {
                mock: self.mock_name()
            }.into());
        }
        debug!(at = %mode.location(), target = %target, "verifying");
        let data = VerificationData::new(self.registry.invocations(), target);
        mode.verify(&data)?;
        for call in data.matching() {
            data.target().capture_arguments_from(call);
        }
        Ok(None)
    }

    fn notify_listeners(
        &self,
        invocation: &Invocation,
        found: Option<&StubbedAnswer>) -> Result<()>
    {
        let listeners = self.settings.stubbing_lookup_listeners();
        if listeners.is_empty() {
            return Ok(());
        }
        let all_stubbings = self.registry.stubbings_ascending();
        let event = StubbingLookupEvent {
            invocation,
            stubbing: found.map(|f| &f.stubbing),
            all_stubbings: &all_stubbings,
            settings: &self.settings
        };
        for l in listeners {
            l.on_stubbing_lookup(&event)?;
        }
        Ok(())
    }

    fn answer_by_default(
        &self,
        invocation: &Invocation,
        matchable: MatchableInvocation) -> Result<Option<Returned>>
    {
        debug!(call = %invocation, "no stubbing matched, using default answer");
        let r = self.settings.get_default_answer().answer(invocation)
            .map_err(Error::Thrown)?;
        if let Some(value) = r.as_ref() {
            let rt = invocation.method().return_type();
            if !rt.accepts(value) {
                return Err(UsageError::WrongTypeOfReturnValue {
                    method: invocation.method().to_string(),
                    expected: rt.name(),
                    actual: "a value of another type"
                }.into());
            }
        }
        // The default answer may have called other mocks on this thread.
        self.registry.reset_candidate(matchable);
        Ok(r)
    }

    fn mock_name(&self) -> String {
        match self.settings.get_name() {
            Some(name) => name.to_owned(),
            None => "unnamed mock".to_owned()
        }
    }
}
