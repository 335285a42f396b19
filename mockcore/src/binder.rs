// vim: tw=80
//! Binding of pending argument matchers to an intercepted call.

use std::{fmt, sync::Arc};

use crate::{
    error::UsageError,
    invocation::Invocation,
    matchers::{ArgumentMatcher, Equals, LocalizedMatcher},
    method::Method,
    session::Session
};

/// An invocation plus one matcher per argument position.
#[derive(Clone)]
pub struct MatchableInvocation {
    invocation: Arc<Invocation>,
    matchers: Vec<Arc<dyn ArgumentMatcher>>,
}

impl MatchableInvocation {
    /// Pair an invocation with explicit matchers.
    ///
    /// There must be exactly one matcher per argument.
    pub fn new(
        invocation: Arc<Invocation>,
        matchers: Vec<Arc<dyn ArgumentMatcher>>)
        -> Result<Self, UsageError>
    {
        let expected = invocation.arguments().len();
        if matchers.len() != expected {
            return Err(UsageError::InvalidMatcherCount {
                method: invocation.method().to_string(),
                expected,
                recorded: matchers.len()
            });
        }
        Ok(MatchableInvocation{invocation, matchers})
    }

    /// Match each argument by literal equality.
    pub fn literal(invocation: Arc<Invocation>) -> Self {
        let matchers = invocation.arguments().iter()
            .map(|a| Arc::new(Equals::shared(a.clone()))
                 as Arc<dyn ArgumentMatcher>)
            .collect();
        MatchableInvocation{invocation, matchers}
    }

    pub fn invocation(&self) -> &Arc<Invocation> {
        &self.invocation
    }

    pub fn matchers(&self) -> &[Arc<dyn ArgumentMatcher>] {
        &self.matchers
    }

    pub fn method(&self) -> &Method {
        self.invocation.method()
    }

    /// Same mock, same method, and every matcher accepts its argument.
    pub fn matches(&self, candidate: &Invocation) -> bool {
        self.invocation.mock().same_as(candidate.mock())
            && self.has_same_method(candidate)
            && self.arguments_match(candidate)
    }

    pub fn has_same_method(&self, candidate: &Invocation) -> bool {
        **self.invocation.method() == **candidate.method()
    }

    pub fn arguments_match(&self, candidate: &Invocation) -> bool {
        let args = candidate.arguments();
        args.len() == self.matchers.len()
            && self.matchers.iter()
                .zip(args)
                .all(|(m, a)| m.matches(a.as_ref()))
    }

    /// Let each matcher capture its argument of `invocation`.
    pub fn capture_arguments_from(&self, invocation: &Invocation) {
        for (m, a) in self.matchers.iter().zip(invocation.arguments()) {
            m.capture_from(a.as_ref());
        }
    }

    /// Describe every argument of `candidate` that its matcher rejects.
    pub fn explain_mismatch(&self, candidate: &Invocation) -> Vec<String> {
        self.matchers.iter()
            .zip(candidate.arguments())
            .enumerate()
            .filter_map(|(i, (m, a))| m.explain(a.as_ref())
                .map(|why| format!("argument {}: {}", i, why)))
            .collect()
    }
}

impl fmt::Debug for MatchableInvocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MatchableInvocation({})", self)
    }
}

impl fmt::Display for MatchableInvocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.invocation.method())?;
        for (i, m) in self.matchers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", m)?;
        }
        f.write_str(")")
    }
}

/// Turns a raw invocation into a [`MatchableInvocation`] using whatever
/// matchers the calling thread declared since the last call.
///
/// Binding always empties the thread's pending matchers, so a matcher
/// applies to exactly one call.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatcherBinder;

impl MatcherBinder {
    pub fn bind(&self, session: &Session, invocation: Arc<Invocation>)
        -> Result<MatchableInvocation, UsageError>
    {
        let pending = session.pull_matchers();
        Self::bind_matchers(pending, invocation)
    }

    pub fn bind_matchers(
        pending: Vec<LocalizedMatcher>,
        invocation: Arc<Invocation>) -> Result<MatchableInvocation, UsageError>
    {
        if pending.is_empty() {
            return Ok(MatchableInvocation::literal(invocation));
        }
        let matchers = pending.into_iter()
            .map(|m| m.matcher().clone())
            .collect();
        MatchableInvocation::new(invocation, matchers)
    }
}
