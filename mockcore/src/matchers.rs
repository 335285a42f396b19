// vim: tw=80
//! Argument matchers.
//!
//! A matcher is a predicate over one argument position.  Matchers declared
//! with the functions in this module are recorded on the calling thread's
//! [`Session`](crate::Session) and apply to the very next call made on a
//! mock from that thread.
//!
//! # Examples
//! ```
//! # use mockcore::*;
//! use mockcore::predicate;
//!
//! // Reports a matcher and returns a placeholder to pass to the mock.
//! let x: u32 = matchers::that(predicate::gt(5u32));
//! assert_eq!(x, 0);
//! # Session::with_current(|s| s.reset());
//! ```

use std::{fmt, marker::PhantomData, panic::Location, sync::Arc};

use parking_lot::Mutex;
use predicates::prelude::Predicate;
use predicates_tree::CaseTreeExt;

use crate::{argument::Argument, session::Session};

/// A predicate over one argument of a call.
pub trait ArgumentMatcher: fmt::Display + Send + Sync {
    fn matches(&self, argument: &dyn Argument) -> bool;

    /// Explain why `argument` was rejected, or `None` if it matches.
    fn explain(&self, argument: &dyn Argument) -> Option<String> {
        if self.matches(argument) {
            None
        } else {
            Some(format!("{:?} did not match {}", argument, self))
        }
    }

    /// Called with each argument of a call this matcher was used to stub or
    /// verify.  Only capturing matchers do anything.
    fn capture_from(&self, _argument: &dyn Argument) {}
}

/// Literal equality.  This is what every argument gets when no matcher was
/// declared for the call.
pub struct Equals(Arc<dyn Argument>);

impl Equals {
    pub fn new<T: Argument>(value: T) -> Self {
        Equals(Arc::new(value))
    }

    pub fn shared(value: Arc<dyn Argument>) -> Self {
        Equals(value)
    }
}

impl ArgumentMatcher for Equals {
    fn matches(&self, argument: &dyn Argument) -> bool {
        self.0.eq_argument(argument)
    }
}

impl fmt::Display for Equals {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Accepts any argument at all.
pub struct Anything;

impl ArgumentMatcher for Anything {
    fn matches(&self, _argument: &dyn Argument) -> bool {
        true
    }
}

impl fmt::Display for Anything {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("<any>")
    }
}

/// Adapts a typed [`Predicate`](predicates::Predicate) to an argument
/// position.  Arguments of any other type are rejected.
pub struct Satisfies<T, P> {
    predicate: P,
    _t: PhantomData<fn(&T)>,
}

impl<T, P> Satisfies<T, P>
    where T: Argument, P: Predicate<T> + Send + Sync
{
    pub fn new(predicate: P) -> Self {
        Satisfies{predicate, _t: PhantomData}
    }
}

impl<T, P> ArgumentMatcher for Satisfies<T, P>
    where T: Argument, P: Predicate<T> + Send + Sync
{
    fn matches(&self, argument: &dyn Argument) -> bool {
        argument.downcast_ref::<T>()
            .map_or(false, |v| self.predicate.eval(v))
    }

    fn explain(&self, argument: &dyn Argument) -> Option<String> {
        match argument.downcast_ref::<T>() {
            Ok(v) => self.predicate.find_case(false, v)
                .map(|case| case.tree().to_string()),
            Err(_) => Some(format!("{:?} is not a {}", argument,
                                   std::any::type_name::<T>()))
        }
    }
}

impl<T, P: Predicate<T>> fmt::Display for Satisfies<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.predicate)
    }
}

/// A matcher built from a closure.
pub struct Matching<T, F> {
    f: F,
    _t: PhantomData<fn(&T)>,
}

impl<T, F> Matching<T, F>
    where T: Argument, F: Fn(&T) -> bool + Send + Sync
{
    pub fn new(f: F) -> Self {
        Matching{f, _t: PhantomData}
    }
}

impl<T, F> ArgumentMatcher for Matching<T, F>
    where T: Argument, F: Fn(&T) -> bool + Send + Sync
{
    fn matches(&self, argument: &dyn Argument) -> bool {
        argument.downcast_ref::<T>()
            .map_or(false, |v| (self.f)(v))
    }
}

impl<T, F> fmt::Display for Matching<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<matching {}>", std::any::type_name::<T>())
    }
}

/// Accepts any argument of type `T`, and keeps a copy of every argument it
/// sees in a call that was stubbed or verified with it.
///
/// Clones share the captured values.
///
/// # Examples
/// ```
/// # use mockcore::*;
/// let captor = matchers::Captor::<u32>::new();
/// let x: u32 = captor.capture();
/// assert_eq!(x, 0);
/// assert!(captor.values().is_empty());
/// # Session::with_current(|s| s.reset());
/// ```
pub struct Captor<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T: Argument + Clone> Captor<T> {
    pub fn new() -> Self {
        Captor{values: Arc::new(Mutex::new(Vec::new()))}
    }

    /// Use this captor as the matcher for one argument of the next call.
    #[track_caller]
    pub fn capture(&self) -> T
        where T: Default
    {
        report(self.clone());
        T::default()
    }

    /// Every captured value, in the order the calls were handled.
    pub fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }

    /// The most recently captured value.
    pub fn value(&self) -> Option<T> {
        self.values.lock().last().cloned()
    }
}

impl<T> Clone for Captor<T> {
    fn clone(&self) -> Self {
        Captor{values: self.values.clone()}
    }
}

impl<T: Argument + Clone> Default for Captor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Captor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Captor").field(&*self.values.lock()).finish()
    }
}

impl<T: Argument + Clone> ArgumentMatcher for Captor<T> {
    fn matches(&self, argument: &dyn Argument) -> bool {
        argument.downcast_ref::<T>().is_ok()
    }

    fn capture_from(&self, argument: &dyn Argument) {
        if let Ok(v) = argument.downcast_ref::<T>() {
            self.values.lock().push(v.clone());
        }
    }
}

impl<T> fmt::Display for Captor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<capturing {}>", std::any::type_name::<T>())
    }
}

/// A matcher together with the place it was declared.
#[derive(Clone)]
pub struct LocalizedMatcher {
    matcher: Arc<dyn ArgumentMatcher>,
    location: &'static Location<'static>,
}

impl LocalizedMatcher {
    #[track_caller]
    pub fn new<M: ArgumentMatcher + 'static>(matcher: M) -> Self {
        LocalizedMatcher {
            matcher: Arc::new(matcher),
            location: Location::caller()
        }
    }

    pub fn matcher(&self) -> &Arc<dyn ArgumentMatcher> {
        &self.matcher
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Debug for LocalizedMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}", self.matcher, self.location)
    }
}

/// Record `matcher` for the next call made on this thread.
#[track_caller]
pub fn report<M: ArgumentMatcher + 'static>(matcher: M) {
    let m = LocalizedMatcher::new(matcher);
    Session::with_current(|s| s.report_matcher(m));
}

/// Match any argument.  Returns a placeholder to pass to the mock.
#[track_caller]
pub fn any<T: Default>() -> T {
    report(Anything);
    T::default()
}

/// Match arguments equal to `value`.
#[track_caller]
pub fn eq<T: Argument + Clone>(value: T) -> T {
    report(Equals::new(value.clone()));
    value
}

/// Match arguments accepted by a [`Predicate`](predicates::Predicate).
#[track_caller]
pub fn that<T, P>(predicate: P) -> T
    where T: Argument + Default, P: Predicate<T> + Send + Sync + 'static
{
    report(Satisfies::new(predicate));
    T::default()
}

/// Match arguments for which `f` returns true.
#[track_caller]
pub fn matching<T, F>(f: F) -> T
    where T: Argument + Default, F: Fn(&T) -> bool + Send + Sync + 'static
{
    report(Matching::new(f));
    T::default()
}

/// Match any argument of type `T` and capture it into `captor`.
#[track_caller]
pub fn capture<T>(captor: &Captor<T>) -> T
    where T: Argument + Clone + Default
{
    report(captor.clone());
    T::default()
}

/// Unit tests for the matchers.
#[cfg(test)]
mod t {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn equals() {
        let m = Equals::new(5u32);
        assert!(m.matches(&5u32));
        assert!(!m.matches(&6u32));
        assert!(!m.matches(&5u64));
        assert_eq!(m.to_string(), "5");
    }

    #[test]
    fn satisfies() {
        let m = Satisfies::<i32, _>::new(predicate::gt(10i32));
        assert!(m.matches(&11i32));
        assert!(!m.matches(&10i32));
        assert!(m.explain(&11i32).is_none());
        assert!(m.explain(&3i32).is_some());
        let wrong = m.explain(&"eleven").unwrap();
        assert!(wrong.contains("is not a i32"), "{}", wrong);
    }

    #[test]
    fn matching_closure() {
        let m = Matching::new(|s: &String| s.starts_with("foo"));
        assert!(m.matches(&"foobar".to_owned()));
        assert!(!m.matches(&"barfoo".to_owned()));
        assert!(m.explain(&"barfoo".to_owned()).is_some());
    }

    #[test]
    fn captor() {
        let c = Captor::<u32>::new();
        let shared = c.clone();
        assert!(shared.matches(&4u32));
        assert!(!shared.matches(&4u64));
        shared.capture_from(&4u32);
        shared.capture_from(&4u64);
        shared.capture_from(&5u32);
        assert_eq!(c.values(), vec![4, 5]);
        assert_eq!(c.value(), Some(5));
        assert_eq!(c.to_string(), "<capturing u32>");
    }

    #[test]
    fn report_records_on_session() {
        let session = Session::new();
        session.report_matcher(LocalizedMatcher::new(Anything));
        let pulled = session.pull_matchers();
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].matcher().to_string(), "<any>");
        assert!(session.pull_matchers().is_empty());
    }
}
