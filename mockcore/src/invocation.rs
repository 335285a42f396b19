// vim: tw=80
//! A single intercepted call.

use std::{
    any::Any,
    fmt,
    panic::Location,
    ptr,
    sync::{Arc, Weak}
};

use once_cell::sync::OnceCell;

use crate::{
    answers::Answered,
    argument::{Argument, Arguments},
    error::UsageError,
    method::Method,
    session,
    stubbing::StubInfo
};

/// Non-owning reference to a mock object.
///
/// Holding a `MockRef` never keeps the mock alive.  Two references are the
/// same mock if they point at the same allocation.
#[derive(Clone)]
pub struct MockRef(Weak<dyn Any + Send + Sync>);

impl MockRef {
    pub fn of<T: Any + Send + Sync>(mock: &Arc<T>) -> Self {
        let target: Weak<T> = Arc::downgrade(mock);
        MockRef(target)
    }

    /// A reference that never points at a live mock.  All detached
    /// references are the same mock.
    pub fn detached() -> Self {
        let target: Weak<dyn Any + Send + Sync> = Weak::<()>::new();
        MockRef(target)
    }

    pub fn same_as(&self, other: &MockRef) -> bool {
        ptr::addr_eq(self.0.as_ptr(), other.0.as_ptr())
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn upgrade(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.0.upgrade()
    }
}

impl fmt::Debug for MockRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MockRef({:p})", self.0.as_ptr() as *const ())
    }
}

type RealFn = dyn Fn(&Invocation) -> Answered + Send + Sync;

/// The real implementation behind a partial mock's method, if there is one.
#[derive(Clone, Default)]
pub enum RealMethod {
    /// The method has no body to delegate to, e.g. a trait method.
    #[default]
    Absent,
    Present(Arc<RealFn>),
}

impl RealMethod {
    pub fn new<F>(f: F) -> Self
        where F: Fn(&Invocation) -> Answered + Send + Sync + 'static
    {
        RealMethod::Present(Arc::new(f))
    }

    pub fn is_invokable(&self) -> bool {
        matches!(self, RealMethod::Present(_))
    }
}

impl fmt::Debug for RealMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RealMethod::Absent => f.write_str("Absent"),
            RealMethod::Present(_) => f.write_str("Present")
        }
    }
}

/// Immutable record of one call made against a mock.
///
/// The only state that changes after construction is the stub info slot,
/// which is filled at most once, when a stubbing answers the call.
pub struct Invocation {
    mock: MockRef,
    method: Arc<Method>,
    arguments: Arguments,
    sequence: u64,
    location: &'static Location<'static>,
    real_method: RealMethod,
    stub_info: OnceCell<StubInfo>,
}

impl Invocation {
    /// Record a call made from the caller's location.
    ///
    /// Fails if the number of arguments differs from the method's arity.
    #[track_caller]
    pub fn new(
        mock: MockRef,
        method: Arc<Method>,
        arguments: Arguments,
        real_method: RealMethod) -> Result<Self, UsageError>
    {
        Self::at(Location::caller(), mock, method, arguments, real_method)
    }

    /// Like [`new`](#method.new), with an explicit call site.
    pub fn at(
        location: &'static Location<'static>,
        mock: MockRef,
        method: Arc<Method>,
        arguments: Arguments,
        real_method: RealMethod) -> Result<Self, UsageError>
    {
        if arguments.len() != method.arity() {
            return Err(UsageError::ArityMismatch {
                method: method.to_string(),
                expected: method.arity(),
                actual: arguments.len()
            });
        }
        Ok(Invocation {
            mock,
            method,
            arguments,
            sequence: session::next_sequence(),
            location,
            real_method,
            stub_info: OnceCell::new(),
        })
    }

    pub fn mock(&self) -> &MockRef {
        &self.mock
    }

    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    pub fn arguments(&self) -> &[Arc<dyn Argument>] {
        &self.arguments
    }

    /// The `i`th argument, if it exists and has type `T`.
    pub fn argument<T: Argument>(&self, i: usize) -> Option<&T> {
        self.arguments.get(i)
            .and_then(|a| a.downcast_ref::<T>().ok())
    }

    /// Process-wide creation order.  Later calls have larger numbers.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn real_method(&self) -> &RealMethod {
        &self.real_method
    }

    /// Delegate to the real method.  Produces no value if there is none.
    pub fn call_real_method(&self) -> Answered {
        match &self.real_method {
            RealMethod::Present(f) => f(self),
            RealMethod::Absent => Ok(None)
        }
    }

    /// Remember which stubbing answered this call.  Only the first mark
    /// sticks.
    pub fn mark_stubbed(&self, info: StubInfo) {
        let _ = self.stub_info.set(info);
    }

    pub fn stub_info(&self) -> Option<&StubInfo> {
        self.stub_info.get()
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method.to_string())
            .field("arguments", &self.arguments)
            .field("sequence", &self.sequence)
            .field("location", &self.location)
            .finish()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, a) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", a)?;
        }
        f.write_str(")")
    }
}

/// Unit tests for `Invocation`.
#[cfg(test)]
mod t {
    use super::*;
    use crate::{args, ReturnType};
    use pretty_assertions::assert_eq;

    fn method() -> Arc<Method> {
        Method::shared("Foo", "foo", 2, ReturnType::of::<u32>())
    }

    #[test]
    fn arity_mismatch() {
        let e = Invocation::new(MockRef::detached(), method(), args![1u32],
                                RealMethod::Absent)
            .unwrap_err();
        assert_eq!(e, UsageError::ArityMismatch {
            method: "Foo::foo".to_owned(),
            expected: 2,
            actual: 1
        });
    }

    #[test]
    fn sequence_increases() {
        let a = Invocation::new(MockRef::detached(), method(), args![1u32, 2u32],
                                RealMethod::Absent).unwrap();
        let b = Invocation::new(MockRef::detached(), method(), args![1u32, 2u32],
                                RealMethod::Absent).unwrap();
        assert!(b.sequence() > a.sequence());
    }

    #[test]
    fn display() {
        let i = Invocation::new(MockRef::detached(), method(),
                                args![1u32, "x"], RealMethod::Absent).unwrap();
        assert_eq!(i.to_string(), "Foo::foo(1, \"x\")");
        assert_eq!(i.argument::<u32>(0), Some(&1));
        assert_eq!(i.argument::<u64>(0), None);
    }

    #[test]
    fn mock_ref_does_not_keep_mock_alive() {
        let mock = Arc::new(42u8);
        let r = MockRef::of(&mock);
        assert!(r.same_as(&MockRef::of(&mock)));
        assert!(!r.same_as(&MockRef::of(&Arc::new(42u8))));
        let alive = r.upgrade().unwrap().downcast::<u8>().unwrap();
        assert_eq!(*alive, 42);
        drop(alive);
        drop(mock);
        assert!(!r.is_alive());
    }
}
