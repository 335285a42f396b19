// vim: tw=80
//! Answers: the behavior a stubbing produces when it matches a call.

use std::{any, fmt, marker::PhantomData};

use fragile::Fragile;

use crate::{
    error::{Thrown, UsageError},
    invocation::Invocation,
    method::Returned
};

/// What an answer produces: a value, no value at all, or a deliberate error.
pub type Answered = Result<Option<Returned>, Thrown>;

/// Behavior attached to a stubbing, or used as a mock's default.
pub trait Answer: Send + Sync {
    fn answer(&self, invocation: &Invocation) -> Answered;

    /// Check, when the answer is attached to a stubbing, that it can work
    /// for `invocation`'s method.
    fn validate_for(&self, _invocation: &Invocation) -> Result<(), UsageError>
    {
        Ok(())
    }
}

fn check_return_type<R: any::Any>(invocation: &Invocation)
    -> Result<(), UsageError>
{
    let rt = invocation.method().return_type();
    if rt.is::<R>() {
        Ok(())
    } else {
        Err(UsageError::WrongTypeOfReturnValue {
            method: invocation.method().to_string(),
            expected: rt.name(),
            actual: any::type_name::<R>()
        })
    }
}

/// Return a clone of a constant value.
#[derive(Clone, Debug)]
pub struct Returns<T>(T);

impl<T: Clone + Send + Sync + 'static> Answer for Returns<T> {
    fn answer(&self, _invocation: &Invocation) -> Answered {
        Ok(Some(Box::new(self.0.clone())))
    }

    fn validate_for(&self, invocation: &Invocation) -> Result<(), UsageError> {
        check_return_type::<T>(invocation)
    }
}

/// Fail with an error built fresh for every call.
pub struct Throws<F>(F);

impl<F> Answer for Throws<F>
    where F: Fn() -> Thrown + Send + Sync
{
    fn answer(&self, _invocation: &Invocation) -> Answered {
        Err((self.0)())
    }
}

/// Compute the result from the invocation.
pub struct Answering<F, R> {
    f: F,
    _r: PhantomData<fn() -> R>,
}

impl<F, R> Answer for Answering<F, R>
    where F: Fn(&Invocation) -> Result<R, Thrown> + Send + Sync,
          R: Send + 'static
{
    fn answer(&self, invocation: &Invocation) -> Answered {
        (self.f)(invocation).map(|r| Some(Box::new(r) as Returned))
    }

    fn validate_for(&self, invocation: &Invocation) -> Result<(), UsageError> {
        check_return_type::<R>(invocation)
    }
}

/// Single-threaded version of [`Answering`].  The closure need not be
/// `Send`, but calling the mock from another thread than the one that
/// created the answer is an error.
pub struct AnsweringSt<F, R> {
    f: Fragile<F>,
    _r: PhantomData<fn() -> R>,
}

impl<F, R> Answer for AnsweringSt<F, R>
    where F: Fn(&Invocation) -> Result<R, Thrown> + 'static,
          R: Send + 'static
{
    fn answer(&self, invocation: &Invocation) -> Answered {
        let f = self.f.try_get()?;
        f(invocation).map(|r| Some(Box::new(r) as Returned))
    }

    fn validate_for(&self, invocation: &Invocation) -> Result<(), UsageError> {
        check_return_type::<R>(invocation)
    }
}

/// Delegate to the real method of a partial mock.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallsRealMethod;

impl Answer for CallsRealMethod {
    fn answer(&self, invocation: &Invocation) -> Answered {
        invocation.call_real_method()
    }

    fn validate_for(&self, invocation: &Invocation) -> Result<(), UsageError> {
        if invocation.real_method().is_invokable() {
            Ok(())
        } else {
            Err(UsageError::InvalidAnswer {
                method: invocation.method().to_string(),
                reason: "it has no real implementation to call".to_owned()
            })
        }
    }
}

/// Do nothing.  Only valid for methods returning `()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoesNothing;

impl Answer for DoesNothing {
    fn answer(&self, _invocation: &Invocation) -> Answered {
        Ok(Some(Box::new(())))
    }

    fn validate_for(&self, invocation: &Invocation) -> Result<(), UsageError> {
        if invocation.method().return_type().is_unit() {
            Ok(())
        } else {
            Err(UsageError::InvalidAnswer {
                method: invocation.method().to_string(),
                reason: "only methods returning () can do nothing".to_owned()
            })
        }
    }
}

/// The usual default answer: the return type's default value, or no value
/// if it has none.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReturnsDefaults;

impl Answer for ReturnsDefaults {
    fn answer(&self, invocation: &Invocation) -> Answered {
        Ok(invocation.method().return_type().default_value())
    }
}

/// Default answer for partial mocks: call the real method where there is
/// one, otherwise behave like [`ReturnsDefaults`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CallsRealMethods;

impl Answer for CallsRealMethods {
    fn answer(&self, invocation: &Invocation) -> Answered {
        if invocation.real_method().is_invokable() {
            invocation.call_real_method()
        } else {
            ReturnsDefaults.answer(invocation)
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Returns<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "returns {:?}", self.0)
    }
}

/// Answer every call with a clone of `value`.
pub fn returns<T: Clone + Send + Sync + 'static>(value: T) -> Returns<T> {
    Returns(value)
}

/// Answer every call with the error produced by `f`.
pub fn throws<F, E>(f: F) -> Throws<impl Fn() -> Thrown + Send + Sync>
    where F: Fn() -> E + Send + Sync, E: Into<Thrown>
{
    Throws(move || f().into())
}

/// Answer with the result of `f`, which may inspect the invocation.
pub fn answering<F, R>(f: F) -> Answering<F, R>
    where F: Fn(&Invocation) -> Result<R, Thrown> + Send + Sync,
          R: Send + 'static
{
    Answering{f, _r: PhantomData}
}

/// Like [`answering`] but for closures that are not `Send`.
pub fn answering_st<F, R>(f: F) -> AnsweringSt<F, R>
    where F: Fn(&Invocation) -> Result<R, Thrown> + 'static,
          R: Send + 'static
{
    AnsweringSt{f: Fragile::new(f), _r: PhantomData}
}

pub fn calls_real_method() -> CallsRealMethod {
    CallsRealMethod
}

pub fn does_nothing() -> DoesNothing {
    DoesNothing
}
