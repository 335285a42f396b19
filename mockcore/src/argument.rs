// vim: tw=80
//! Type-erased argument values.

use std::{fmt, sync::Arc};

use downcast::{downcast, Any};

/// One argument of an intercepted call.
///
/// Implemented for every `'static` type that is `PartialEq + Debug + Send +
/// Sync`.  Comparing two arguments of different concrete types is never an
/// error; they are simply unequal.
pub trait Argument: Any + fmt::Debug + Send + Sync {
    /// Literal equality against another, possibly differently typed, value.
    fn eq_argument(&self, other: &dyn Argument) -> bool;
}

downcast!(dyn Argument);

impl<T> Argument for T
    where T: PartialEq + fmt::Debug + Send + Sync + 'static
{
    fn eq_argument(&self, other: &dyn Argument) -> bool {
        other.downcast_ref::<T>()
            .map_or(false, |o| self == o)
    }
}

/// The ordered arguments of one call.
pub type Arguments = Vec<Arc<dyn Argument>>;

/// Build an [`Arguments`] list from a comma-separated list of values.
///
/// # Examples
/// ```
/// # use mockcore::*;
/// let a = args![1u32, "two", 3.0f64];
/// assert_eq!(a.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::new()
    };
    ($( $a:expr ),+ $(,)?) => {
        vec![$( ::std::sync::Arc::new($a) as ::std::sync::Arc<dyn $crate::Argument>, )+]
    };
}
