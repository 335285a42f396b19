// vim: tw=80
//! Method descriptors and the values mocked methods return.

use std::{
    any::{self, Any, TypeId},
    fmt,
    sync::Arc
};

/// A value produced for the caller of a mocked method.
pub type Returned = Box<dyn Any + Send>;

/// The declared return type of a mocked method.
///
/// This is the "is this result compatible with the method" check that the
/// proxy layer supplies; the handler only ever calls [`accepts`].
///
/// [`accepts`]: #method.accepts
#[derive(Clone, Copy)]
pub struct ReturnType {
    id: TypeId,
    name: &'static str,
    default: Option<fn() -> Returned>,
}

impl ReturnType {
    /// A return type without a usable default value.
    pub fn of<R: Any + Send>() -> Self {
        ReturnType {
            id: TypeId::of::<R>(),
            name: any::type_name::<R>(),
            default: None
        }
    }

    /// A return type whose default answer is `R::default()`.
    pub fn with_default<R: Any + Send + Default>() -> Self {
        ReturnType {
            id: TypeId::of::<R>(),
            name: any::type_name::<R>(),
            default: Some(|| -> Returned { Box::new(R::default()) })
        }
    }

    pub fn unit() -> Self {
        Self::with_default::<()>()
    }

    /// Could `value` be handed back to a caller of this method?
    pub fn accepts(&self, value: &Returned) -> bool {
        (**value).type_id() == self.id
    }

    pub fn is<R: Any>(&self) -> bool {
        self.id == TypeId::of::<R>()
    }

    pub fn is_unit(&self) -> bool {
        self.is::<()>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Produce the type's default value, if it has one.
    pub fn default_value(&self) -> Option<Returned> {
        self.default.map(|f| f())
    }
}

impl fmt::Debug for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for ReturnType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ReturnType {}

/// Describes one mockable method: where it is declared, its name, how many
/// arguments it takes and what it returns.
///
/// Two descriptors are equal if all of those are equal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Method {
    declaring_type: &'static str,
    name: &'static str,
    arity: usize,
    returns: ReturnType,
}

impl Method {
    pub fn new(
        declaring_type: &'static str,
        name: &'static str,
        arity: usize,
        returns: ReturnType) -> Self
    {
        Method{declaring_type, name, arity, returns}
    }

    /// Shorthand for a shared descriptor, which is how invocations hold
    /// them.
    pub fn shared(
        declaring_type: &'static str,
        name: &'static str,
        arity: usize,
        returns: ReturnType) -> Arc<Self>
    {
        Arc::new(Self::new(declaring_type, name, arity, returns))
    }

    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn return_type(&self) -> &ReturnType {
        &self.returns
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}
