// vim: tw=80
//! A hand-written mock proxy shared by the integration tests.
#![allow(dead_code)]

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering}
    }
};

use mockcore::*;

/// Mock of a calculator with a few method shapes.
///
/// * `f` returns a `u32` with default `0`.
/// * `name` returns a `String` with no default value.
/// * `log` returns `()`.
/// * `double` has a real implementation, for partial mocking.
#[derive(Debug)]
pub struct Calc {
    handler: MockHandler,
    f: Arc<Method>,
    g: Arc<Method>,
    name: Arc<Method>,
    log: Arc<Method>,
    double: Arc<Method>,
    /// Number of times the real `double` ran.
    pub real_calls: Arc<AtomicU32>,
}

impl Calc {
    pub fn new() -> Arc<Self> {
        Self::with_settings(MockSettings::default())
    }

    pub fn with_settings(settings: MockSettings) -> Arc<Self> {
        Arc::new(Calc {
            handler: MockHandler::new(settings),
            f: Method::shared("Calc", "f", 1, ReturnType::with_default::<u32>()),
            g: Method::shared("Calc", "g", 1, ReturnType::with_default::<u32>()),
            name: Method::shared("Calc", "name", 0, ReturnType::of::<String>()),
            log: Method::shared("Calc", "log", 1, ReturnType::unit()),
            double: Method::shared("Calc", "double", 1,
                                   ReturnType::with_default::<u32>()),
            real_calls: Arc::new(AtomicU32::new(0)),
        })
    }

    pub fn handler(&self) -> &MockHandler {
        &self.handler
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.handler.registry()
    }

    #[track_caller]
    fn call<R: 'static>(
        self: &Arc<Self>,
        method: &Arc<Method>,
        arguments: Arguments,
        real: RealMethod) -> Result<Option<R>>
    {
        let i = Invocation::at(Location::caller(), MockRef::of(self),
                               method.clone(), arguments, real)?;
        Ok(self.handler.handle(i)?
            .and_then(|r| r.downcast::<R>().ok())
            .map(|r| *r))
    }

    #[track_caller]
    pub fn f(self: &Arc<Self>, x: u32) -> Result<u32> {
        self.call(&self.f, args![x], RealMethod::Absent)
            .map(Option::unwrap_or_default)
    }

    #[track_caller]
    pub fn g(self: &Arc<Self>, x: u32) -> Result<u32> {
        self.call(&self.g, args![x], RealMethod::Absent)
            .map(Option::unwrap_or_default)
    }

    #[track_caller]
    pub fn name(self: &Arc<Self>) -> Result<Option<String>> {
        self.call(&self.name, args![], RealMethod::Absent)
    }

    #[track_caller]
    pub fn log(self: &Arc<Self>, msg: &'static str) -> Result<()> {
        self.call::<()>(&self.log, args![msg], RealMethod::Absent)
            .map(drop)
    }

    #[track_caller]
    pub fn double(self: &Arc<Self>, x: u32) -> Result<u32> {
        let counter = self.real_calls.clone();
        let real = RealMethod::new(move |inv| {
            counter.fetch_add(1, Ordering::Relaxed);
            let x = inv.argument::<u32>(0).copied().unwrap_or_default();
            Ok(Some(Box::new(x * 2)))
        });
        self.call(&self.double, args![x], real)
            .map(Option::unwrap_or_default)
    }
}

/// Stands in for production code living outside the test file.  Calls made
/// here are located in this file.
pub fn code_under_test(calc: &Arc<Calc>, x: u32) -> Result<u32> {
    let i = Invocation::new(MockRef::of(calc), calc.f.clone(), args![x],
                            RealMethod::Absent)?;
    Ok(calc.handler.handle(i)?
        .and_then(|r| r.downcast::<u32>().ok())
        .map_or(0, |r| *r))
}

/// Forget anything a failed test left on this thread's session.
pub fn reset_session() {
    Session::with_current(|s| s.reset());
}
