// vim: tw=80
//! What a mock does for calls that no stubbing matches.
#![deny(warnings)]

mod common;

use std::sync::atomic::Ordering;

use common::Calc;
use mockcore::*;
use pretty_assertions::assert_eq;

#[test]
fn returns_defaults() {
    let calc = Calc::new();
    assert_eq!(calc.f(1).unwrap(), 0);
    // `String` was declared without a default value
    assert_eq!(calc.name().unwrap(), None);
    calc.log("x").unwrap();
    assert_eq!(calc.registry().invocations().len(), 3);
}

#[test]
fn calls_real_methods() {
    let calc = Calc::with_settings(MockSettings::new()
        .default_answer(answers::CallsRealMethods));
    assert_eq!(calc.double(4).unwrap(), 8);
    // Methods without a real implementation fall back to defaults
    assert_eq!(calc.f(4).unwrap(), 0);
    assert_eq!(calc.real_calls.load(Ordering::Relaxed), 1);
}

#[test]
fn stubbing_a_partial_mock_runs_the_real_method_once() {
    let calc = Calc::with_settings(MockSettings::new()
        .default_answer(answers::CallsRealMethods));
    when(calc.double(4)).unwrap().then_return(1u32).unwrap();
    assert_eq!(calc.double(4).unwrap(), 1);
    assert_eq!(calc.real_calls.load(Ordering::Relaxed), 1);
}

#[test]
fn custom_default() {
    let calc = Calc::with_settings(MockSettings::new()
        .default_answer(answers::answering(|inv| {
            Ok(inv.argument::<u32>(0).copied().unwrap_or_default() + 1)
        })));
    assert_eq!(calc.f(41).unwrap(), 42);
    assert_eq!(calc.g(1).unwrap(), 2);
}

#[test]
fn wrong_type_of_default() {
    let calc = Calc::with_settings(MockSettings::new()
        .default_answer(answers::returns(7u32)));
    assert_eq!(calc.f(1).unwrap(), 7);
    let e = calc.name().unwrap_err();
    match e {
        Error::Usage(UsageError::WrongTypeOfReturnValue{method, expected, ..})
            => {
            assert_eq!(method, "Calc::name");
            assert_eq!(expected, std::any::type_name::<String>());
        },
        e => panic!("Unexpected error {:?}", e)
    }
}

#[test]
fn throwing_default() {
    let calc = Calc::with_settings(MockSettings::new()
        .default_answer(answers::throws(|| "unexpected call")));
    let e = calc.f(1).unwrap_err();
    assert_eq!(e.thrown().unwrap().to_string(), "unexpected call");
    // The call is still recorded and can be stubbed
    assert_eq!(calc.registry().invocations().len(), 1);
    when(0u32).unwrap().then_return(5u32).unwrap();
    assert_eq!(calc.f(1).unwrap(), 5);
}

#[test]
fn default_answer_calling_another_mock() {
    let other = Calc::new();
    let other2 = other.clone();
    let calc = Calc::with_settings(MockSettings::new()
        .default_answer(answers::answering(move |_| {
            other2.g(0).map_err(|e| -> Thrown { e.into() })
        })));
    // `when` picks the call on `calc`, not the one its default answer made
    when(calc.f(1)).unwrap().then_return(3u32).unwrap();
    assert_eq!(calc.f(1).unwrap(), 3);
    assert!(other.registry().stubbings_ascending().is_empty());
}
