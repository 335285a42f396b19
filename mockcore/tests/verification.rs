// vim: tw=80
//! Checking recorded calls with `verify(..)`.
#![deny(warnings)]

mod common;

use common::Calc;
use mockcore::*;
use pretty_assertions::assert_eq;

#[test]
fn default_answers_are_recorded() {
    let calc = Calc::new();
    when(calc.f(matchers::eq(1))).unwrap().then_return(10u32).unwrap();
    let results = [calc.f(1).unwrap(), calc.f(1).unwrap(), calc.f(2).unwrap()];
    assert_eq!(results, [10, 10, 0]);
    // The call made to declare the stubbing is not part of the history
    assert_eq!(calc.registry().invocations().len(), 3);
    verify(&calc, times(2)).unwrap().f(1).unwrap();
    verify(&calc, times(1)).unwrap().f(2).unwrap();
    verify(&calc, never()).unwrap().f(3).unwrap();
}

#[test]
fn captor_collects_verified_calls() {
    let calc = Calc::new();
    calc.f(1).unwrap();
    calc.g(2).unwrap();
    calc.f(3).unwrap();
    let captor = matchers::Captor::<u32>::new();
    verify(&calc, times(2)).unwrap().f(captor.capture()).unwrap();
    assert_eq!(captor.values(), vec![1, 3]);
}

#[test]
fn failed_verification_captures_nothing() {
    let calc = Calc::new();
    calc.f(1).unwrap();
    let captor = matchers::Captor::<u32>::new();
    assert!(verify(&calc, times(2)).unwrap().f(captor.capture()).is_err());
    assert!(captor.values().is_empty());
}

#[test]
fn verification_calls_are_not_recorded() {
    let calc = Calc::new();
    calc.f(1).unwrap();
    verify(&calc, times(1)).unwrap().f(1).unwrap();
    verify(&calc, times(1)).unwrap().f(1).unwrap();
    assert_eq!(calc.registry().invocations().len(), 1);
}

#[test]
fn failure_message() {
    let calc = Calc::new();
    calc.f(1).unwrap();
    let e = verify(&calc, times(2)).unwrap().f(1).unwrap_err();
    match e {
        Error::Verification(v) => assert_eq!(v.message(),
            "Wanted Calc::f(1) to be called 2 times but it was called 1 time."),
        e => panic!("Unexpected error {:?}", e)
    }
}

#[test]
fn failure_explains_similar_calls() {
    let calc = Calc::new();
    calc.f(5).unwrap();
    let e = verify(&calc, at_least(1)).unwrap().f(1).unwrap_err();
    let msg = e.to_string();
    assert!(msg.contains("Similar call Calc::f(5)"), "{}", msg);
    assert!(msg.contains("argument 0: 5 did not match 1"), "{}", msg);
}

#[test]
fn verify_with_matchers() {
    let calc = Calc::new();
    calc.f(11).unwrap();
    calc.f(12).unwrap();
    calc.f(3).unwrap();
    verify(&calc, times(2)).unwrap()
        .f(matchers::that(predicate::ge(10u32))).unwrap();
    verify(&calc, times(3)).unwrap().f(matchers::any()).unwrap();
}

#[test]
fn verification_on_other_mock_is_not_consumed() {
    let m = Calc::new();
    let n = Calc::new();
    m.f(1).unwrap();
    let pending = verify(&m, times(1)).unwrap();
    // A call on another mock executes normally
    assert_eq!(n.f(1).unwrap(), 0);
    assert_eq!(n.registry().invocations().len(), 1);
    // The verification still applies to the next call on `m`
    pending.f(1).unwrap();
    assert_eq!(m.registry().invocations().len(), 1);
    // And was consumed by it
    m.f(1).unwrap();
    assert_eq!(m.registry().invocations().len(), 2);
}

#[test]
fn unfinished_verification() {
    let calc = Calc::new();
    let _pending = verify(&calc, times(1)).unwrap();
    let e = when(0u32).unwrap_err();
    assert!(matches!(e, UsageError::UnfinishedVerification{..}), "{}", e);
}

#[test]
fn verification_inside_stubbing() {
    let calc = Calc::new();
    let _unfinished = when(calc.f(1)).unwrap();
    let e = verify(&calc, times(1)).unwrap_err();
    assert!(matches!(e, UsageError::UnfinishedStubbing{..}), "{}", e);
}

#[test]
fn stub_only_mock_cannot_be_verified() {
    let calc = Calc::with_settings(MockSettings::new().name("calc").stub_only());
    when(calc.f(1)).unwrap().then_return(10u32).unwrap();
    calc.f(1).unwrap();
    calc.f(2).unwrap();
    let history = calc.registry().invocations();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].argument::<u32>(0), Some(&2));
    let e = verify(&calc, times(1)).unwrap().f(2).unwrap_err();
    match e {
        Error::Usage(UsageError::StubOnlyVerification{mock}) =>
            assert_eq!(mock, "calc"),
        e => panic!("Unexpected error {:?}", e)
    }
}

#[test]
fn clear_invocations() {
    let calc = Calc::new();
    when(calc.f(1)).unwrap().then_return(10u32).unwrap();
    calc.f(1).unwrap();
    calc.registry().clear_invocations();
    verify(&calc, never()).unwrap().f(1).unwrap();
    // Stubbings survive
    assert_eq!(calc.f(1).unwrap(), 10);
}

#[test]
fn unit_method() {
    let calc = Calc::new();
    calc.log("hello").unwrap();
    verify(&calc, times(1)).unwrap().log("hello").unwrap();
    verify(&calc, never()).unwrap().log("goodbye").unwrap();
}

#[test]
fn custom_mode() {
    struct NoCallsBefore(u64);
    impl VerificationMode for NoCallsBefore {
        fn verify(&self, data: &VerificationData)
            -> std::result::Result<(), VerificationFailure>
        {
            if data.matching().any(|i| i.sequence() < self.0) {
                Err(VerificationFailure::new("called too early"))
            } else {
                Ok(())
            }
        }
    }

    let calc = Calc::new();
    calc.f(1).unwrap();
    let first = calc.registry().invocations()[0].sequence();
    calc.f(2).unwrap();
    verify(&calc, NoCallsBefore(first + 1)).unwrap().f(2).unwrap();
    let e = verify(&calc, NoCallsBefore(first + 1)).unwrap().f(1)
        .unwrap_err();
    assert_eq!(e.to_string(), "called too early");
}
