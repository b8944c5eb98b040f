//! Tests for loop control signals.
//!
//! Coverage:
//! - `next` in a nested loop only ends the inner iteration
//! - `break` payloads become loop results
//! - `redo` in block iteration
//! - `rescue` never intercepts control signals
//! - Coercion errors raised inside loop bodies

use garnet_core::{CoercionError, Completion, Interrupt, RuntimeError, Value};
use garnet_vm::{
    DispatchConfig, IntWidth, LoopOutcome, NoMethods, NodeFactory, each, rescue, while_loop,
};
use std::cell::Cell;

#[test]
fn test_next_in_inner_loop_stays_inner() {
    let outer_runs = Cell::new(0);
    let inner_runs = Cell::new(0);
    let after_inner = Cell::new(0);

    let result = while_loop(
        || Ok(outer_runs.get() < 3),
        || {
            outer_runs.set(outer_runs.get() + 1);
            let mut i = 0;
            while_loop(
                || {
                    i += 1;
                    Ok(i <= 4)
                },
                || {
                    inner_runs.set(inner_runs.get() + 1);
                    Err(Interrupt::next(Value::Nil))
                },
            )?;
            after_inner.set(after_inner.get() + 1);
            Ok(Value::Nil)
        },
    );

    assert_eq!(result, Ok(Value::Nil));
    assert_eq!(outer_runs.get(), 3);
    assert_eq!(inner_runs.get(), 12);
    // The outer body always continued past the inner loop.
    assert_eq!(after_inner.get(), 3);
}

#[test]
fn test_break_in_inner_loop_stays_inner() {
    let outer = Cell::new(0);
    let result = while_loop(
        || Ok(outer.get() < 2),
        || {
            outer.set(outer.get() + 1);
            let inner = while_loop(|| Ok(true), || Err(Interrupt::break_with(5i64)))?;
            assert_eq!(inner, Value::Long(5));
            Ok(inner)
        },
    );
    assert_eq!(result, Ok(Value::Nil));
    assert_eq!(outer.get(), 2);
}

#[test]
fn test_break_payload_from_block() {
    let outcome = each((1..=10).map(Value::Long), |item| match item {
        Value::Long(n) if *n == 4 => Err(Interrupt::break_with(n * 100)),
        other => Ok(other.clone()),
    });
    assert_eq!(outcome, Ok(LoopOutcome::Broken(Value::Long(400))));
}

#[test]
fn test_redo_repeats_same_element() {
    let mut attempts = 0;
    let outcome = each([Value::Long(1), Value::Long(2)], |item| {
        attempts += 1;
        if *item == Value::Long(2) && attempts < 4 {
            return Err(Interrupt::redo());
        }
        Ok(item.clone())
    });
    assert_eq!(
        outcome,
        Ok(LoopOutcome::Completed(vec![Value::Long(1), Value::Long(2)]))
    );
    assert_eq!(attempts, 4);
}

#[test]
fn test_rescue_inside_loop_lets_next_through() {
    let handled = Cell::new(0);
    let outcome = each([Value::Long(1), Value::Long(2), Value::Long(3)], |item| {
        rescue(
            || match item {
                Value::Long(2) => Err(Interrupt::next(20i64)),
                Value::Long(3) => Err(RuntimeError::user("bad element").into()),
                other => Ok(other.clone()),
            },
            |_| {
                handled.set(handled.get() + 1);
                Ok(Value::Long(-1))
            },
        )
    });

    assert_eq!(
        outcome,
        Ok(LoopOutcome::Completed(vec![
            Value::Long(1),
            Value::Long(20),
            Value::Long(-1)
        ]))
    );
    assert_eq!(handled.get(), 1);
}

#[test]
fn test_coercion_error_escapes_loop() {
    let factory = NodeFactory::new(DispatchConfig::default()).unwrap();
    let coerce = factory.coerce_to_integer(IntWidth::Bits64).unwrap();

    let mut sum = 0;
    let outcome = each([Value::Long(1), Value::Nil, Value::Long(3)], |item| -> Completion {
        sum += coerce.execute(item, false, &mut NoMethods)?;
        Ok(Value::Long(sum))
    });

    assert!(matches!(
        outcome,
        Err(RuntimeError::Coercion(
            CoercionError::NoImplicitConversion { .. }
        ))
    ));
    assert_eq!(sum, 1);
}
