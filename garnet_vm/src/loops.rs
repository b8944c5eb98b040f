//! Loop executors.
//!
//! Loop bodies report `next`, `break` and `redo` as [`Interrupt::Control`]
//! through their [`Completion`]. Each executor consumes the signals raised by
//! its own body and returns a plain `Result`, so a signal can never reach an
//! enclosing loop: nested loops see only their own body's signals, and
//! errors keep propagating outward.

use garnet_core::{Completion, ControlSignal, Interrupt, RuntimeError, Value};

/// What one run of a loop body asks the loop to do.
enum Step {
    /// Finish this iteration with a value.
    Finish(Value),
    Redo,
    Break(Value),
}

#[inline]
fn step(completion: Completion) -> Result<Step, RuntimeError> {
    match completion {
        Ok(value) => Ok(Step::Finish(value)),
        Err(Interrupt::Control(ControlSignal::Next(value))) => Ok(Step::Finish(value)),
        Err(Interrupt::Control(ControlSignal::Redo)) => Ok(Step::Redo),
        Err(Interrupt::Control(ControlSignal::Break(value))) => Ok(Step::Break(value)),
        Err(Interrupt::Error(err)) => Err(err),
    }
}

// =============================================================================
// while
// =============================================================================

/// Run `body` while `condition` holds.
///
/// `next` ends the current iteration, `redo` reruns the body without testing
/// the condition again, and `break v` ends the loop with `v`. A loop that
/// runs out evaluates to `nil`.
pub fn while_loop<C, B>(mut condition: C, mut body: B) -> Result<Value, RuntimeError>
where
    C: FnMut() -> Result<bool, RuntimeError>,
    B: FnMut() -> Completion,
{
    while condition()? {
        loop {
            match step(body())? {
                Step::Finish(_) => break,
                Step::Redo => continue,
                Step::Break(value) => return Ok(value),
            }
        }
    }
    Ok(Value::Nil)
}

// =============================================================================
// Block iteration
// =============================================================================

/// Result of iterating a block over a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopOutcome {
    /// Every element was visited; the block's value for each.
    Completed(Vec<Value>),
    /// The block broke out with this value.
    Broken(Value),
}

impl LoopOutcome {
    #[inline]
    pub fn is_broken(&self) -> bool {
        matches!(self, LoopOutcome::Broken(_))
    }
}

/// Call `body` once per element.
///
/// `next v` makes `v` the block's value for that element, `redo` calls the
/// block again with the same element, and `break v` stops the iteration.
pub fn each<I, B>(items: I, mut body: B) -> Result<LoopOutcome, RuntimeError>
where
    I: IntoIterator<Item = Value>,
    B: FnMut(&Value) -> Completion,
{
    let items = items.into_iter();
    let mut results = Vec::with_capacity(items.size_hint().0);

    for item in items {
        loop {
            match step(body(&item))? {
                Step::Finish(value) => {
                    results.push(value);
                    break;
                }
                Step::Redo => continue,
                Step::Break(value) => return Ok(LoopOutcome::Broken(value)),
            }
        }
    }
    Ok(LoopOutcome::Completed(results))
}

// =============================================================================
// rescue
// =============================================================================

/// Run `body`, handing any error it raises to `handler`.
///
/// Control signals are not errors: they pass through to the enclosing loop
/// without reaching the handler.
pub fn rescue<T, B, H>(body: B, handler: H) -> Completion<T>
where
    B: FnOnce() -> Completion<T>,
    H: FnOnce(RuntimeError) -> Completion<T>,
{
    match body() {
        Err(Interrupt::Error(err)) => handler(err),
        other => other,
    }
}
