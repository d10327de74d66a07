// The driver loop
//
// Resumes a task step by step, settling each suspended effect before the
// next resume. Written as an explicit loop so deeply nested scripts run in
// constant stack space.

use tracing::{debug, trace, warn};

use crate::algebra::{unit, Effect, Step, Value};
use crate::handler::{Pipeline, Result, Sink, Task};

/// Drives `task` to completion, settling each suspended effect through
/// `sink` or by awaiting it directly.
///
/// The returned future settles exactly once: with the task's completion
/// value, or with the first failure the task did not recover from. Failed
/// settlements are first injected back into the task via
/// [`Task::raise`], so a task may catch them and keep going; only an error
/// propagated out of `advance` or `raise` is terminal.
///
/// Effects are settled strictly one at a time, in yield order. The task
/// cannot proceed past a suspension point until the prior settlement has
/// been fed back.
pub async fn drive<P, D>(mut task: Box<dyn Task<P>>, sink: &mut D) -> Result<Value>
where
    P: Pipeline,
    D: Sink<P> + ?Sized,
{
    let mut steps = 0u64;
    // The first resume runs inside the future, so a task that fails before
    // its first suspension rejects the future instead of unwinding the
    // caller.
    let mut step = task.advance(unit());
    loop {
        match step {
            Err(fault) => {
                warn!(steps, error = %fault, "task rejected");
                return Err(fault);
            }
            Ok(Step::Completed(value)) => {
                debug!(steps, "task completed");
                return Ok(value);
            }
            Ok(Step::Suspended(effect)) => {
                steps += 1;
                let settled = match effect {
                    Effect::Await(pending) => {
                        trace!(steps, "awaiting suspended value");
                        pending.await
                    }
                    Effect::Dispatch(envelope) => {
                        trace!(steps, "dispatching suspended envelope");
                        sink.dispatch(envelope).await
                    }
                };
                step = match settled {
                    Ok(value) => task.advance(value),
                    Err(fault) => {
                        debug!(steps, error = %fault, "raising fault into task");
                        task.raise(fault)
                    }
                };
            }
        }
    }
}
