// Data model for driven computations
//
// Tasks communicate with the driver through these types: every resume
// produces a `Step`, every suspension carries an `Effect`, and every value
// crossing the boundary is a type-erased `Value`.

use std::any::Any;
use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::handler::{Pipeline, Plan, Result};

/// The type-erased unit of data flowing into and out of a driven task.
///
/// Resolved awaitables, sink returns, and task completion values all cross
/// the driver boundary as `Value`s; tasks downcast what they expect.
pub type Value = Box<dyn Any + Send>;

/// The resume value fed to a task before it has yielded anything.
pub fn unit() -> Value {
    Box::new(())
}

/// A message flowing through the pipeline.
///
/// The router matches on the variant: plans are built and driven, actions
/// are forwarded to the next stage verbatim.
pub enum Envelope<P: Pipeline> {
    /// An ordinary message for the downstream pipeline.
    Action(P::Action),
    /// A computation descriptor to build into a task and drive.
    Plan(Box<dyn Plan<P>>),
}

impl<P: Pipeline> Envelope<P> {
    /// Wraps a plan for submission to the pipeline.
    pub fn plan(plan: impl Plan<P> + 'static) -> Self {
        Envelope::Plan(Box::new(plan))
    }
}

impl<P: Pipeline> fmt::Debug for Envelope<P>
where
    P::Action: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Envelope::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Envelope::Plan(_) => f.write_str("Plan(..)"),
        }
    }
}

/// The payload a task offers at a suspension point.
///
/// Classification is a match on the variant, so it is total: a payload is
/// either an awaitable settled by the driver directly, or an envelope
/// dispatched through the sink. There is no third case and no inspection of
/// the payload's runtime shape.
pub enum Effect<P: Pipeline> {
    /// A pending value; the driver awaits it as-is.
    Await(BoxFuture<'static, Result<Value>>),
    /// An envelope to hand to the dispatch sink; the sink's return value
    /// resumes the task.
    Dispatch(Envelope<P>),
}

impl<P: Pipeline> Effect<P> {
    /// Wraps a future as an awaitable effect.
    pub fn awaiting<F>(pending: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Effect::Await(pending.boxed())
    }
}

impl<P: Pipeline> fmt::Debug for Effect<P>
where
    P::Action: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Await(_) => f.write_str("Await(..)"),
            Effect::Dispatch(envelope) => f.debug_tuple("Dispatch").field(envelope).finish(),
        }
    }
}

/// The outcome of resuming a task.
pub enum Step<P: Pipeline> {
    /// The task paused, offering an effect to settle before the next resume.
    Suspended(Effect<P>),
    /// The task finished with a final value.
    Completed(Value),
}

impl<P: Pipeline> Step<P> {
    /// Completes with `value`, boxing it as a [`Value`].
    pub fn done(value: impl Any + Send) -> Self {
        Step::Completed(Box::new(value))
    }
}

impl<P: Pipeline> fmt::Debug for Step<P>
where
    P::Action: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Suspended(effect) => f.debug_tuple("Suspended").field(effect).finish(),
            Step::Completed(_) => f.write_str("Completed(..)"),
        }
    }
}
