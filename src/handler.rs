// Trait seams between tasks, the driver, and the pipeline
//
// The driver only ever talks to these traits. Concrete pipelines plug in by
// naming their types once (`Pipeline`) and implementing the seams their side
// of the boundary needs.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::algebra::{Envelope, Step, Value};

/// The three types one pipeline shares across its stages.
///
/// Implementations are usually unit structs naming the types once, so the
/// router, sinks, and tasks of a pipeline agree without repeating bounds.
pub trait Pipeline: Sized + Send + 'static {
    /// The ordinary message type forwarded to downstream stages.
    type Action: Send + 'static;
    /// The snapshot returned by the read-state accessor.
    type State: Send + 'static;
    /// The fixed auxiliary value handed to every plan.
    type Context: Clone + Send + Sync + 'static;
}

/// Read-only accessor for the pipeline's current state snapshot.
///
/// Passed unchanged to every plan the router builds.
pub type ReadState<S> = Arc<dyn Fn() -> S + Send + Sync>;

/// Errors that can occur while driving a task.
///
/// Variants exist for producers to construct, not for the driver to
/// translate into: the exact value a sink, awaitable, or task produced is
/// the one the caller observes.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("plan construction failed: {0}")]
    Construct(String),

    #[error("awaited value failed: {0}")]
    Await(String),

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    #[error("task failed: {0}")]
    Task(String),
}

/// Result type for drive operations
pub type Result<T> = std::result::Result<T, DriveError>;

/// A suspended computation handle.
///
/// A task is single-use and exclusively owned by one in-flight drive. The
/// driver makes exactly one outstanding `advance`/`raise` call at a time and
/// always passes the most recently settled value; resuming a completed task
/// or sharing one across drives is a programming error, not a recoverable
/// condition.
pub trait Task<P: Pipeline>: Send {
    /// Resumes the task with a settled value, producing its next step.
    fn advance(&mut self, input: Value) -> Result<Step<P>>;

    /// Injects a failure at the current suspension point.
    ///
    /// A task that handles the fault returns its next step; the default
    /// re-raises, so tasks without recovery logic only implement `advance`.
    fn raise(&mut self, fault: DriveError) -> Result<Step<P>> {
        Err(fault)
    }
}

/// A computation descriptor: the sole extension point for submitting work.
///
/// Invoked once with the ambient read-state accessor and the router's
/// auxiliary context to produce a runnable task.
pub trait Plan<P: Pipeline>: Send {
    /// Builds the task this plan describes.
    fn build(
        self: Box<Self>,
        state: ReadState<P::State>,
        context: P::Context,
    ) -> Result<Box<dyn Task<P>>>;
}

impl<P, F> Plan<P> for F
where
    P: Pipeline,
    F: FnOnce(ReadState<P::State>, P::Context) -> Result<Box<dyn Task<P>>> + Send,
{
    fn build(
        self: Box<Self>,
        state: ReadState<P::State>,
        context: P::Context,
    ) -> Result<Box<dyn Task<P>>> {
        (*self)(state, context)
    }
}

/// The dispatch sink the driver hands suspended envelopes to.
///
/// Dispatch is async, so a sink that returns a plain value is an
/// immediately-ready settlement; the driver treats both the same way.
#[async_trait]
pub trait Sink<P: Pipeline>: Send {
    /// Dispatches an envelope; the returned value resumes the task.
    async fn dispatch(&mut self, envelope: Envelope<P>) -> Result<Value>;
}

/// A pipeline stage: the continuation ordinary actions are forwarded to.
#[async_trait]
pub trait Stage<P: Pipeline>: Send {
    /// Handles an envelope, returning the stage's outcome verbatim.
    async fn call(&mut self, envelope: Envelope<P>) -> Result<Value>;
}
