//! Coroutine-driving effect middleware for asynchronous message pipelines.
//!
//! This crate decouples *what* a computation wants done from *how* it gets
//! done. A computation is expressed as a [`Task`]: a handle that, each time it
//! is resumed, either suspends with an [`Effect`] it wants settled or
//! completes with a final value. The [`drive`] interpreter settles each
//! effect one at a time (awaiting futures, dispatching envelopes through a
//! [`Sink`]) and feeds the outcome back into the task until it finishes.
//!
//! The [`PlanRouter`] middleware sits in front of an ordinary pipeline stage
//! and routes incoming envelopes: plain actions pass through untouched, while
//! [`Plan`]s are built into tasks and driven to completion, with their
//! dispatched envelopes fed back through the router itself so nested plans
//! run under the same rules.

pub mod algebra;
pub mod handler;
pub mod impls;
pub mod interpreter;
pub mod middleware;

pub use algebra::{unit, Effect, Envelope, Step, Value};
pub use handler::{DriveError, Pipeline, Plan, ReadState, Result, Sink, Stage, Task};
pub use impls::{NoOpSink, NoOpStage, RecordedEvent, RecordingSink, RecordingStage, TaskFn};
pub use interpreter::drive;
pub use middleware::PlanRouter;
