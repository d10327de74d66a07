// Concrete sinks, stages, and task adapters
//
// Small implementations for tests and simple pipelines: no-op and recording
// variants of the sink and stage seams, and a closure adapter for writing
// tasks without a named state machine.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::algebra::{unit, Envelope, Step, Value};
use crate::handler::{DriveError, Pipeline, Result, Sink, Stage, Task};

/// A sink that accepts every envelope and settles with the unit value.
pub struct NoOpSink<P: Pipeline> {
    _phantom: PhantomData<P>,
}

impl<P: Pipeline> NoOpSink<P> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<P: Pipeline> Default for NoOpSink<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Pipeline> Sink<P> for NoOpSink<P> {
    async fn dispatch(&mut self, _envelope: Envelope<P>) -> Result<Value> {
        Ok(unit())
    }
}

/// A stage that accepts every envelope and settles with the unit value.
pub struct NoOpStage<P: Pipeline> {
    _phantom: PhantomData<P>,
}

impl<P: Pipeline> NoOpStage<P> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<P: Pipeline> Default for NoOpStage<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Pipeline> Stage<P> for NoOpStage<P> {
    async fn call(&mut self, _envelope: Envelope<P>) -> Result<Value> {
        Ok(unit())
    }
}

/// One envelope observed by a recording sink or stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent<A> {
    /// An ordinary action, recorded by value.
    Action(A),
    /// A plan envelope; plans are opaque, so only the arrival is recorded.
    Plan,
}

/// A sink that records every dispatched envelope for later assertions.
///
/// Actions are echoed back as the settlement value, so a task can observe
/// what it dispatched; plans settle with the unit value.
pub struct RecordingSink<P: Pipeline> {
    log: Arc<Mutex<Vec<RecordedEvent<P::Action>>>>,
}

impl<P: Pipeline> RecordingSink<P> {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all recorded events in dispatch order.
    pub fn events(&self) -> Vec<RecordedEvent<P::Action>>
    where
        P::Action: Clone,
    {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns just the recorded actions, in dispatch order.
    pub fn actions(&self) -> Vec<P::Action>
    where
        P::Action: Clone,
    {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::Action(action) => Some(action),
                RecordedEvent::Plan => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl<P: Pipeline> Default for RecordingSink<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pipeline> Clone for RecordingSink<P> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

#[async_trait]
impl<P: Pipeline> Sink<P> for RecordingSink<P>
where
    P::Action: Clone,
{
    async fn dispatch(&mut self, envelope: Envelope<P>) -> Result<Value> {
        match envelope {
            Envelope::Action(action) => {
                self.log
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(RecordedEvent::Action(action.clone()));
                Ok(Box::new(action))
            }
            Envelope::Plan(_) => {
                self.log
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(RecordedEvent::Plan);
                Ok(unit())
            }
        }
    }
}

/// A stage that records every envelope it is called with.
///
/// Same echo semantics as [`RecordingSink`]; clones share one log, so a
/// test can keep a handle while the stage is moved into a router.
pub struct RecordingStage<P: Pipeline> {
    log: Arc<Mutex<Vec<RecordedEvent<P::Action>>>>,
}

impl<P: Pipeline> RecordingStage<P> {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all recorded events in call order.
    pub fn events(&self) -> Vec<RecordedEvent<P::Action>>
    where
        P::Action: Clone,
    {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns just the recorded actions, in call order.
    pub fn actions(&self) -> Vec<P::Action>
    where
        P::Action: Clone,
    {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::Action(action) => Some(action),
                RecordedEvent::Plan => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl<P: Pipeline> Default for RecordingStage<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pipeline> Clone for RecordingStage<P> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

#[async_trait]
impl<P: Pipeline> Stage<P> for RecordingStage<P>
where
    P::Action: Clone,
{
    async fn call(&mut self, envelope: Envelope<P>) -> Result<Value> {
        match envelope {
            Envelope::Action(action) => {
                self.log
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(RecordedEvent::Action(action.clone()));
                Ok(Box::new(action))
            }
            Envelope::Plan(_) => {
                self.log
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(RecordedEvent::Plan);
                Ok(unit())
            }
        }
    }
}

/// Adapts a closure into a [`Task`].
///
/// The closure receives `Ok(value)` on [`Task::advance`] and `Err(fault)`
/// on [`Task::raise`], so one function body holds the whole state machine,
/// including any recovery logic.
pub struct TaskFn<F> {
    step: F,
}

impl<F> TaskFn<F> {
    pub fn new(step: F) -> Self {
        Self { step }
    }
}

impl<P, F> Task<P> for TaskFn<F>
where
    P: Pipeline,
    F: FnMut(Result<Value>) -> Result<Step<P>> + Send,
{
    fn advance(&mut self, input: Value) -> Result<Step<P>> {
        (self.step)(Ok(input))
    }

    fn raise(&mut self, fault: DriveError) -> Result<Step<P>> {
        (self.step)(Err(fault))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Effect;

    struct TestPipe;

    impl Pipeline for TestPipe {
        type Action = u32;
        type State = ();
        type Context = ();
    }

    #[test]
    fn task_fn_routes_advance_and_raise_into_one_closure() {
        let mut seen = Vec::new();
        let mut task = TaskFn::new(move |input: Result<Value>| -> Result<Step<TestPipe>> {
            seen.push(input.is_ok());
            match seen.len() {
                1 => Ok(Step::Suspended(Effect::Dispatch(Envelope::Action(7)))),
                _ => Ok(Step::done(seen.clone())),
            }
        });

        let first = Task::<TestPipe>::advance(&mut task, unit());
        assert!(matches!(first, Ok(Step::Suspended(_))));

        let second = Task::<TestPipe>::raise(&mut task, DriveError::Dispatch("refused".into()));
        match second {
            Ok(Step::Completed(value)) => {
                let seen = value.downcast::<Vec<bool>>().expect("completion value");
                assert_eq!(*seen, vec![true, false]);
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }
}
