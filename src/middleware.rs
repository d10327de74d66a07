// Plan-routing middleware
//
// Sits in front of an ordinary pipeline stage. Plans are built with the
// ambient accessors and handed to the driver; everything else is forwarded
// to the inner stage untouched.

use async_trait::async_trait;
use tracing::trace;

use crate::algebra::{Envelope, Value};
use crate::handler::{Pipeline, ReadState, Result, Sink, Stage};
use crate::interpreter::drive;

/// Pipeline stage that routes plans to the driver and forwards ordinary
/// actions to the next stage.
///
/// The router also serves as the dispatch sink for the tasks it drives:
/// envelopes a task dispatches re-enter [`PlanRouter::call`], so a plan
/// yielded inside a driven task is routed and driven exactly like a
/// top-level one, and its final value resumes the outer task.
pub struct PlanRouter<P: Pipeline, N> {
    next: N,
    state: ReadState<P::State>,
    context: P::Context,
}

impl<P: Pipeline, N> PlanRouter<P, N> {
    /// Creates a router with the default auxiliary context.
    pub fn new(next: N, state: ReadState<P::State>) -> Self
    where
        P::Context: Default,
    {
        Self::with_context(next, state, P::Context::default())
    }

    /// Creates a router with a fixed auxiliary context handed to every plan.
    pub fn with_context(next: N, state: ReadState<P::State>, context: P::Context) -> Self {
        Self {
            next,
            state,
            context,
        }
    }
}

#[async_trait]
impl<P, N> Stage<P> for PlanRouter<P, N>
where
    P: Pipeline,
    N: Stage<P>,
{
    async fn call(&mut self, envelope: Envelope<P>) -> Result<Value> {
        match envelope {
            Envelope::Plan(plan) => {
                trace!("building plan");
                let task = plan.build(self.state.clone(), self.context.clone())?;
                drive(task, self).await
            }
            envelope => self.next.call(envelope).await,
        }
    }
}

#[async_trait]
impl<P, N> Sink<P> for PlanRouter<P, N>
where
    P: Pipeline,
    N: Stage<P>,
{
    async fn dispatch(&mut self, envelope: Envelope<P>) -> Result<Value> {
        self.call(envelope).await
    }
}
