// End-to-end pipeline demo
//
// Assembles a router over a recording stage, sends a plain action and then
// a plan through it, and prints what each produced. Run with RUST_LOG=trace
// to watch the driver settle each effect.

use std::sync::Arc;

use drover::{
    DriveError, Effect, Envelope, Pipeline, PlanRouter, ReadState, RecordingStage, Stage, Step,
    Task, TaskFn, Value,
};
use tracing_subscriber::EnvFilter;

struct DemoPipe;

impl Pipeline for DemoPipe {
    type Action = DemoAction;
    type State = u64;
    type Context = Option<&'static str>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DemoAction {
    Greet(&'static str),
    Record(u64),
}

fn task<F>(step: F) -> Box<dyn Task<DemoPipe>>
where
    F: FnMut(drover::Result<Value>) -> drover::Result<Step<DemoPipe>> + Send + 'static,
{
    Box::new(TaskFn::new(step))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let next = RecordingStage::<DemoPipe>::new();
    let log = next.clone();
    let state: ReadState<u64> = Arc::new(|| 21);
    let mut router: PlanRouter<DemoPipe, _> =
        PlanRouter::with_context(next, state, Some("demo"));

    router
        .call(Envelope::Action(DemoAction::Greet("hello")))
        .await?;

    let plan = |state: ReadState<u64>,
                context: Option<&'static str>|
     -> drover::Result<Box<dyn Task<DemoPipe>>> {
        let mut stage = 0;
        Ok(task(move |input| {
            stage += 1;
            match stage {
                1 => {
                    let _ = input?;
                    let doubled = state() * 2;
                    Ok(Step::Suspended(Effect::awaiting(async move {
                        Ok(Box::new(doubled) as Value)
                    })))
                }
                2 => {
                    let n = input?
                        .downcast::<u64>()
                        .map_err(|_| DriveError::Task("expected a u64".into()))?;
                    Ok(Step::Suspended(Effect::Dispatch(Envelope::Action(
                        DemoAction::Record(*n),
                    ))))
                }
                _ => {
                    let _ = input?;
                    Ok(Step::done(context))
                }
            }
        }))
    };

    let outcome = router.call(Envelope::plan(plan)).await?;
    if let Ok(context) = outcome.downcast::<Option<&'static str>>() {
        println!("plan completed with context {:?}", *context);
    }
    println!("downstream stage saw {:?}", log.actions());

    Ok(())
}
