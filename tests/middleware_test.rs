// Router behavior
//
// Covers the routing split (actions forwarded verbatim, plans driven), the
// ambient accessors handed to plans, and nested plan delegation through the
// router-as-sink path.

use std::sync::Arc;

use drover::{
    DriveError, Effect, Envelope, NoOpStage, Pipeline, PlanRouter, ReadState, RecordingStage,
    Stage, Step, Task, TaskFn, Value,
};

type DriveResult<T> = drover::Result<T>;

struct AppPipe;

impl Pipeline for AppPipe {
    type Action = Msg;
    type State = u64;
    type Context = Option<&'static str>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Msg {
    Ping,
    Inner,
    Outer,
}

fn task<F>(step: F) -> Box<dyn Task<AppPipe>>
where
    F: FnMut(DriveResult<Value>) -> DriveResult<Step<AppPipe>> + Send + 'static,
{
    Box::new(TaskFn::new(step))
}

#[tokio::test]
async fn forwards_ordinary_actions_to_the_next_stage() {
    let next = RecordingStage::<AppPipe>::new();
    let log = next.clone();
    let state: ReadState<u64> = Arc::new(|| 0);
    let mut router: PlanRouter<AppPipe, _> = PlanRouter::new(next, state);

    let value = router.call(Envelope::Action(Msg::Ping)).await.unwrap();
    assert_eq!(*value.downcast::<Msg>().unwrap(), Msg::Ping);
    assert_eq!(log.actions(), vec![Msg::Ping]);
}

#[tokio::test]
async fn builds_plans_with_the_ambient_accessors_and_drives_them() {
    let next = NoOpStage::<AppPipe>::new();
    let state: ReadState<u64> = Arc::new(|| 41);
    let mut router: PlanRouter<AppPipe, _> = PlanRouter::with_context(next, state, Some("extra"));

    let plan = |state: ReadState<u64>,
                context: Option<&'static str>|
     -> DriveResult<Box<dyn Task<AppPipe>>> {
        let mut stage = 0;
        Ok(task(move |input| {
            let _ = input?;
            stage += 1;
            match stage {
                1 => {
                    assert_eq!(state(), 41);
                    assert_eq!(context, Some("extra"));
                    Ok(Step::Suspended(Effect::awaiting(async {
                        Ok(Box::new(()) as Value)
                    })))
                }
                _ => Ok(Step::done(state() + 1)),
            }
        }))
    };

    let value = router.call(Envelope::plan(plan)).await.unwrap();
    assert_eq!(*value.downcast::<u64>().unwrap(), 42);
}

#[tokio::test]
async fn new_defaults_the_context() {
    let next = NoOpStage::<AppPipe>::new();
    let state: ReadState<u64> = Arc::new(|| 0);
    let mut router: PlanRouter<AppPipe, _> = PlanRouter::new(next, state);

    let plan = |_state: ReadState<u64>,
                context: Option<&'static str>|
     -> DriveResult<Box<dyn Task<AppPipe>>> {
        Ok(task(move |input| {
            let _ = input?;
            Ok(Step::done(context.is_none()))
        }))
    };

    let value = router.call(Envelope::plan(plan)).await.unwrap();
    assert!(*value.downcast::<bool>().unwrap());
}

#[tokio::test]
async fn nested_plans_drive_before_the_outer_task_resumes() {
    let next = RecordingStage::<AppPipe>::new();
    let log = next.clone();
    let state: ReadState<u64> = Arc::new(|| 0);
    let mut router: PlanRouter<AppPipe, _> = PlanRouter::new(next, state);

    let inner = |_state: ReadState<u64>,
                 _context: Option<&'static str>|
     -> DriveResult<Box<dyn Task<AppPipe>>> {
        let mut stage = 0;
        Ok(task(move |input| {
            let _ = input?;
            stage += 1;
            match stage {
                1 => Ok(Step::Suspended(Effect::Dispatch(Envelope::Action(
                    Msg::Inner,
                )))),
                _ => Ok(Step::done("inner-done".to_string())),
            }
        }))
    };

    let outer = move |_state: ReadState<u64>,
                      _context: Option<&'static str>|
     -> DriveResult<Box<dyn Task<AppPipe>>> {
        let mut inner = Some(inner);
        let mut stage = 0;
        Ok(task(move |input| {
            stage += 1;
            match stage {
                1 => {
                    let _ = input?;
                    let plan = inner
                        .take()
                        .ok_or_else(|| DriveError::Task("inner plan already spent".into()))?;
                    Ok(Step::Suspended(Effect::Dispatch(Envelope::plan(plan))))
                }
                2 => {
                    let done = input?
                        .downcast::<String>()
                        .map_err(|_| DriveError::Task("expected the inner outcome".into()))?;
                    assert_eq!(*done, "inner-done");
                    Ok(Step::Suspended(Effect::Dispatch(Envelope::Action(
                        Msg::Outer,
                    ))))
                }
                _ => Ok(Step::done(())),
            }
        }))
    };

    router.call(Envelope::plan(outer)).await.unwrap();
    assert_eq!(log.actions(), vec![Msg::Inner, Msg::Outer]);
}

#[tokio::test]
async fn plan_construction_failures_surface_in_the_outcome() {
    let next = NoOpStage::<AppPipe>::new();
    let state: ReadState<u64> = Arc::new(|| 0);
    let mut router: PlanRouter<AppPipe, _> = PlanRouter::new(next, state);

    let plan = |_state: ReadState<u64>,
                _context: Option<&'static str>|
     -> DriveResult<Box<dyn Task<AppPipe>>> {
        Err(DriveError::Construct("missing capability".into()))
    };

    let outcome = router.call(Envelope::plan(plan)).await;
    assert!(matches!(outcome, Err(DriveError::Construct(_))));
}
