// Driver throughput over long dispatch scripts
//
// Also exercises the loop at depths that would overflow the stack if each
// resume recursed.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::executor::block_on;

use drover::{drive, Effect, Envelope, NoOpSink, Pipeline, Step, Task, TaskFn, Value};

struct BenchPipe;

impl Pipeline for BenchPipe {
    type Action = u64;
    type State = ();
    type Context = ();
}

fn script_task(len: u64) -> Box<dyn Task<BenchPipe>> {
    let mut issued = 0;
    Box::new(TaskFn::new(move |input: drover::Result<Value>| {
        let _ = input?;
        if issued < len {
            issued += 1;
            Ok(Step::Suspended(Effect::Dispatch(Envelope::Action(issued))))
        } else {
            Ok(Step::done(issued))
        }
    }))
}

fn bench_drive(c: &mut Criterion) {
    let mut group = c.benchmark_group("drive");
    for len in [16u64, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let mut sink = NoOpSink::<BenchPipe>::new();
                block_on(drive(script_task(len), &mut sink))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_drive);
criterion_main!(benches);
