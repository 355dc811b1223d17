//! Runner frame cost: one per-frame update plus one fixed step

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bible_heroes::data::RunnerSettings;
use bible_heroes::modes::{Mode, ModeInput, RunStatus, RunnerMode};
use bible_heroes::Stage;

fn runner_tick(c: &mut Criterion) {
    let mut settings = RunnerSettings::default();
    // Long enough that the run never finishes during a sample
    settings.phase_length = f32::MAX;

    let mut stage = Stage::with_seed(7);
    let mut runner = RunnerMode::new(settings);
    runner.set_enabled(true);
    runner.reset(&mut stage);

    let input = ModeInput::default();
    let mut events = Vec::new();

    c.bench_function("runner_tick", |b| {
        b.iter(|| {
            runner.update(&mut stage, black_box(&input), 1.0 / 60.0, &mut events);
            runner.fixed_update(&mut stage, 0.02, &mut events);
            events.clear();
            // Start over after a crash
            if runner.status() != RunStatus::Running {
                stage.clear();
                runner.reset(&mut stage);
            }
        })
    });
}

criterion_group!(benches, runner_tick);
criterion_main!(benches);
