use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::bail;
use siteforge::engine::{
    completion, handler, run_pass, BuildPlugin, Orchestrator, PassBuilder,
};
use siteforge::errors::BuildError;
use siteforge::watch::WatchSpec;

type TestResult = Result<(), Box<dyn Error>>;

/// A plugin that records, on a shared logical clock, when each handler and
/// completion ran.
struct ProbePlugin {
    name: String,
    patterns: Vec<String>,
    clock: Arc<AtomicUsize>,
    handler_ticks: Arc<Mutex<Vec<usize>>>,
    completion_ticks: Arc<Mutex<Vec<usize>>>,
    completion_count: usize,
    fail_on: Option<PathBuf>,
    fail_completion: bool,
    build: bool,
}

impl ProbePlugin {
    fn new(name: &str, patterns: &[&str], clock: Arc<AtomicUsize>) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            clock,
            handler_ticks: Arc::new(Mutex::new(Vec::new())),
            completion_ticks: Arc::new(Mutex::new(Vec::new())),
            completion_count: 1,
            fail_on: None,
            fail_completion: false,
            build: true,
        }
    }
}

impl BuildPlugin for ProbePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn participates_in_build(&self) -> bool {
        self.build
    }

    fn register(&self, pass: &mut PassBuilder) -> anyhow::Result<()> {
        let mut builder = WatchSpec::builder("out").task(&self.name);
        for pattern in &self.patterns {
            builder = builder.include(pattern);
        }
        let spec = builder.build()?;

        let watch_handler = {
            let clock = Arc::clone(&self.clock);
            let ticks = Arc::clone(&self.handler_ticks);
            let fail_on = self.fail_on.clone();

            handler(move |path, _event, _info| {
                let clock = Arc::clone(&clock);
                let ticks = Arc::clone(&ticks);
                let fail_on = fail_on.clone();

                async move {
                    // Force a suspension point so handler interleaving is real.
                    tokio::task::yield_now().await;
                    ticks.lock().unwrap().push(clock.fetch_add(1, Ordering::SeqCst));
                    if fail_on.as_deref() == Some(path.as_path()) {
                        bail!("induced handler failure for {:?}", path);
                    }
                    Ok(())
                }
            })
        };
        pass.watch(spec, watch_handler, format!("{}-watch", self.name));

        for _ in 0..self.completion_count {
            let clock = Arc::clone(&self.clock);
            let ticks = Arc::clone(&self.completion_ticks);
            let fail = self.fail_completion;
            pass.on_complete(completion(move || async move {
                ticks.lock().unwrap().push(clock.fetch_add(1, Ordering::SeqCst));
                if fail {
                    bail!("induced completion failure");
                }
                Ok(())
            }));
        }

        Ok(())
    }
}

fn js_paths(prefix: &str, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("{prefix}/f{i}.js")))
        .collect()
}

#[tokio::test]
async fn completion_runs_after_every_handler_settles() -> TestResult {
    let clock = Arc::new(AtomicUsize::new(0));
    let plugin = ProbePlugin::new("probe", &["src/**/*.js"], Arc::clone(&clock));

    let summary = run_pass(&[&plugin as &dyn BuildPlugin], &js_paths("src", 100)).await?;

    let handler_ticks = plugin.handler_ticks.lock().unwrap().clone();
    let completion_ticks = plugin.completion_ticks.lock().unwrap().clone();

    assert_eq!(handler_ticks.len(), 100);
    assert_eq!(completion_ticks.len(), 1);

    let last_handler = handler_ticks.iter().max().copied().unwrap();
    assert!(
        completion_ticks[0] > last_handler,
        "completion tick {} must come after last handler tick {}",
        completion_ticks[0],
        last_handler
    );

    let report = summary.report("probe").unwrap();
    assert_eq!(report.matched, 100);
    assert_eq!(report.failed, 0);
    assert_eq!(report.completions, 1);

    Ok(())
}

#[tokio::test]
async fn disjoint_plugins_each_settle_independently() -> TestResult {
    let clock = Arc::new(AtomicUsize::new(0));
    let alpha = ProbePlugin::new("alpha", &["a/**/*.js"], Arc::clone(&clock));
    let beta = ProbePlugin::new("beta", &["b/**/*.js"], Arc::clone(&clock));

    let mut candidates = js_paths("a", 100);
    candidates.extend(js_paths("b", 100));

    let summary = run_pass(&[&alpha as &dyn BuildPlugin, &beta], &candidates).await?;

    for plugin in [&alpha, &beta] {
        assert_eq!(plugin.handler_ticks.lock().unwrap().len(), 100);
        assert_eq!(plugin.completion_ticks.lock().unwrap().len(), 1);
    }
    assert_eq!(summary.report("alpha").unwrap().matched, 100);
    assert_eq!(summary.report("beta").unwrap().matched, 100);

    Ok(())
}

#[tokio::test]
async fn handler_failure_is_isolated_to_its_path() -> TestResult {
    let clock = Arc::new(AtomicUsize::new(0));
    let mut plugin = ProbePlugin::new("probe", &["src/**/*.js"], Arc::clone(&clock));
    plugin.fail_on = Some(PathBuf::from("src/f3.js"));

    let summary = run_pass(&[&plugin as &dyn BuildPlugin], &js_paths("src", 10)).await?;

    let report = summary.report("probe").unwrap();
    assert_eq!(report.matched, 10);
    assert_eq!(report.failed, 1);
    // Completion still runs; sibling handlers were untouched.
    assert_eq!(report.completions, 1);
    assert_eq!(plugin.handler_ticks.lock().unwrap().len(), 10);

    Ok(())
}

#[tokio::test]
async fn completion_failure_aborts_the_pass() -> TestResult {
    let clock = Arc::new(AtomicUsize::new(0));
    let mut plugin = ProbePlugin::new("probe", &["src/**/*.js"], Arc::clone(&clock));
    plugin.fail_completion = true;

    let err = run_pass(&[&plugin as &dyn BuildPlugin], &js_paths("src", 5))
        .await
        .expect_err("completion failure must be fatal");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::Completion { task, .. }) => assert_eq!(task, "probe"),
        other => panic!("expected Completion error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn every_registered_completion_runs_exactly_once_in_order() -> TestResult {
    let clock = Arc::new(AtomicUsize::new(0));
    let mut plugin = ProbePlugin::new("probe", &["src/**/*.js"], Arc::clone(&clock));
    plugin.completion_count = 3;

    run_pass(&[&plugin as &dyn BuildPlugin], &js_paths("src", 4)).await?;

    let ticks = plugin.completion_ticks.lock().unwrap().clone();
    assert_eq!(ticks.len(), 3);
    assert!(ticks.windows(2).all(|w| w[0] < w[1]));

    Ok(())
}

#[tokio::test]
async fn earlier_plugin_completions_run_before_later_ones() -> TestResult {
    let clock = Arc::new(AtomicUsize::new(0));
    let first = ProbePlugin::new("first", &["src/**/*.js"], Arc::clone(&clock));
    let second = ProbePlugin::new("second", &["src/**/*.js"], Arc::clone(&clock));

    run_pass(&[&first as &dyn BuildPlugin, &second], &js_paths("src", 3)).await?;

    let first_tick = first.completion_ticks.lock().unwrap()[0];
    let second_tick = second.completion_ticks.lock().unwrap()[0];
    assert!(first_tick < second_tick);

    Ok(())
}

#[tokio::test]
async fn orchestrator_skips_plugins_outside_the_build_phase() -> TestResult {
    let clock = Arc::new(AtomicUsize::new(0));
    let active = ProbePlugin::new("active", &["src/**/*.js"], Arc::clone(&clock));
    let mut inert = ProbePlugin::new("inert", &["src/**/*.js"], Arc::clone(&clock));
    inert.build = false;

    let mut orchestrator = Orchestrator::new();
    orchestrator.register(Box::new(active));
    orchestrator.register(Box::new(inert));

    let summary = orchestrator.run(&js_paths("src", 2)).await?;

    assert!(summary.report("active").is_some());
    assert!(summary.report("inert").is_none());

    Ok(())
}
