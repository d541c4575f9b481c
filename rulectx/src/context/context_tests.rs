//! Cross-cutting tests for contexts: forking, sharing and concurrency.

#[cfg(test)]
mod tests {
    use crate::context::{Context, Location, Tracer};
    use crate::logging::{Accumulator, LogLevel};
    use crate::ports::{App, Bindings, ScriptRuntime};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct RecordingTracer {
        started: Mutex<Vec<(String, String)>>,
        stopped: Mutex<Vec<String>>,
    }

    impl Tracer for RecordingTracer {
        fn start_span(&self, ctx: &mut Context, op_name: &str) {
            ctx.set_log_value("span", json!(op_name));
            self.started
                .lock()
                .push((ctx.id().to_string(), op_name.to_string()));
        }

        fn stop_span(&self, ctx: &Context) {
            self.stopped.lock().push(ctx.id().to_string());
        }
    }

    struct StubApp;

    impl App for StubApp {
        fn generate_headers(&self, ctx: &Context) -> HashMap<String, String> {
            HashMap::from([("X-Context-Id".to_string(), ctx.id().to_string())])
        }

        fn process_bindings(&self, _ctx: &Context, mut bindings: Bindings) -> Bindings {
            bindings.insert("?processed".to_string(), json!(true));
            bindings
        }

        fn update_script_runtime(
            &self,
            ctx: &Context,
            runtime: &mut dyn ScriptRuntime,
        ) -> anyhow::Result<()> {
            let app_id = ctx.log_value("appId").unwrap_or_default();
            runtime.set_global("appId", app_id)
        }
    }

    #[derive(Default)]
    struct StubRuntime {
        globals: HashMap<String, serde_json::Value>,
    }

    impl ScriptRuntime for StubRuntime {
        fn set_global(&mut self, name: &str, value: serde_json::Value) -> anyhow::Result<()> {
            if name.is_empty() {
                anyhow::bail!("global name must not be empty");
            }
            self.globals.insert(name.to_string(), value);
            Ok(())
        }
    }

    struct CountingLayer(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CountingLayer {
        fn on_event(
            &self,
            _event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn count_events(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(CountingLayer(count.clone()));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_fork_gets_fresh_id() {
        let ctx = Context::new("app");
        let child = ctx.fork();
        let grandchild = child.fork();

        assert!(!child.id().is_empty());
        assert_ne!(ctx.id(), child.id());
        assert_ne!(child.id(), grandchild.id());
    }

    #[test]
    fn test_fork_copies_then_isolates_props() {
        let parent = Context::new("app");
        parent.add_prop("k", json!("v"));

        let child = parent.fork();
        assert_eq!(child.prop("k"), Some(json!("v")));

        child.add_prop("k", json!("v2"));
        child.add_prop("child_only", json!(1));
        assert_eq!(parent.prop("k"), Some(json!("v")));
        assert_eq!(parent.prop("child_only"), None);

        parent.add_prop("parent_late", json!(2));
        assert_eq!(child.prop("parent_late"), None);
    }

    #[test]
    fn test_fork_isolates_siblings() {
        let parent = Context::new("app");
        let a = parent.fork();
        let b = parent.fork();

        a.add_prop("k", json!("a"));
        b.set_log_value("who", json!("b"));

        assert_eq!(b.prop("k"), None);
        assert_eq!(a.log_value("who"), None);
    }

    #[test]
    fn test_fork_copies_log_props() {
        let parent = Context::new("app");
        parent.set_log_value("rule", json!("r1"));

        let child = parent.fork();
        child.set_log_value("rule", json!("r2"));

        assert_eq!(
            parent.log_props(),
            HashMap::from([
                ("appId".to_string(), json!("app")),
                ("rule".to_string(), json!("r1")),
            ])
        );
        assert_eq!(child.log_value("rule"), Some(json!("r2")));
        assert_eq!(child.log_value("appId"), Some(json!("app")));
    }

    #[test]
    fn test_fork_copies_location_into_own_slot() {
        let parent = Context::new("app");
        let here = parent.set_loc(Arc::new(Location::new("here")));

        let child = parent.fork();
        assert!(Arc::ptr_eq(&child.get_loc().unwrap(), &here));

        child.set_loc(Arc::new(Location::new("there")));
        assert_eq!(parent.get_loc().unwrap().name, "here");

        parent.clear_loc();
        assert_eq!(child.get_loc().unwrap().name, "there");
    }

    #[test]
    fn test_fork_copies_scalars() {
        let mut parent = Context::builder("app")
            .with_verbosity(LogLevel::Fine)
            .with_accumulator_level(LogLevel::Error)
            .build();
        parent.set_read_key("r");
        parent.set_write_key("w");

        let child = parent.fork();
        assert_eq!(child.verbosity(), LogLevel::Fine);
        assert_eq!(child.accumulator_level(), LogLevel::Error);
        assert_eq!(child.read_key(), "r");
        assert_eq!(child.write_key(), "w");
    }

    #[test]
    fn test_fork_copies_privilege_by_value() {
        let parent = Context::new("app");
        let grant = parent.grant_privilege("hooks");

        let child = parent.fork();
        assert!(child.is_privileged("hooks"));
        assert!(child.holds_privilege(&grant));

        parent.revoke_privilege();
        assert!(child.is_privileged("hooks"));

        let _ = parent.grant_privilege("late");
        assert!(!child.is_privileged("late"));
    }

    #[test]
    fn test_fork_shares_collaborators() {
        let acc = Arc::new(Accumulator::unbounded());
        let tracer: Arc<dyn Tracer> = Arc::new(RecordingTracer::default());
        let app: Arc<dyn App> = Arc::new(StubApp);
        let parent = Context::builder("app")
            .with_accumulator(acc.clone())
            .with_tracer(tracer.clone())
            .with_app(app.clone())
            .build();

        let child = parent.fork().fork();
        assert!(Arc::ptr_eq(child.accumulator().unwrap(), &acc));
        assert!(Arc::ptr_eq(child.tracer().unwrap(), &tracer));
        assert!(Arc::ptr_eq(child.app().unwrap(), &app));
        assert!(Arc::ptr_eq(child.cancellation(), parent.cancellation()));

        parent.cancellation().cancel("request aborted");
        assert!(child.cancellation().is_cancelled());
    }

    #[test]
    fn test_child_records_reach_shared_accumulator() {
        let acc = Arc::new(Accumulator::unbounded());
        let parent = Context::builder("app")
            .with_accumulator(acc.clone())
            .with_logger(Arc::new(crate::logging::BenchLogger))
            .build();

        let child = parent.fork();
        child.set_log_value("stage", json!("match"));
        child.record(LogLevel::Error, "failed", &[]);

        let records = acc.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].context_id, child.id());
        assert_eq!(records[0].metadata.get("stage"), Some(&json!("match")));
    }

    #[test]
    fn test_concurrent_add_prop_distinct_keys() {
        let ctx = Arc::new(Context::new("app"));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ctx = ctx.clone();
                std::thread::spawn(move || ctx.add_prop(format!("key_{i}"), json!(i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..16 {
            assert_eq!(ctx.prop(&format!("key_{i}")), Some(json!(i)));
        }
    }

    #[test]
    fn test_concurrent_readers_writers_and_forks() {
        let ctx = Arc::new(Context::new("app"));
        ctx.add_prop("shared", json!(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        match i % 3 {
                            0 => ctx.add_prop("shared", json!(j)),
                            1 => {
                                assert!(ctx.prop("shared").is_some());
                            }
                            _ => {
                                let child = ctx.fork();
                                child.add_prop("shared", json!(-1));
                                assert!(child.prop("shared").is_some());
                            }
                        }
                        ctx.set_loc(Arc::new(Location::new(format!("{i}-{j}"))));
                        assert!(ctx.get_loc().is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_ne!(ctx.prop("shared"), Some(json!(-1)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_children_in_tasks() {
        let root = Context::new("app");
        root.add_prop("request", json!("r-1"));

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let child = Arc::new(root.fork());
                tokio::spawn(async move {
                    child.add_prop("worker", json!(i));
                    tokio::task::yield_now().await;
                    (child.prop("request"), child.prop("worker"))
                })
            })
            .collect();

        for (i, task) in tasks.into_iter().enumerate() {
            let (request, worker) = task.await.unwrap();
            assert_eq!(request, Some(json!("r-1")));
            assert_eq!(worker, Some(json!(i)));
        }
        assert_eq!(root.prop("worker"), None);
    }

    #[test]
    fn test_start_span_without_tracer_forks() {
        let ctx = Context::new("app");
        let child = ctx.start_span("op");
        assert_ne!(child.id(), ctx.id());
        child.stop_span();
    }

    #[test]
    fn test_span_pairing_calls_tracer_once_each() {
        let tracer = Arc::new(RecordingTracer::default());
        let ctx = Context::builder("app").with_tracer(tracer.clone()).build();

        let child = ctx.start_span("op");
        assert_ne!(child.id(), ctx.id());
        assert_eq!(
            *tracer.started.lock(),
            vec![(child.id().to_string(), "op".to_string())]
        );
        assert_eq!(child.log_value("span"), Some(json!("op")));
        assert_eq!(ctx.log_value("span"), None);
        assert!(tracer.stopped.lock().is_empty());

        child.stop_span();
        assert_eq!(*tracer.stopped.lock(), vec![child.id().to_string()]);
    }

    #[test]
    fn test_span_guard_stops_on_drop() {
        let tracer = Arc::new(RecordingTracer::default());
        let ctx = Context::builder("app").with_tracer(tracer.clone()).build();

        let span_id = {
            let guard = ctx.span("guarded");
            guard.add_prop("inside", json!(true));
            guard.id().to_string()
        };

        assert_eq!(*tracer.stopped.lock(), vec![span_id]);
        assert_eq!(ctx.prop("inside"), None);
    }

    #[test]
    fn test_app_reached_through_context() {
        let ctx = Context::builder("rules").with_app(Arc::new(StubApp)).build();

        let headers = ctx.generate_headers();
        assert_eq!(headers.get("X-Context-Id"), Some(&ctx.id().to_string()));

        let bindings = ctx.process_bindings(Bindings::new());
        assert_eq!(bindings.get("?processed"), Some(&json!(true)));

        let mut runtime = StubRuntime::default();
        ctx.app()
            .unwrap()
            .update_script_runtime(&ctx, &mut runtime)
            .unwrap();
        assert_eq!(runtime.globals.get("appId"), Some(&json!("rules")));
    }

    #[test]
    fn test_bench_context_is_silent() {
        let ctx = Context::for_bench("bench");
        assert_eq!(ctx.verbosity(), LogLevel::Nothing);

        let events = count_events(|| {
            for level in LogLevel::ALL {
                ctx.log(level, "op", &[json!("x")]);
                ctx.record(level, "op", &[json!("x")]);
            }
        });
        assert_eq!(events, 0);
    }

    #[test]
    fn test_default_context_logs_through_tracing() {
        let ctx = Context::new("app");
        let events = count_events(|| ctx.log(LogLevel::Warn, "op", &[]));
        assert_eq!(events, 1);
    }
}
