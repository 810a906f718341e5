//! Background tasks and their handoff back to the UI thread.
//!
//! `run` spawns a detached worker per task. The worker owns the task and its
//! completion callback; when the task returns, both travel to the UI thread
//! as one `Completion` through the queue. The UI loop calls `take_ready`
//! once per tick and applies each completion there, so callbacks never run
//! concurrently with other UI work.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TaskId(u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// UI-side state a completion is applied to.
pub(crate) trait TaskHost: 'static {
    /// Called in place of the completion when the task panicked.
    fn task_panicked(&mut self, name: &'static str);
}

type ApplyFn<C> = Box<dyn FnOnce(&mut C) + Send>;

pub(crate) struct Completion<C> {
    id: TaskId,
    name: &'static str,
    apply: ApplyFn<C>,
}

impl<C> Completion<C> {
    pub(crate) fn apply(self, ctx: &mut C) {
        tracing::debug!(task = %self.id, name = self.name, "applying completion");
        (self.apply)(ctx);
    }
}

pub(crate) struct TaskDispatcher<C> {
    tx: Sender<Completion<C>>,
    rx: Receiver<Completion<C>>,
    next_id: AtomicU64,
    in_flight: AtomicUsize,
}

impl<C: TaskHost> TaskDispatcher<C> {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            next_id: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Runs `task` on a new worker thread; `on_complete` later runs on the
    /// thread that calls `take_ready`.
    pub(crate) fn run<T, F, D>(&self, name: &'static str, task: F, on_complete: D) -> TaskId
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        D: FnOnce(&mut C, T) + Send + 'static,
    {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let tx = self.tx.clone();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(task = %id, name, "dispatching task");

        std::thread::spawn(move || {
            let apply: ApplyFn<C> = match catch_unwind(AssertUnwindSafe(task)) {
                Ok(value) => Box::new(move |ctx: &mut C| on_complete(ctx, value)),
                Err(_) => {
                    tracing::error!(task = %id, name, "task panicked");
                    Box::new(move |ctx: &mut C| ctx.task_panicked(name))
                }
            };
            // The receiver lives as long as the dispatcher; a failed send
            // only happens during shutdown.
            let _ = tx.send(Completion { id, name, apply });
        });
        id
    }

    /// Completions that arrived since the last call, in arrival order.
    pub(crate) fn take_ready(&self) -> Vec<Completion<C>> {
        let ready: Vec<Completion<C>> = self.rx.try_iter().collect();
        if !ready.is_empty() {
            self.in_flight.fetch_sub(ready.len(), Ordering::SeqCst);
        }
        ready
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn wait_ready(&self, timeout: std::time::Duration) -> Option<Completion<C>> {
        let completion = self.rx.recv_timeout(timeout).ok()?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct Log {
        lines: Vec<String>,
        panicked: Vec<&'static str>,
    }

    impl TaskHost for Log {
        fn task_panicked(&mut self, name: &'static str) {
            self.panicked.push(name);
        }
    }

    #[test]
    fn completion_runs_once_after_task() {
        let dispatcher = TaskDispatcher::<Log>::new();
        let mut log = Log::default();

        dispatcher.run("double", || 21 * 2, |log: &mut Log, v| {
            log.lines.push(format!("got {v}"));
        });
        // Counted until the UI thread picks the completion up.
        assert_eq!(dispatcher.in_flight(), 1);
        let completion = dispatcher
            .wait_ready(Duration::from_secs(5))
            .expect("completion delivered");
        completion.apply(&mut log);

        assert_eq!(log.lines, vec!["got 42".to_string()]);
        assert!(dispatcher.take_ready().is_empty());
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn completions_are_applied_on_the_draining_thread() {
        let dispatcher = TaskDispatcher::<Log>::new();
        let mut log = Log::default();
        let ui_thread = std::thread::current().id();

        dispatcher.run(
            "where",
            move || std::thread::current().id() != ui_thread,
            move |log: &mut Log, ran_elsewhere| {
                assert!(ran_elsewhere);
                assert_eq!(std::thread::current().id(), ui_thread);
                log.lines.push("done".to_string());
            },
        );
        dispatcher
            .wait_ready(Duration::from_secs(5))
            .expect("completion delivered")
            .apply(&mut log);
        assert_eq!(log.lines, vec!["done".to_string()]);
    }

    #[test]
    fn panicking_task_reports_instead_of_completing() {
        let dispatcher = TaskDispatcher::<Log>::new();
        let mut log = Log::default();

        dispatcher.run(
            "boom",
            || -> u32 { panic!("task failure") },
            |log: &mut Log, _| log.lines.push("unreachable".to_string()),
        );
        dispatcher
            .wait_ready(Duration::from_secs(5))
            .expect("panic reported")
            .apply(&mut log);

        assert!(log.lines.is_empty());
        assert_eq!(log.panicked, vec!["boom"]);
    }
}
