//! Incremental parsing pipeline.
//!
//! One background worker keeps every line's [`LineDescription`] consistent with the line's text
//! and with the end context of its predecessor:
//!
//! ```text
//! enqueue(line) → worker: snapshot(text, revision, begin)
//!               → tokenize (no locks held)
//!               → store if revision unchanged → notify Parsed
//!               → hand end context to next line (compare-and-retry)
//!               → enqueue next line if its context changed or it is unparsed
//! ```
//!
//! There is no cancellation: an edit bumps the line's revision, and a description computed
//! against an older revision is simply refused when the worker tries to store it.

use crate::document::{Document, LineStore};
use crate::lexer::{LineContext, LineDescription, LineTokenizer};
use crate::line::{Line, LineChange, LineChangeKind};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Arc<Line>>,
    busy: bool,
    shutdown: bool,
}

struct Shared {
    store: Arc<LineStore>,
    tokenizer: Arc<dyn LineTokenizer>,
    queue: Mutex<QueueState>,
    wake: Condvar,
    idle: Condvar,
}

/// Background tokenization of dirty lines.
pub struct ParsingPipeline {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ParsingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsingPipeline")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ParsingPipeline {
    /// Start a worker for `document`'s lines.
    ///
    /// The pipeline follows the document across [`Document::set_text`]; it must not outlive
    /// the document's use.
    pub fn new(document: &Document, tokenizer: Arc<dyn LineTokenizer>) -> Self {
        let shared = Arc::new(Shared {
            store: document.store().clone(),
            tokenizer,
            queue: Mutex::new(QueueState::default()),
            wake: Condvar::new(),
            idle: Condvar::new(),
        });
        let worker = {
            let shared = shared.clone();
            thread::spawn(move || shared.run())
        };
        debug!("parsing worker started");
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Schedule `line` for (re)tokenization. Never blocks on the worker.
    pub fn enqueue(&self, line: Arc<Line>) {
        self.shared.enqueue(line);
    }

    /// Schedule a line whose begin context may still be unknown.
    ///
    /// Walks upward assuming each unresolved line starts inside a block comment until either a
    /// line with a known context is found (that line is rescheduled and its propagation will
    /// arrive) or a line whose speculative end context is plain. In the latter case the line
    /// below it is assumed to start in plain code and scheduled; the real context replaces the
    /// assumption once propagation from above reaches it.
    pub fn enqueue_with_assumption(&self, line: Arc<Line>) {
        if line.begin_context().is_some() {
            self.enqueue(line);
            return;
        }

        let resume = {
            let lines = self.shared.store.read();
            let mut index = line.index();
            if !lines.get(index).is_some_and(|l| Arc::ptr_eq(l, &line)) {
                return;
            }
            let mut resume = line;
            while index > 0 {
                let prev = &lines[index - 1];
                if prev.begin_context().is_some() {
                    trace!(line = index - 1, "assumption walk reached a resolved line");
                    self.shared.enqueue(prev.clone());
                    return;
                }
                let assumed = self
                    .shared
                    .tokenize(&prev.text(), LineContext::InBlockComment)
                    .map(|description| description.end_context());
                if assumed == Some(LineContext::Plain) {
                    break;
                }
                resume = prev.clone();
                index -= 1;
            }
            resume
        };

        trace!(line = resume.index(), "assuming plain context");
        if resume
            .compare_and_set_begin_context(None, LineContext::Plain)
            .is_ok_and(|changed| changed)
        {
            self.shared.store.notify(&[LineChange {
                line: resume.index(),
                kind: LineChangeKind::Invalidated,
            }]);
        }
        self.enqueue(resume);
    }

    /// Number of lines waiting for the worker.
    pub fn pending(&self) -> usize {
        self.shared.lock_queue().pending.len()
    }

    /// Block until the queue is empty and the worker is idle, or the worker has stopped.
    pub fn wait_idle(&self) {
        let mut queue = self.shared.lock_queue();
        while !queue.shutdown && (queue.busy || !queue.pending.is_empty()) {
            queue = self
                .shared
                .idle
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for ParsingPipeline {
    fn drop(&mut self) {
        {
            let mut queue = self.shared.lock_queue();
            queue.shutdown = true;
            queue.pending.clear();
        }
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("parsing worker terminated abnormally");
        }
        debug!("parsing worker stopped");
    }
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&self, line: Arc<Line>) {
        {
            let mut queue = self.lock_queue();
            if queue.shutdown {
                return;
            }
            queue.pending.push_back(line);
        }
        self.wake.notify_one();
    }

    fn next_job(&self) -> Option<Arc<Line>> {
        let mut queue = self.lock_queue();
        loop {
            if queue.shutdown {
                return None;
            }
            if let Some(line) = queue.pending.pop_front() {
                queue.busy = true;
                return Some(line);
            }
            if queue.busy {
                queue.busy = false;
                self.idle.notify_all();
            }
            queue = self
                .wake
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn run(&self) {
        let _guard = WorkerGuard(self);
        while let Some(line) = self.next_job() {
            self.process(&line);
        }
    }

    /// Deliver notifications from the worker. A panicking observer is logged and the worker
    /// carries on.
    fn notify(&self, change: LineChange) {
        if catch_unwind(AssertUnwindSafe(|| self.store.notify(&[change]))).is_err() {
            error!(line = change.line, kind = ?change.kind, "line observer panicked");
        }
    }

    fn tokenize(&self, text: &str, begin: LineContext) -> Option<LineDescription> {
        match catch_unwind(AssertUnwindSafe(|| self.tokenizer.tokenize(text, begin))) {
            Ok(description) => Some(description),
            Err(_) => {
                error!(len = text.len(), "tokenizer panicked; line left without a description");
                None
            }
        }
    }

    fn process(&self, line: &Arc<Line>) {
        let snapshot = line.snapshot();
        if snapshot.detached {
            trace!(line = line.index(), "line was removed, skipping");
            return;
        }
        let Some(begin) = snapshot.begin else {
            trace!(line = line.index(), "begin context unknown, skipping");
            return;
        };

        let mut fallback = None;
        if !snapshot.parsed {
            match self.tokenize(&snapshot.text, begin) {
                Some(description) => {
                    if !line.store_description(snapshot.revision, description) {
                        trace!(line = line.index(), "line changed while tokenizing, result dropped");
                        return;
                    }
                    self.notify(LineChange {
                        line: line.index(),
                        kind: LineChangeKind::Parsed,
                    });
                }
                // The failed line stays unstyled and passes its begin context through.
                None => fallback = Some(begin),
            }
        }

        self.propagate(line, fallback);
    }

    /// Hand `line`'s end context (or `fallback` when it has no description) to its successor.
    fn propagate(&self, line: &Arc<Line>, fallback: Option<LineContext>) {
        let follow_up = {
            let lines = self.store.read();
            let index = line.index();
            if !lines.get(index).is_some_and(|l| Arc::ptr_eq(l, line)) {
                trace!(line = index, "line was removed, not propagating");
                return;
            }
            let Some(end) = line.end_context().or(fallback) else {
                return;
            };
            let Some(next) = lines.get(index + 1) else {
                return;
            };

            // `end` cannot go stale while the store read lock is held: edits to `line` need the
            // write lock. Only the successor's context can race (with the assumption walk), so
            // the retry just re-reads it and stores `end` again.
            let mut expected = next.begin_context();
            let changed = loop {
                match next.compare_and_set_begin_context(expected, end) {
                    Ok(changed) => break changed,
                    Err(observed) => expected = observed,
                }
            };
            (changed || next.description().is_none()).then(|| (next.clone(), changed))
        };

        if let Some((next, changed)) = follow_up {
            if changed {
                trace!(line = next.index(), context = ?next.begin_context(), "begin context updated");
                self.notify(LineChange {
                    line: next.index(),
                    kind: LineChangeKind::Invalidated,
                });
            }
            self.enqueue(next);
        }
    }
}

/// Marks the worker idle when it leaves its loop. If the worker dies, the queue is closed so
/// waiters are released.
struct WorkerGuard<'a>(&'a Shared);

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        let mut queue = self.0.lock_queue();
        queue.busy = false;
        if thread::panicking() {
            error!("parsing worker died; closing the queue");
            queue.shutdown = true;
            queue.pending.clear();
        }
        self.0.idle.notify_all();
    }
}
