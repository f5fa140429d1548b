//! Deadline-bounded policy wrapper.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{FormatChoiceRequest, FormatPolicy};
use crate::types::{ConnectionFormat, Route, SinkId, SourceId};

/// Owned copy of a [`FormatChoiceRequest`] plus its answer channel.
struct Job {
    source_id: SourceId,
    sink_id: SinkId,
    route: Route,
    candidates: Vec<ConnectionFormat>,
    reply: mpsc::Sender<Vec<ConnectionFormat>>,
}

#[derive(Debug)]
struct Worker {
    jobs: mpsc::Sender<Job>,
    /// Answer channel of a decision that missed its deadline.
    overdue: Option<mpsc::Receiver<Vec<ConnectionFormat>>>,
}

/// Runs an inner policy on a worker thread and waits at most `timeout`.
///
/// A policy that does not answer in time is treated as having returned an
/// empty list, which vetoes the hop. Decisions are serialized on a single
/// worker. While that worker is still busy with an overdue decision, each
/// new decision first waits up to `timeout` for it to finish and is vetoed
/// if it does not; no second worker is started. A policy that hangs for
/// good therefore costs one thread, not one per call.
#[derive(Debug)]
pub struct BoundedPolicy<P> {
    inner: Arc<P>,
    timeout: Duration,
    worker: Mutex<Option<Worker>>,
}

impl<P> BoundedPolicy<P>
where
    P: FormatPolicy + Send + Sync + 'static,
{
    /// Wrap `inner` with a deadline.
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
            worker: Mutex::new(None),
        }
    }

    fn spawn_worker(&self) -> std::io::Result<Worker> {
        let (jobs, queue) = mpsc::channel::<Job>();
        let inner = Arc::clone(&self.inner);
        std::thread::Builder::new()
            .name("format-policy".into())
            .spawn(move || {
                // ends once the policy and its sender are dropped
                for job in queue {
                    let answer = inner.choose_formats(&FormatChoiceRequest {
                        source_id: job.source_id,
                        sink_id: job.sink_id,
                        route: &job.route,
                        candidates: &job.candidates,
                    });
                    // receiver is gone after a timeout
                    let _ = job.reply.send(answer);
                }
            })?;
        Ok(Worker { jobs, overdue: None })
    }
}

impl<P> FormatPolicy for BoundedPolicy<P>
where
    P: FormatPolicy + Send + Sync + 'static,
{
    fn choose_formats(&self, request: &FormatChoiceRequest<'_>) -> Vec<ConnectionFormat> {
        let source_id = request.source_id;
        let sink_id = request.sink_id;
        let timeout_ms = self.timeout.as_millis() as u64;
        let mut slot = self.worker.lock();

        let mut stopped = false;
        if let Some(worker) = slot.as_mut() {
            if let Some(overdue) = worker.overdue.take() {
                match overdue.recv_timeout(self.timeout) {
                    Ok(_) => tracing::debug!(%source_id, %sink_id, "Late format decision discarded"),
                    Err(RecvTimeoutError::Timeout) => {
                        worker.overdue = Some(overdue);
                        tracing::warn!(
                            %source_id,
                            %sink_id,
                            timeout_ms,
                            "Format policy still busy with an earlier decision, treating as veto"
                        );
                        return Vec::new();
                    }
                    Err(RecvTimeoutError::Disconnected) => stopped = true,
                }
            }
        }
        if stopped {
            *slot = None;
        }

        if slot.is_none() {
            match self.spawn_worker() {
                Ok(worker) => *slot = Some(worker),
                Err(e) => {
                    tracing::warn!(error = %e, %source_id, %sink_id, "Format policy thread failed to start");
                    return Vec::new();
                }
            }
        }
        let Some(worker) = slot.as_mut() else {
            return Vec::new();
        };

        let (reply, answer) = mpsc::channel();
        let job = Job {
            source_id,
            sink_id,
            route: request.route.clone(),
            candidates: request.candidates.to_vec(),
            reply,
        };
        if worker.jobs.send(job).is_err() {
            *slot = None;
            tracing::warn!(%source_id, %sink_id, "Format policy worker stopped, treating as veto");
            return Vec::new();
        }

        match answer.recv_timeout(self.timeout) {
            Ok(formats) => formats,
            Err(RecvTimeoutError::Timeout) => {
                worker.overdue = Some(answer);
                tracing::warn!(%source_id, %sink_id, timeout_ms, "Format policy timed out, treating as veto");
                Vec::new()
            }
            Err(RecvTimeoutError::Disconnected) => {
                *slot = None;
                tracing::warn!(%source_id, %sink_id, "Format policy worker stopped, treating as veto");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{from_fn, AcceptAll};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ask<P: FormatPolicy>(policy: &P) -> Vec<ConnectionFormat> {
        let route = Route::new(SourceId::new(1), SinkId::new(1), Vec::new());
        policy.choose_formats(&FormatChoiceRequest {
            source_id: SourceId::new(1),
            sink_id: SinkId::new(1),
            route: &route,
            candidates: &[ConnectionFormat::MONO, ConnectionFormat::STEREO],
        })
    }

    #[test]
    fn test_answer_within_deadline() {
        let policy = BoundedPolicy::new(AcceptAll, Duration::from_secs(5));
        assert_eq!(ask(&policy), vec![ConnectionFormat::MONO, ConnectionFormat::STEREO]);
        assert_eq!(ask(&policy), vec![ConnectionFormat::MONO, ConnectionFormat::STEREO]);
    }

    #[test]
    fn test_timeout_vetoes() {
        let slow = from_fn(|req: &FormatChoiceRequest<'_>| {
            std::thread::sleep(Duration::from_millis(500));
            req.candidates.to_vec()
        });
        let policy = BoundedPolicy::new(slow, Duration::from_millis(10));
        assert!(ask(&policy).is_empty());
    }

    #[test]
    fn test_hung_policy_holds_a_single_worker() {
        let (release, gate) = mpsc::channel::<()>();
        let gate = Mutex::new(gate);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let hanging = from_fn(move |req: &FormatChoiceRequest<'_>| {
            seen.fetch_add(1, Ordering::SeqCst);
            // blocks until the test drops `release`
            let _ = gate.lock().recv();
            req.candidates.to_vec()
        });
        let policy = BoundedPolicy::new(hanging, Duration::from_millis(100));

        for _ in 0..4 {
            assert!(ask(&policy).is_empty());
        }
        // every later call waited on the stuck worker instead of starting another
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(release);
        assert_eq!(ask(&policy), vec![ConnectionFormat::MONO, ConnectionFormat::STEREO]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_policy_is_replaced() {
        let calls = AtomicUsize::new(0);
        let flaky = from_fn(move |req: &FormatChoiceRequest<'_>| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("controller crashed");
            }
            req.candidates.to_vec()
        });
        let policy = BoundedPolicy::new(flaky, Duration::from_secs(5));

        assert!(ask(&policy).is_empty());
        assert_eq!(ask(&policy), vec![ConnectionFormat::MONO, ConnectionFormat::STEREO]);
    }
}
