//! Concurrent fan-out execution under a shared deadline
//!
//! One task per source, all joined under one timeout. A source's failure is
//! captured into its own outcome and never propagates to its neighbors; a
//! slow source cannot delay the others beyond the shared deadline, and
//! whatever is still pending when the deadline lapses is aborted.

use super::{InvocationOutcome, SourceCandidate};
use crate::error::{Error, Result};
use crate::oracle::SourceInvoker;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Executes ranked source lists concurrently, one outcome per input source
pub struct FanOutExecutor {
    invoker: Arc<dyn SourceInvoker>,
}

impl FanOutExecutor {
    /// Create an executor over the given invoker
    pub fn new(invoker: Arc<dyn SourceInvoker>) -> Self {
        Self { invoker }
    }

    /// Invoke every source concurrently under `shared_timeout`.
    ///
    /// Returns one outcome per input source, in input order, regardless of
    /// completion order. This wrapper is fail-closed: if the shared deadline
    /// elapses before the whole batch finishes, the batch's results —
    /// including invocations that already completed — are discarded and an
    /// empty list is returned. Callers that prefer the typed error can use
    /// [`try_gather`](Self::try_gather).
    pub async fn gather(
        &self,
        sources: &[SourceCandidate],
        query: &str,
        shared_timeout: Duration,
    ) -> Vec<InvocationOutcome> {
        match self.try_gather(sources, query, shared_timeout).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::warn!(
                    sources = sources.len(),
                    "Fan-out batch discarded: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Like [`gather`](Self::gather) but surfaces [`Error::BatchTimeout`]
    /// when the shared deadline is exceeded.
    pub async fn try_gather(
        &self,
        sources: &[SourceCandidate],
        query: &str,
        shared_timeout: Duration,
    ) -> Result<Vec<InvocationOutcome>> {
        let tasks: Vec<_> = sources
            .iter()
            .map(|source| {
                let invoker = self.invoker.clone();
                let source = source.clone();
                let query = query.to_string();
                tokio::spawn(async move {
                    let started = Instant::now();
                    match invoker
                        .invoke(&source.source_id, &source.endpoint_ref, &query, shared_timeout)
                        .await
                    {
                        Ok(payload) => InvocationOutcome::success(
                            source.source_id,
                            payload,
                            started.elapsed().as_millis() as u64,
                        ),
                        Err(e) => {
                            tracing::debug!(
                                source_id = %source.source_id,
                                "Source invocation failed: {}",
                                e
                            );
                            InvocationOutcome::failure(
                                source.source_id,
                                e.to_string(),
                                started.elapsed().as_millis() as u64,
                            )
                        }
                    }
                })
            })
            .collect();

        let abort_handles: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();

        let joined = match tokio::time::timeout(shared_timeout, join_all(tasks)).await {
            Ok(joined) => joined,
            Err(_) => {
                // The deadline cancels every still-pending invocation;
                // nothing keeps running in the background
                for handle in abort_handles {
                    handle.abort();
                }
                return Err(Error::BatchTimeout(shared_timeout.as_millis() as u64));
            }
        };

        // join_all preserves input order; a panicked task becomes a failed
        // outcome for its slot
        Ok(joined
            .into_iter()
            .zip(sources)
            .map(|(result, source)| match result {
                Ok(outcome) => outcome,
                Err(e) => InvocationOutcome::failure(
                    source.source_id.clone(),
                    format!("invocation task aborted: {}", e),
                    0,
                ),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Invoker scripted per source id: "fail-*" errors, "slow-*" hangs
    struct ScriptedInvoker;

    #[async_trait]
    impl SourceInvoker for ScriptedInvoker {
        async fn invoke(
            &self,
            source_id: &str,
            _endpoint_ref: &str,
            query: &str,
            _timeout: Duration,
        ) -> Result<serde_json::Value> {
            if source_id.starts_with("fail") {
                return Err(Error::Oracle(format!("{source_id} is down")));
            }
            if source_id.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(serde_json::json!({ "source": source_id, "query": query }))
        }
    }

    fn candidate(id: &str) -> SourceCandidate {
        SourceCandidate {
            source_id: id.to_string(),
            display_name: id.to_string(),
            endpoint_ref: format!("ref-{id}"),
            verified: true,
            baseline_priority: 1.0,
        }
    }

    #[tokio::test]
    async fn test_order_preserved_with_partial_failure() {
        let executor = FanOutExecutor::new(Arc::new(ScriptedInvoker));
        let sources = vec![candidate("ok-1"), candidate("fail-2"), candidate("ok-3")];

        let outcomes = executor
            .gather(&sources, "q", Duration::from_secs(5))
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].source_id, "ok-1");
        assert_eq!(outcomes[1].source_id, "fail-2");
        assert_eq!(outcomes[2].source_id, "ok-3");
        assert!(outcomes[0].succeeded);
        assert!(!outcomes[1].succeeded);
        assert!(outcomes[2].succeeded);
        assert!(outcomes[1].error_detail.as_deref().unwrap().contains("down"));
    }

    #[tokio::test]
    async fn test_timeout_aborts_pending_invocations() {
        use std::sync::atomic::{AtomicBool, Ordering};

        // Invoker that flags completion after a sleep well past the deadline
        struct LaggingInvoker {
            completed: Arc<AtomicBool>,
        }

        #[async_trait]
        impl SourceInvoker for LaggingInvoker {
            async fn invoke(
                &self,
                _: &str,
                _: &str,
                _: &str,
                _: Duration,
            ) -> Result<serde_json::Value> {
                tokio::time::sleep(Duration::from_millis(200)).await;
                self.completed.store(true, Ordering::SeqCst);
                Ok(serde_json::json!({}))
            }
        }

        let completed = Arc::new(AtomicBool::new(false));
        let executor = FanOutExecutor::new(Arc::new(LaggingInvoker {
            completed: completed.clone(),
        }));

        let outcomes = executor
            .gather(&[candidate("lagging")], "q", Duration::from_millis(50))
            .await;
        assert!(outcomes.is_empty());

        // Had the task survived the deadline it would flag completion here
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!completed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_batch_timeout_fails_closed() {
        let executor = FanOutExecutor::new(Arc::new(ScriptedInvoker));
        let sources = vec![candidate("ok-1"), candidate("slow-2")];

        let outcomes = executor
            .gather(&sources, "q", Duration::from_millis(100))
            .await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_try_gather_surfaces_timeout() {
        let executor = FanOutExecutor::new(Arc::new(ScriptedInvoker));
        let sources = vec![candidate("slow-1")];

        let err = executor
            .try_gather(&sources, "q", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BatchTimeout(50)));
    }

    #[tokio::test]
    async fn test_empty_source_list() {
        let executor = FanOutExecutor::new(Arc::new(ScriptedInvoker));
        let outcomes = executor.gather(&[], "q", Duration::from_secs(1)).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_elapsed_recorded_on_failure() {
        let executor = FanOutExecutor::new(Arc::new(ScriptedInvoker));
        let sources = vec![candidate("fail-1")];

        let outcomes = executor
            .gather(&sources, "q", Duration::from_secs(5))
            .await;
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].succeeded);
        // Elapsed is recorded regardless of success
        assert!(outcomes[0].elapsed_ms < 5_000);
    }
}
