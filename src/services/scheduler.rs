use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::services::fetch_service::FetchService;

/// Runs a fetch cycle immediately and then every `interval`.
///
/// Each cycle runs in its own task so a panic inside discovery or a store
/// client is contained. After a failed cycle the loop sleeps for `cooldown`
/// and then resumes the regular cadence. Cycles never overlap.
pub fn spawn_fetch_scheduler(
    fetch: FetchService,
    interval: Duration,
    cooldown: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let job = fetch.clone();
            let handle = tokio::spawn(async move { job.fetch_and_persist().await });

            match handle.await {
                Ok(Ok(outcome)) => {
                    info!(
                        target: "scheduler",
                        saved = outcome.saved_count,
                        failed = outcome.failed_count,
                        skipped = outcome.skipped_count,
                        "scheduled fetch finished"
                    );
                }
                Ok(Err(e)) => {
                    error!(target: "scheduler", error = %e, "scheduled fetch failed");
                    tokio::time::sleep(cooldown).await;
                }
                Err(e) => {
                    error!(target: "scheduler", error = %e, "scheduled fetch panicked");
                    tokio::time::sleep(cooldown).await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::models::opportunity::{sample, OpportunityList};
    use crate::services::discovery_service::DiscoveryPipeline;
    use crate::services::fetch_service::LinkPolicy;
    use crate::services::link_validator::MockLinkChecker;
    use crate::services::opportunity_store::MemoryOpportunityStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Fails on the first call, panics on the second, then succeeds.
    struct Unreliable {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DiscoveryPipeline for Unreliable {
        async fn discover(&self) -> Result<OpportunityList> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(Error::Pipeline("search quota exhausted".into())),
                1 => panic!("scraper blew up"),
                n => Ok(OpportunityList {
                    opportunities: vec![sample(
                        &format!("Grant {n}"),
                        &format!("https://fund.example/{n}"),
                    )],
                }),
            }
        }
    }

    #[tokio::test]
    async fn keeps_running_after_errors_and_panics() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryOpportunityStore::new());
        let mut links = MockLinkChecker::new();
        links.expect_is_valid_link().returning(|_| true);

        let fetch = FetchService::new(
            Arc::new(Unreliable {
                calls: calls.clone(),
            }),
            Arc::new(links),
            store.clone(),
            LinkPolicy::Flag,
            Duration::from_secs(5),
        );

        let handle =
            spawn_fetch_scheduler(fetch, Duration::from_millis(20), Duration::from_millis(10));

        let mut waited = 0;
        while store.len().await < 2 && waited < 200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        handle.abort();

        assert!(calls.load(Ordering::SeqCst) >= 4);
        assert!(store.len().await >= 2);
    }

    /// Records when each discovery ran; the first `failures` runs fail.
    #[derive(Clone)]
    struct Timed {
        runs: Arc<Mutex<Vec<Instant>>>,
        failures: usize,
    }

    impl Timed {
        fn new(failures: usize) -> Self {
            Self {
                runs: Arc::new(Mutex::new(Vec::new())),
                failures,
            }
        }

        fn runs(&self) -> Vec<Instant> {
            self.runs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DiscoveryPipeline for Timed {
        async fn discover(&self) -> Result<OpportunityList> {
            let n = {
                let mut runs = self.runs.lock().unwrap();
                runs.push(Instant::now());
                runs.len()
            };
            if n <= self.failures {
                return Err(Error::Pipeline("model overloaded".into()));
            }
            Ok(OpportunityList::default())
        }
    }

    fn fetch_for(pipeline: Timed) -> FetchService {
        FetchService::new(
            Arc::new(pipeline),
            Arc::new(MockLinkChecker::new()),
            Arc::new(MemoryOpportunityStore::new()),
            LinkPolicy::Flag,
            Duration::from_secs(5),
        )
    }

    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_runs_at_startup_then_on_the_interval() {
        let start = Instant::now();
        let pipeline = Timed::new(0);
        let handle = spawn_fetch_scheduler(
            fetch_for(pipeline.clone()),
            Duration::from_secs(30 * 60),
            Duration::from_secs(60),
        );

        settle().await;
        assert_eq!(pipeline.runs(), vec![start]);

        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        settle().await;
        assert_eq!(pipeline.runs().len(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;
        let runs = pipeline.runs();
        assert_eq!(runs.len(), 2);
        assert!(runs[1] - start >= Duration::from_secs(30 * 60));
        assert!(runs[1] - start <= Duration::from_secs(30 * 60 + 61));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_waits_for_the_cooldown() {
        let pipeline = Timed::new(1);
        let handle = spawn_fetch_scheduler(
            fetch_for(pipeline.clone()),
            Duration::from_secs(10),
            Duration::from_secs(60),
        );

        while pipeline.runs().len() < 3 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        handle.abort();

        let runs = pipeline.runs();
        // The failed first run holds the loop back for the whole cooldown,
        // the successful second run does not.
        assert!(runs[1] - runs[0] >= Duration::from_secs(60));
        assert!(runs[2] - runs[1] >= Duration::from_secs(10));
        assert!(runs[2] - runs[1] < Duration::from_secs(60));
    }
}
