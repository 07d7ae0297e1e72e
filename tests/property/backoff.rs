//! Property tests for retry backoff.
//!
//! Invariants tested:
//! - Exponential delay before retry n is base * 2^n
//! - A delay list shorter than the retry count reuses its last entry
//! - Settings with retries below one never run out

use faultline_core::{HttpMethod, HttpRequest, HttpResponse, PolicyError};
use faultline_policy::{DefaultPolicyFactory, PolicyFactory};
use faultline_retry::Backoff;
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Builder;
use tower::ServiceExt;
use tower::util::BoxCloneService;

proptest! {
    #[test]
    fn exponential_doubles(retry in 1u32..=20) {
        let backoff = Backoff::Exponential { base: Duration::from_secs(1) };
        prop_assert_eq!(backoff.delay_for(retry), Duration::from_secs(1u64 << retry));
    }

    #[test]
    fn schedule_reuses_last_delay(
        delays in prop::collection::vec(0u64..10_000, 1..8),
        retry in 1u32..64,
    ) {
        let schedule: Vec<_> = delays.iter().map(|&ms| Duration::from_millis(ms)).collect();
        let backoff = Backoff::Schedule(schedule);

        let index = (retry as usize - 1).min(delays.len() - 1);
        prop_assert_eq!(backoff.delay_for(retry), Duration::from_millis(delays[index]));
    }

    #[test]
    fn immediate_never_waits(retry in 0u32..1000) {
        prop_assert_eq!(Backoff::Immediate.delay_for(retry), Duration::ZERO);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: retries < 1 keep going for as long as the call keeps failing
    #[test]
    fn retries_below_one_run_forever(retries in -5i32..=0, failures in 1usize..300) {
        let rt = Builder::new_current_thread().enable_time().start_paused(true).build().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let inner = BoxCloneService::new(tower::service_fn(move |_req: HttpRequest| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < failures {
                        Err(PolicyError::transport("refused"))
                    } else {
                        Ok(HttpResponse::new(200))
                    }
                }
            }));

            let setting = format!(r#"{{"type":"Retry","policy":{{"retries":{retries}}}}}"#);
            let retry = DefaultPolicyFactory::new()
                .create("forever", &setting)
                .unwrap()
                .unwrap();
            let request = HttpRequest::new(
                HttpMethod::Get,
                url::Url::parse("http://backend.test/").unwrap(),
            );

            let response = retry.wrap(inner).oneshot(request).await.unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(calls.load(Ordering::SeqCst), failures + 1);
        });
    }
}
