use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vchain_client::RateLimiter;

#[tokio::test(start_paused = true)]
async fn test_concurrent_grants_are_spaced() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));
    let grants = Arc::new(Mutex::new(Vec::new()));
    let cancel = CancellationToken::new();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let limiter = limiter.clone();
        let grants = grants.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire(&cancel).await.unwrap();
            grants.lock().unwrap().push(Instant::now());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut grants = grants.lock().unwrap().clone();
    grants.sort();
    assert_eq!(grants.len(), 5);
    for pair in grants.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_waiters_served_in_arrival_order() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));
    let order = Arc::new(Mutex::new(Vec::new()));
    let cancel = CancellationToken::new();

    let first = limiter.acquire(&cancel).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let limiter = limiter.clone();
        let order = order.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire(&cancel).await.unwrap();
            order.lock().unwrap().push(i);
        }));
        // Let each waiter enqueue before the next one arrives.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    drop(first);
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_waiter_does_not_consume_grant() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));
    let start = Instant::now();

    let held = limiter.acquire(&CancellationToken::new()).await.unwrap();

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    assert!(limiter.acquire(&cancelled).await.unwrap_err().is_cancelled());

    drop(held);
    let _next = limiter.acquire(&CancellationToken::new()).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}
