use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use std::time::Duration;

use anyhow::{Result, anyhow};
use notification_service::utils::retry_fixed;
use tokio::time::Instant;

/// Test: successful operations complete without retry
#[tokio::test]
async fn test_successful_operation_no_retry() -> Result<()> {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = retry_fixed(3, Duration::from_millis(10), || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>("success")
        }
    })
    .await?;

    assert_eq!(result, "success");
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        1,
        "Should only attempt once"
    );

    Ok(())
}

/// Test: transient failures are retried with a fixed delay
#[tokio::test]
async fn test_transient_failures_are_retried() -> Result<()> {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let start = Instant::now();

    let result = retry_fixed(5, Duration::from_millis(10), || {
        let counter = Arc::clone(&counter);
        async move {
            let attempts = counter.fetch_add(1, Ordering::SeqCst);

            // Fail first 2 attempts, succeed on 3rd
            if attempts < 2 {
                Err(anyhow!("Transient error"))
            } else {
                Ok("success")
            }
        }
    })
    .await?;

    assert_eq!(result, "success");
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        3,
        "Should retry 2 times then succeed"
    );
    assert!(
        start.elapsed() >= Duration::from_millis(20),
        "Two retries should each wait the fixed delay"
    );

    Ok(())
}

/// Test: failing the first 4 attempts and succeeding on the 5th proceeds
#[tokio::test]
async fn test_success_on_final_attempt() -> Result<()> {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = retry_fixed(5, Duration::from_millis(5), || {
        let counter = Arc::clone(&counter);
        async move {
            let attempts = counter.fetch_add(1, Ordering::SeqCst);

            if attempts < 4 {
                Err(anyhow!("Broker unavailable"))
            } else {
                Ok("connected")
            }
        }
    })
    .await?;

    assert_eq!(result, "connected");
    assert_eq!(attempt_count.load(Ordering::SeqCst), 5);

    Ok(())
}

/// Test: permanent failures exhaust the attempts and propagate the error
#[tokio::test]
async fn test_permanent_failure_exhausts_attempts() -> Result<()> {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result: Result<&str, anyhow::Error> = retry_fixed(5, Duration::from_millis(5), || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("Broker unavailable"))
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        5,
        "Should stop after the configured number of attempts"
    );

    Ok(())
}
