//! A flaky fetch that resets until the upstream recovers.

use async_trait::async_trait;
use manifail::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("upstream returned 503")]
struct ServiceUnavailable;

#[derive(Debug, thiserror::Error)]
#[error("malformed response: {0}")]
struct Malformed(String);

#[derive(Debug)]
struct FetchStep {
    calls: AtomicU32,
}

#[async_trait]
impl Work for FetchStep {
    type Output = String;
    type Value = ();
    type Error = Malformed;

    async fn call(&self, ctx: AttemptContext) -> Result<String, Interrupt<(), Malformed>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        println!(
            "Fetching (attempt {}, {} delays left)...",
            ctx.attempt(),
            ctx.remaining().len()
        );

        if call < 2 {
            return Err(Reset::inherit().caused_by(ServiceUnavailable).into());
        }
        let body = "{\"status\":\"ok\"}".to_string();
        if !body.starts_with('{') {
            return Err(Interrupt::Error(Malformed(body)));
        }
        Ok(body)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let schedule =
        DelaySchedule::exponential(4, Duration::from_millis(50), Duration::from_secs(1), 2)?;
    let driver = RetryDriver::builder()
        .delays(schedule)
        .on_retry(|event: &manifail::RetryEvent<'_, ()>| {
            let reason = event
                .retried
                .cause()
                .map(|c| c.to_string())
                .unwrap_or_default();
            println!(
                "Retry {} after {:?} ({})",
                event.attempt, event.delay, reason
            );
        })
        .build();

    let work = FetchStep {
        calls: AtomicU32::new(0),
    };

    match driver.run(&work).await? {
        Outcome::Success { value, retries } => {
            println!("Fetched after {} retries: {}", retries, value);
        }
        Outcome::Aborted { abort, .. } => eprintln!("Fetch aborted: {}", abort),
        Outcome::Failed(exceeded) => eprintln!("Fetch failed: {}", exceeded),
    }

    Ok(())
}
