//! Cancelling a driver while it waits between retries.

use manifail::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config: RetryConfig = RetryConfig::new([5_000, 5_000]).with_max_retries(2);
    let driver: RetryDriver<&str> = RetryDriver::from_config(&config);

    let token = driver.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        println!("Shutdown requested");
        token.cancel();
    });

    let outcome = driver
        .run_fn(|ctx| async move {
            println!("Polling job (attempt {})...", ctx.attempt());
            Err::<(), _>(Interrupt::<&str, std::io::Error>::from(
                Reset::inherit().carrying("job still queued"),
            ))
        })
        .await?;

    match outcome {
        Outcome::Aborted { abort, retries } => {
            println!("Stopped after {} retries: {}", retries, abort);
        }
        other => println!("Finished with {}", other.kind()),
    }

    Ok(())
}
