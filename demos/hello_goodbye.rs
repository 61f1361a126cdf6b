//! # Example: hello_goodbye
//!
//! Line-driven rendezvous on standard input.
//!
//! Demonstrates how to:
//! - Build a [`Loop`] with a custom default TTL.
//! - Register waits (`hello <name>`) and satisfy them (`goodbye <name>`).
//! - Terminate on end of input and wait for every pending waiter to resolve.
//!
//! ## Flow
//! ```text
//! stdin line ──► "hello bob"   ──► spawn: lp.wait("bob").await ─► print outcome
//!            ──► "goodbye bob" ──► lp.send(Event::new("bob"))
//! EOF        ──► lp.terminate() ──► lp.closed() ──► join printers ──► exit
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example hello_goodbye
//! cargo run --example hello_goodbye --features logging   # also print loop activity
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use waitloop::{Config, Event, Loop, LoopBuilder, Subscribe, WaitError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Listeners expire after 15s unless a goodbye arrives.
    let cfg = Config {
        default_ttl: Duration::from_secs(15),
        ..Config::default()
    };

    // 2. Optional activity printer.
    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(waitloop::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let lp: Loop = LoopBuilder::new(cfg).with_subscribers(subs).build();
    let mut printers = JoinSet::new();

    // 3. One command per line until EOF.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let (Some(action), Some(_)) = (words.next(), words.next()) else {
            println!("need at least an action and a name");
            continue;
        };
        let name = line.trim_start()[action.len()..].trim().to_string();

        match action {
            "hello" => {
                println!("received hello for name `{name}`; waiting for `goodbye {name}`");
                let waiter = lp.wait(name.as_str()).await;
                printers.spawn(async move {
                    let ev = waiter.await;
                    match ev.error {
                        None => println!("received goodbye for {name}"),
                        Some(WaitError::TimedOut) => {
                            println!("timed out waiting for `goodbye {name}`")
                        }
                        Some(err) => {
                            println!("error waiting for `goodbye {name}`: {}", err.as_message())
                        }
                    }
                });
            }
            "goodbye" => lp.send(Event::new(name)).await,
            _ => println!("start your message with 'hello ' or 'goodbye '"),
        }
    }

    // 4. EOF: resolve everything still pending and let the printers finish.
    println!("terminating loop and waiting for completions");
    lp.terminate();
    lp.closed().await;
    while printers.join_next().await.is_some() {}
    Ok(())
}
