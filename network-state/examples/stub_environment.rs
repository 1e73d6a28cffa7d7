//! Stub Environment Walkthrough
//!
//! Drives the handler against the in-process fake service: initial sync,
//! a default-network switch, a technology toggle and a scan, printing the
//! change events each step produces and finally the JSON snapshot.
//!
//! Run with: `cargo run -p netstate --example stub_environment`

use std::sync::Arc;

use network_service::fake::STUB_ETHERNET;
use network_service::keys::{service, state};
use network_service::{FakeNetworkService, TaskQueue};
use network_state::prelude::*;
use network_state::{ChangeIterator, LoggingMode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let queue = TaskQueue::new();
    let fake = FakeNetworkService::with_default_environment(queue.clone());
    queue.run_until_idle();

    let config = HandlerConfig::from_env()?.with_log_mode(LoggingMode::Development);
    let context = NetworkHandler::new(Arc::new(fake.clone()), config);
    let handler = context.initialize()?;
    let changes = context.changes()?;

    step("initial sync", &queue, &changes);
    for network in handler.get_network_list(NetworkTypePattern::DEFAULT) {
        println!(
            "  {:<10} {:<9} {:?} guid={}",
            network.path,
            network.network_type,
            network.connection_state(),
            network.guid
        );
    }

    fake.set_service_property(STUB_ETHERNET, service::STATE, state::IDLE);
    step("ethernet goes idle", &queue, &changes);
    if let Some(default) = handler.default_network() {
        println!("  default network is now {}", default.path);
    }

    let on_error: ErrorCallback = Arc::new(|err: NetworkError| eprintln!("  error: {err}"));
    handler.set_technology_enabled(NetworkTypePattern::WIFI, false, Some(on_error.clone()));
    println!(
        "  wifi right after the request: {:?}",
        handler.get_technology_state(NetworkTypePattern::WIFI)
    );
    step("wifi disabled", &queue, &changes);

    handler.set_technology_enabled(NetworkTypePattern::WIFI, true, Some(on_error));
    step("wifi enabled", &queue, &changes);

    handler.request_scan();
    step("scan", &queue, &changes);

    println!("\n{}", handler.snapshot_json()?);

    drop(changes);
    context.shutdown()?;
    Ok(())
}

/// Settle the queue and print what changed
fn step(title: &str, queue: &TaskQueue, changes: &ChangeIterator) {
    queue.run_until_idle();
    println!("\n== {title}");
    for event in changes.try_iter() {
        match event.path {
            Some(path) => println!("  {:?} {path}", event.kind),
            None => println!("  {:?}", event.kind),
        }
    }
}
