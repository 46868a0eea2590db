use anyhow::{Context, bail};
use env_logger::Env;
use log::{info, warn};
use serde_json::Value;
use std::time::Duration;
use tempo_core::Message;
use tempo_runtime::{Flow, FlowDefinition, Injector, NodeRegistry};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

const USAGE: &str = "usage: tempo <flow.json> <node-id> [linger-ms]";

/// Feed stdin into `target`, one JSON payload per line
///
/// Lines that are not JSON are injected as strings.
async fn feed_stdin(injector: Injector, target: String) -> anyhow::Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut injected = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let payload = serde_json::from_str(line).unwrap_or_else(|_| Value::from(line));
        injector.inject(&target, Message::new(payload))?;
        injected += 1;
    }

    Ok(injected)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(target)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let linger = match args.next() {
        Some(ms) => Duration::from_millis(ms.parse().with_context(|| format!("linger-ms {ms:?}"))?),
        None => Duration::ZERO,
    };

    let definition =
        FlowDefinition::from_path(&path).with_context(|| format!("loading flow {path}"))?;
    let mut flow = Flow::load_realtime(definition, &NodeRegistry::with_defaults())?;
    if !flow.contains(&target) {
        bail!("node {target} is not in flow {path}");
    }
    info!("Flow {} loaded ({} nodes), feeding {}", path, flow.node_ids().len(), target);

    let (stop_tx, stop_rx) = oneshot::channel();
    let injector = flow.injector();
    tokio::spawn(async move {
        match feed_stdin(injector, target).await {
            Ok(count) => info!("Injected {} messages, lingering {:?}", count, linger),
            Err(e) => warn!("Stopped reading input: {:#}", e),
        }
        tokio::time::sleep(linger).await;
        let _ = stop_tx.send(());
    });

    flow.run_until_closed(async {
        let _ = stop_rx.await;
    })
    .await;

    for error in flow.reported_errors() {
        warn!("{}: {}", error.node, error.message);
    }
    info!("Acknowledged {} messages", flow.acknowledged());
    Ok(())
}
