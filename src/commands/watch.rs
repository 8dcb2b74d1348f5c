use crate::commands::{render_text, Out};
use crate::dashboard::Dashboard;
use crate::multiplexer::Multiplexer;
use crate::source::FileSource;
use crate::{Config, Result};
use anyhow::Context;
use std::future::Future;
use tracing::{info, warn};

/// Watches every snapshot file and prints the totals after each recompute until Ctrl-C.
pub async fn watch(config: Config) -> Result<Out<usize>> {
    watch_until(config, async {
        tokio::signal::ctrl_c()
            .await
            .context("Unable to listen for Ctrl-C")
    })
    .await
}

/// Watches every snapshot file until `shutdown` completes, then tears every subscription down.
/// The structured output is the number of recomputes.
pub async fn watch_until<F>(config: Config, shutdown: F) -> Result<Out<usize>>
where
    F: Future<Output = Result<()>>,
{
    let mut mux = Multiplexer::subscribe(FileSource::all(&config)).await;
    if mux.attached().is_empty() {
        warn!("No snapshot source could be attached");
    }
    info!(
        "Watching {} (Ctrl-C to stop)",
        config.snapshots().display()
    );

    let mut dashboard = Dashboard::new();
    let mut refreshes = 0usize;
    let result = tokio::select! {
        _ = mux.run(&mut dashboard, |d| {
            refreshes += 1;
            println!("{}\n", render_text(&d.summary()));
        }) => Ok(()),
        r = shutdown => r,
    };
    mux.teardown();
    result?;

    Ok(Out::new(
        format!("Stopped watching after {refreshes} update(s)"),
        refreshes,
    ))
}
