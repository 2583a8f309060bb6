use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;

use dangbeon::notifications::ResponseUrlClient;
use dangbeon::scheduler::DailyTrigger;
use dangbeon::server::{AppState, OnCallServer};

use super::AppContext;

/// Resolves once the shutdown flag flips
async fn wait_for(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Run the slash-command server and the daily reminder until Ctrl-C
///
/// Each reminder run also calls `schedule_next_month`, which books one more
/// month per run (see `DEFAULT_LOOKAHEAD_DAYS`). Pass `--no-reminder` and run
/// `schedule` from cron to control how far ahead the roster is booked.
pub async fn serve(ctx: AppContext, with_reminder: bool) -> Result<()> {
    let sink = ResponseUrlClient::new(ctx.slack_timeout())
        .context("Failed to create response_url client")?;
    let state = AppState::new(
        ctx.repo.clone(),
        Arc::new(sink),
        ctx.config.dispatch,
        ctx.clock,
    );
    let server = OnCallServer::new(ctx.config.server.clone(), state);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
        let _ = shutdown_tx.send(true);
    });

    let trigger_task = if with_reminder {
        let trigger = DailyTrigger::new(ctx.config.trigger.clone(), ctx.clock)?;
        let reminder = Arc::new(ctx.reminder()?);
        let clock = ctx.clock;
        let rx = shutdown_rx.clone();

        Some(tokio::spawn(async move {
            trigger
                .run(
                    move || {
                        let reminder = reminder.clone();
                        async move {
                            match reminder.run(clock.today()).await {
                                Ok(report) => tracing::info!(
                                    date = %report.date,
                                    reminder = ?report.reminder,
                                    topic = ?report.topic,
                                    "Daily reminder finished"
                                ),
                                Err(e) => tracing::error!(error = %e, "Daily reminder failed"),
                            }
                        }
                    },
                    wait_for(rx),
                )
                .await;
        }))
    } else {
        tracing::info!("Daily reminder disabled");
        None
    };

    server.start_with_shutdown(wait_for(shutdown_rx)).await?;

    if let Some(task) = trigger_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Daily trigger task ended abnormally");
        }
    }

    Ok(())
}
