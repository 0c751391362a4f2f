mod config;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use staffdesk_api::AppStateInner;
use staffdesk_approval::{ApprovalWorkflow, StaffPolicy, WebhookSink};
use staffdesk_discord::gateway::GatewayClient;
use staffdesk_discord::{BotIdentity, ChatPlatform, DiscordHttp, SessionState};
use staffdesk_types::events::GatewayDispatch;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "staffdesk_server=debug,staffdesk_api=debug,staffdesk_approval=debug,staffdesk_discord=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let session = SessionState::new();
    let platform: Arc<dyn ChatPlatform> =
        Arc::new(DiscordHttp::new(config.bot_token.clone(), config.api_base.clone())?);
    let sink = Arc::new(WebhookSink::new(config.sheet_webhook_url.clone()));
    let workflow = ApprovalWorkflow::new(
        platform.clone(),
        sink,
        StaffPolicy::new(&config.staff_roles),
    );
    info!("Staff roles: {}", config.staff_roles.join(", "));

    // Gateway -> event loop
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let gateway = GatewayClient::new(config.gateway_url.clone(), config.bot_token.clone());
    let gateway_task = tokio::spawn(gateway.run(events_tx));
    tokio::spawn(run_event_loop(events_rx, session.clone(), workflow));

    let state = Arc::new(AppStateInner {
        platform,
        session,
        directory_channel: config.directory_channel,
    });

    let app = staffdesk_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Server running on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        res = server => res?,
        res = gateway_task => match res {
            Ok(Ok(())) => info!("Gateway stopped, shutting down"),
            Ok(Err(e)) => anyhow::bail!("Gateway stopped: {}", e),
            Err(e) => anyhow::bail!("Gateway task failed: {}", e),
        },
    }

    Ok(())
}

/// Mark the session ready on READY and hand each reaction to its own task.
async fn run_event_loop(
    mut events: mpsc::UnboundedReceiver<GatewayDispatch>,
    session: SessionState,
    workflow: ApprovalWorkflow,
) {
    while let Some(dispatch) = events.recv().await {
        match dispatch {
            GatewayDispatch::Ready(ready) => {
                let tag = ready.user.tag();
                let first = session.mark_ready(BotIdentity {
                    user_id: ready.user.id,
                    tag: tag.clone(),
                    session_id: ready.session_id,
                });
                if first {
                    info!("Logged in as {}", tag);
                } else {
                    info!("Gateway session re-established as {}", tag);
                }
            }
            GatewayDispatch::ReactionAdd(event) => {
                let workflow = workflow.clone();
                tokio::spawn(async move { workflow.handle(event).await });
            }
            GatewayDispatch::Other(_) => {}
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
