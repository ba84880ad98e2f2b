//! HTTP server startup and lifecycle

use tokio::net::TcpListener;

use crate::audit::AuditAction;
use crate::core::{Config, Result, ServerState};

/// HTTP server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create a server over pre-built state (tests, embedding)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    /// Run until ctrl-c
    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        // Lifecycle records bypass the channel so they land even if the
        // worker has not started yet or has already stopped.
        if let Err(e) = state.audit.log_sync(
            AuditAction::SystemStartup,
            "system",
            "server",
            None,
            serde_json::json!({ "environment": self.config.environment }),
        ) {
            tracing::error!("Failed to record startup audit entry: {:?}", e);
        }

        let app = crate::api::build_app(state.clone());

        let addr = format!("0.0.0.0:{}", self.config.http_port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("🚀 HTTP server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(e) = state.audit.log_sync(
            AuditAction::SystemShutdown,
            "system",
            "server",
            None,
            serde_json::json!({}),
        ) {
            tracing::error!("Failed to record shutdown audit entry: {:?}", e);
        }
        tracing::info!("Server stopped");

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
