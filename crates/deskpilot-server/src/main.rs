//! Deskpilot HTTP automation server
//!
//! Wires the model-backed agents, the process-backed capture and input
//! drivers, the task store and the plan executor into an axum service.

mod automation;
mod config;
mod routes;

use anyhow::Context;
use automation::{CommandCapture, ProcessInputDriver};
use clap::Parser;
use config::load_config;
use deskpilot_agents::client::{ChatClient, OpenAiChatClient};
use deskpilot_agents::{LlmOperationAgent, LlmPlanner, VisionLocator};
use deskpilot_core::command::Dispatcher;
use deskpilot_core::executor::PlanExecutor;
use deskpilot_core::store::TaskStore;
use routes::{router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "deskpilot-server", about = "Desktop automation service")]
struct Args {
    /// Path to the YAML config file
    #[arg(long, default_value = "deskpilot.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;
    let api_key = config.api_key()?;

    let client: Arc<dyn ChatClient> = Arc::new(OpenAiChatClient::new(
        config.llm.api_url.clone(),
        api_key,
        Duration::from_secs(config.llm.timeout_secs),
    )?);

    let planner = Arc::new(LlmPlanner::new(
        client.clone(),
        config.llm.planner_model.clone(),
        config.llm.temperature,
        config.llm.max_tokens,
    ));
    let locator = Arc::new(VisionLocator::new(
        client.clone(),
        config.llm.vision_model.clone(),
        config.llm.max_tokens,
    ));
    let generator = Arc::new(LlmOperationAgent::new(
        client,
        config.llm.operation_model.clone(),
        config.llm.temperature,
        config.llm.max_tokens,
    ));

    let capture = Arc::new(CommandCapture::new(
        config.automation.capture_command.clone(),
        config.screenshot_dir.clone(),
    ));
    let driver = Arc::new(ProcessInputDriver::new(
        config.automation.input_command.clone(),
    ));
    let dispatcher = Dispatcher::new(driver)
        .with_settle_delay(Duration::from_millis(config.automation.settle_delay_ms));

    let store = Arc::new(TaskStore::new());
    let executor = Arc::new(PlanExecutor::new(
        planner,
        capture,
        locator,
        generator,
        dispatcher,
        store.clone(),
    ));

    let app = router(AppState { store, executor });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "deskpilot server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
