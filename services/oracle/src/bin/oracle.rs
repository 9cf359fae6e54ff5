//! services/oracle/src/bin/oracle.rs

use oracle_lib::{
    app::{
        console::{help_text, Console, ConsoleInput},
        protocol::{UiCommand, ViewUpdate},
        AppContext, OracleApp,
    },
    config::Config,
    error::AppError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Provider: {:?}", config.provider);

    // --- 2. Wire the Adapters ---
    let ctx = AppContext::from_config(&config)?;

    // --- 3. Start the Runtime ---
    let (command_tx, command_rx) = mpsc::channel::<UiCommand>(32);
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<ViewUpdate>();
    let shutdown = CancellationToken::new();

    let runtime = tokio::spawn(OracleApp::new(ctx, update_tx).run(command_rx, shutdown.clone()));

    let printer = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            match serde_json::to_string(&update) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Failed to serialize view update: {}", e),
            }
        }
    });

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    // --- 4. Read the Console ---
    println!("{}", help_text());
    let mut console = Console::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        match console.interpret(&line) {
            Ok(ConsoleInput::Command(command)) => {
                if command_tx.send(command).await.is_err() {
                    break;
                }
            }
            Ok(ConsoleInput::Handled(message)) if !message.is_empty() => println!("{}", message),
            Ok(ConsoleInput::Handled(_)) => {}
            Ok(ConsoleInput::Help) => println!("{}", help_text()),
            Ok(ConsoleInput::Quit) => break,
            Err(message) => println!("{}", message),
        }
    }

    // --- 5. Shut Down ---
    shutdown.cancel();
    drop(command_tx);
    runtime
        .await
        .map_err(|e| AppError::Internal(format!("runtime task failed: {}", e)))??;
    let _ = printer.await;
    info!("Farewell, traveler.");
    Ok(())
}
