// SPDX-License-Identifier: AGPL-3.0
// Trainboard - Console home board

mod board;
mod commands;
mod render;
mod state;

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging; stdout belongs to the board
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trainboard=info".parse().unwrap())
                .add_directive("trainboard_core=info".parse().unwrap()),
        )
        .init();

    tracing::info!("Starting Trainboard v{}", env!("CARGO_PKG_VERSION"));

    let state = match state::AppState::new() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let board = board::HomeBoard::start(state).await;
    match board.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Board stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
