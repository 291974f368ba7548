mod cli;
mod demo;
mod infra;
mod routes;
mod server;
mod ws;

use lifeline::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
