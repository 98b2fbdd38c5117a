use std::process::ExitCode;
use std::sync::Arc;

use art_explorer::config::setup_logging;
use art_explorer::gateway::{Gateway, GeminiClient};
use clap::Parser;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = art_explorer::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return ExitCode::FAILURE;
    }

    let config = match cli.gateway_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Using text model {} and image model {}",
        config.text_model, config.image_model
    );

    let artworks_per_search = config.artworks_per_search;
    let gateway = Gateway::new(Arc::new(GeminiClient::new(config)))
        .with_artworks_per_search(artworks_per_search);

    if let Err(err) =
        art_explorer::web::setup_server(&cli.listen_address, cli.port, &cli.static_dir, gateway)
            .await
    {
        error!("Application error: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
