use warehouse_packer::{api, config::AppConfig};

#[tokio::main]
async fn main() {
    // Load .env first so RUST_LOG from the file reaches the logger.
    let dotenv_result = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            log::warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    println!("🚀 Packing service starting...");
    if let Err(err) = api::start_api_server(app_config.api, app_config.optimizer).await {
        eprintln!("❌ API server terminated with an error: {err}");
        std::process::exit(1);
    }
}
