use bsky_daily::adapters::xrpc::http_client;
use bsky_daily::utils::error::ErrorSeverity;
use bsky_daily::utils::{logger, validation::Validate};
use bsky_daily::{
    BotConfig, BotError, CliConfig, DailyPostJob, HuggingFaceImageGenerator, LocalStorage,
    OpenAiDescriber, PostPublisher, XrpcClient,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting bsky-daily");

    let mut config = match BotConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&config, cli.dry_run).await {
        Ok(()) => {
            tracing::info!("✅ Job completed successfully.");
        }
        Err(e) => {
            tracing::error!(
                "❌ Error during job execution: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: &BotConfig, dry_run: bool) -> Result<(), BotError> {
    let http = http_client(config.timeout())?;

    let xrpc = XrpcClient::with_client(&config.bluesky.base_url, http.clone());
    let session = xrpc
        .create_session(&config.bluesky.identifier, &config.bluesky.password)
        .await?;

    let describer = OpenAiDescriber::new(
        http.clone(),
        &config.openai.base_url,
        &config.openai.api_key,
        &config.openai.prompt,
    )
    .with_model(&config.openai.model)
    .with_system_prompt(&config.openai.system_prompt);
    let images = HuggingFaceImageGenerator::new(http, &config.huggingface.base_url, &config.huggingface.api_key)
        .with_model(&config.huggingface.model);
    let publisher = PostPublisher::new(xrpc).with_alt_text(&config.post.alt_text);

    let job = DailyPostJob::new(
        describer,
        images,
        LocalStorage::new(&config.output.text_dir),
        LocalStorage::new(&config.output.image_dir),
        publisher,
    )
    .dry_run(dry_run);

    let report = job.run(&session).await?;
    match &report.post {
        Some(post) => println!("✅ Posted {}", post.uri),
        None => println!("📁 Saved {} and {}", report.text_path, report.image_path),
    }
    Ok(())
}
