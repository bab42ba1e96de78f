use clap::Parser;
use glance::domain::image::ImageData;
use glance::utils::error::ErrorSeverity;
use glance::utils::{logger, validation::Validate};
use glance::{api, render, AnalyzerProvider, CliConfig, Command, GlanceError, GlanceService};

// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &GlanceError) -> i32 {
    match e.severity() {
        // 輸入錯誤（圖片格式、空查詢）代表指令沒有完成，不能回 0
        ErrorSeverity::Low => 1,
        ErrorSeverity::Medium => 2, // 可重試
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: &GlanceError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

async fn run(cli: &CliConfig, service: GlanceService, config: &glance::GlanceConfig) -> glance::Result<()> {
    match &cli.command {
        Command::Serve { .. } => api::start_server(config, service).await,
        Command::Scan { image } => {
            let image = ImageData::from_file(image).await?;
            let outcome = service.analyze_valve(&image).await?;
            print!("{}", render::render_outcome(&outcome));
            Ok(())
        }
        Command::Annotate { image } => {
            let image = ImageData::from_file(image).await?;
            let annotations = service.annotate_image(&image).await?;
            print!("{}", render::render_annotations(&annotations));
            Ok(())
        }
        Command::Search { .. } => {
            let query = cli.command.search_query().unwrap_or_default();
            let results = service.search_valves(&query).await?;
            print!("{}", render::render_search_results(&results));
            Ok(())
        }
        Command::TestConnection => {
            let status = service.test_connection().await;
            match status.error {
                None => println!("✅ OpenAI connected successfully!"),
                Some(error) => {
                    println!("❌ Connection failed: {}", error);
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let mut config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 只有 serve 與 scan 需要分析器
    let needs_analyzer = matches!(cli.command, Command::Serve { .. } | Command::Scan { .. });
    if !needs_analyzer && config.openai.api_key.is_none() {
        config.analyzer.provider = AnalyzerProvider::Simulated;
    }

    if config.logging.json {
        logger::init_json_logger(cli.verbose, config.logging.level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose, config.logging.level.as_deref());
    }

    tracing::info!("Starting GLANCE {}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Configuration: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    let service = match GlanceService::from_config(&config) {
        Ok(service) => service,
        Err(e) => fail(&e),
    };

    if let Err(e) = run(&cli, service, &config).await {
        fail(&e);
    }
}
