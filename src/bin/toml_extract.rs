use clap::Parser;
use rate_sheet_etl::config::toml_config::{CompressionConfig, TomlConfig};
use rate_sheet_etl::core::ConfigProvider;
use rate_sheet_etl::utils::error::ErrorSeverity;
use rate_sheet_etl::utils::{logger, validation::Validate};
use rate_sheet_etl::{LocalStorage, RateSheetEngine, RateSheetPipeline};

#[derive(Parser)]
#[command(name = "toml-extract")]
#[command(about = "Rate sheet extraction driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "rate-sheet.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override the input path from config
    #[arg(long)]
    input: Option<String>,

    /// Override the output path from config
    #[arg(long)]
    output: Option<String>,

    /// Override ZIP bundling from config
    #[arg(long)]
    zip: Option<bool>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based rate sheet extraction");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    apply_overrides(&mut config, &args);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let source = LocalStorage::new(".");
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = RateSheetPipeline::new(source, storage, config);
    let engine = RateSheetEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Extraction completed successfully!");
            println!("✅ Extraction completed successfully!");
            println!(
                "🏨 {} hotels, {} rooms, {} periods, {} extras, {} issues",
                report.stats.hotels,
                report.stats.rooms,
                report.stats.periods,
                report.stats.extras,
                report.stats.issues
            );
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
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

fn apply_overrides(config: &mut TomlConfig, args: &Args) {
    if let Some(input) = &args.input {
        config.sheet.input_path = input.clone();
        tracing::info!("🔧 Input overridden to: {}", input);
    }
    if let Some(output) = &args.output {
        config.load.output_path = output.clone();
        tracing::info!("🔧 Output overridden to: {}", output);
    }
    if let Some(zip) = args.zip {
        match config.load.compression.as_mut() {
            Some(compression) => compression.enabled = zip,
            None => {
                config.load.compression = Some(CompressionConfig {
                    enabled: zip,
                    filename: rate_sheet_etl::domain::ports::DEFAULT_BUNDLE_FILENAME.to_string(),
                })
            }
        }
        tracing::info!("🔧 ZIP bundling overridden to: {}", zip);
    }
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    if config.bundle_output() {
        println!("  Bundle: {}", config.bundle_filename());
    }
    println!("  Max Rows: {}", config.rules().max_rows);
    if let Some(stay) = config.stay() {
        println!("  Stay: {} - {}", stay.start, stay.end);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    let rules = config.rules();

    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📄 Sheet:");
    println!("  Path: {}", config.input_path());
    if config.merged_ranges().is_empty() {
        println!("  Merged ranges: none");
    } else {
        println!("  Merged ranges: {}", config.merged_ranges().join(", "));
    }

    println!();
    println!("⚙️ Extraction Rules:");
    println!("  Hotel marker: {}", rules.hotel_marker);
    println!("  Room prefixes: {}", rules.room_prefixes.join(", "));
    println!("  Legend prices: {}", rules.legend_prices.join(", "));
    println!("  Excluded prefixes: {}", rules.exclusion_prefixes.len());
    println!("  Proximity window: {} rows", rules.proximity_window);
    println!("  Unnamed group: {}", rules.unnamed_group_name);

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    for format in config.output_formats() {
        match format.as_str() {
            "json" => println!("  ✅ extraction.json"),
            "csv" => {
                println!("  ✅ rooms.csv, rates.csv, periods.csv, extras.csv, issues.csv");
                if config.stay().is_some() {
                    println!("  ✅ stay.csv");
                }
            }
            _ => {}
        }
    }
    if config.bundle_output() {
        println!("  Compression: {} (ZIP)", config.bundle_filename());
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
