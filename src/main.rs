use rate_sheet_etl::utils::error::{ErrorSeverity, RateSheetError};
use rate_sheet_etl::utils::{logger, validation::Validate};
use rate_sheet_etl::{CliConfig, LocalStorage, RateSheetEngine, RateSheetPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse_args();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting rate-sheet CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 創建存儲和管道
    let source = LocalStorage::new(".");
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = RateSheetPipeline::new(source, storage, config);
    let engine = RateSheetEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Extraction completed successfully!");
            println!("✅ Extraction completed successfully!");
            println!(
                "🏨 {} hotels, {} rooms, {} periods, {} extras",
                report.stats.hotels, report.stats.rooms, report.stats.periods, report.stats.extras
            );
            if report.stats.issues > 0 {
                println!("⚠️ {} rows skipped, see issues.csv", report.stats.issues);
            }
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &RateSheetError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 輸出失敗，可重試
        ErrorSeverity::High => 1,     // 處理錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}
