use air_waiter::utils::logger;
use air_waiter::{run_wait, CliConfig, WaiterError};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    // 載入並驗證配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            exit_with(&e, cli.json);
        }
    };

    match run_wait(&config).await {
        Ok(report) => {
            if config.json_output {
                match serde_json::to_string_pretty(&report) {
                    Ok(body) => println!("{}", body),
                    Err(e) => exit_with(&WaiterError::from(e), false),
                }
            } else {
                println!(
                    "✅ {} is ready after {} attempts ({} ms)",
                    report.probe, report.attempts, report.elapsed_ms
                );
            }
        }
        Err(e) => {
            tracing::error!("❌ Wait failed: {} (exit code {})", e, e.exit_code());
            exit_with(&e, config.json_output);
        }
    }
}

fn exit_with(error: &WaiterError, json: bool) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", error.recovery_suggestion());

    if json {
        let body = serde_json::json!({
            "ready": false,
            "error": error.to_string(),
            "exit_code": error.exit_code(),
        });
        println!("{}", body);
    } else {
        eprintln!("❌ {}", error.user_friendly_message());
        eprintln!("💡 {}", error.recovery_suggestion());
    }

    std::process::exit(error.exit_code());
}
