use anyhow::Context;
use clap::Parser;
use service_broker::config::file::load_options;
use service_broker::utils::logger;
use service_broker::{Broker, CliArgs, EnvSnapshot};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting service-broker");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let env = EnvSnapshot::from_process();
    let options = load_options(&args.config, &env)
        .with_context(|| format!("read broker options from {}", args.config.display()))?;

    let broker = match Broker::from_options(&options, &env) {
        Ok(broker) => broker,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // 這個執行檔本身不提供 provision 邏輯，只回應 catalog；
    // 需要生命週期操作時請以函式庫方式註冊處理器（見 demos/echo_broker.rs）
    let addr = SocketAddr::from(([0, 0, 0, 0], broker.config().port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;

    service_broker::api::serve(listener, broker.into_router(), shutdown_signal()).await?;
    tracing::info!("service-broker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
