use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod cli;
mod config;
mod handler;
mod http;
mod logger;
mod server;
mod target;

use target::ServeTarget;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mockone: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Everything that can fail happens here, before any listener is bound
fn run(args: &cli::Args) -> Result<(), Box<dyn std::error::Error>> {
    let target = ServeTarget::resolve(&args.file)?;
    println!("{}", target.path().display());

    let loaded = config::Config::load(&args.overrides())?;
    logger::init(&loaded.config.logging)?;

    if !target.path().exists() {
        logger::log_missing_target(&target);
    }

    // Build the Tokio runtime; worker count comes from server.workers
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = loaded.config.server.workers.filter(|&n| n > 0) {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(loaded.config, target, loaded.config_file))
}

async fn async_main(
    cfg: config::Config,
    target: ServeTarget,
    config_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)
        .map_err(|e| format!("unable to listen on {addr}: {e}"))?;

    logger::log_server_start(&listener.local_addr()?, &target, config_file.as_deref(), &cfg);

    let state = Arc::new(config::AppState::new(cfg, target));
    server::start_server_loop(listener, state, server::shutdown_signal()).await;
    Ok(())
}
