// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use awx_installer::cli::Cli;
use awx_installer::config::Config;
use awx_installer::preflight;
use awx_installer::prompt;
use awx_installer::readiness::{Interrupt, ReadinessWaiter};
use awx_installer::shell::Shell;
use awx_installer::strategy::{
    run_with_fallback, ComposeStrategy, DeploymentStrategy, Installation, OperatorStrategy, StrategyKind,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Installation failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?.with_cli(&cli);
    info!(
        "Configuration loaded: namespace={}, deploy_dir={}, cluster_provider={}",
        config.namespace,
        config.deploy_dir.display(),
        config.cluster_provider
    );

    let shell = Shell;
    preflight::run(&shell, &config).await?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let method = match cli.method {
        Some(method) => method,
        None => prompt::ask_strategy(&mut input, &mut output)?,
    };

    if !cli.yes {
        let question = format!("Install AWX using the {} method?", method);
        if !prompt::confirm(&mut input, &mut output, &question)? {
            info!("Installation cancelled");
            return Ok(());
        }
    }
    drop(input);

    let interrupt = Interrupt::on_ctrl_c();
    let waiter = ReadinessWaiter::new(interrupt.clone());
    let operator = OperatorStrategy::new(&config, shell, waiter.clone());
    let compose = ComposeStrategy::new(&config, shell, waiter);

    let (primary, alternate): (&dyn DeploymentStrategy, &dyn DeploymentStrategy) = match method {
        StrategyKind::Operator => (&operator, &compose),
        StrategyKind::Compose => (&compose, &operator),
    };
    let alternate = config.fallback.then_some(alternate);

    let installation = run_with_fallback(primary, alternate, config.keep_failed_resources, &interrupt).await?;
    print_summary(&installation);
    Ok(())
}

fn print_summary(installation: &Installation) {
    println!();
    println!("AWX is ready ({} method)", installation.strategy);
    println!("  URL:      {}", installation.url);
    println!("  Username: {}", installation.admin_user);
    println!("  Password: {}", installation.admin_password);
}
