pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{AdminCommands, Cli, Commands};
pub use config::Config;
pub use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists, leaving it untouched.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    let state = SharedState::new(config).await?;

    if let Some(password) = &state.bootstrap_password {
        println!("Administrator account created: {}", state.config.admin.email);
        println!("Generated password (shown once): {password}");
        println!();
    }

    let result = dispatch(&state, cli.command).await;

    if let Some(handle) = prometheus_handle {
        debug!("Metrics snapshot:\n{}", handle.render());
    }

    result
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key, value)?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn dispatch(state: &SharedState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => Ok(()),

        Commands::Signup {
            name,
            email,
            password,
            confirm,
        } => cli::cmd_signup(state, &name, &email, &password, &confirm).await,

        Commands::Login { email, password } => cli::cmd_login(state, &email, &password).await,

        Commands::Logout => cli::cmd_logout(state).await,

        Commands::Whoami => cli::cmd_whoami(state).await,

        Commands::Plans => cli::cmd_plans(state),

        Commands::Buy { plan, utr } => cli::cmd_buy(state, &plan, &utr).await,

        Commands::Requests => cli::cmd_my_requests(state).await,

        Commands::History { limit } => cli::cmd_history(state, limit).await,

        Commands::Styles => cli::cmd_styles(),

        Commands::Generate {
            prompt,
            count,
            style,
        } => cli::cmd_generate(state, &prompt.join(" "), count, style.as_deref()).await,

        Commands::Edit { image, prompt } => {
            cli::cmd_edit(state, &image, &prompt.join(" ")).await
        }

        Commands::Admin { command } => match command {
            AdminCommands::Pending => cli::cmd_admin_requests(state, true).await,
            AdminCommands::Requests => cli::cmd_admin_requests(state, false).await,
            AdminCommands::Approve { id } => cli::cmd_admin_approve(state, id).await,
            AdminCommands::Reject { id } => cli::cmd_admin_reject(state, id).await,
            AdminCommands::Users => cli::cmd_admin_users(state).await,
            AdminCommands::SetCredits { id, credits } => {
                cli::cmd_admin_set_credits(state, id, credits).await
            }
            AdminCommands::Grant { id, credits } => {
                cli::cmd_admin_grant(state, id, credits).await
            }
        },
    }
}
