mod commands;
mod gateway;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zayden_channels::whatsapp::{generate_qr_terminal, WhatsAppChannel};
use zayden_core::{
    config::{self, Config},
    phone,
    traits::{Channel, Messenger},
};
use zayden_services::{ffmpeg, FfmpegConverter, HttpScraper};
use zayden_store::Lists;

#[derive(Parser)]
#[command(
    name = "zayden",
    version,
    about = "Zayden — WhatsApp command bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to WhatsApp and serve commands.
    Start,
    /// Print the configuration summary and stored list sizes.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _log_guard = init_tracing(&cfg)?;
            start(cfg).await?;
        }
        Commands::Status => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            status(&cli.config, &cfg).await?;
        }
    }

    Ok(())
}

/// Stdout plus `{data_dir}/logs/zayden.log`. The guard flushes the file
/// writer on drop and must live as long as the bot.
fn init_tracing(cfg: &Config) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = cfg.logs_dir();
    std::fs::create_dir_all(&logs_dir)?;
    let file = tracing_appender::rolling::never(&logs_dir, "zayden.log");
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.bot.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(guard)
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    if !cfg.channel.whatsapp.enabled {
        anyhow::bail!("WhatsApp is disabled. Enable [channel.whatsapp] in the config file.");
    }
    if cfg.owner.numbers.is_empty() {
        warn!("no owner numbers configured; owner commands are unreachable");
    }

    let lists = Lists::open(&cfg.lists_dir()).await?;

    // Channel: one adapter serves as both inbound stream and reply emitter.
    let whatsapp = Arc::new(WhatsAppChannel::new(
        cfg.channel.whatsapp.clone(),
        cfg.session_path(),
    ));
    let mut qr_rx = whatsapp.pairing_channel().await;
    tokio::spawn(async move {
        while let Some(qr) = qr_rx.recv().await {
            match generate_qr_terminal(&qr) {
                Ok(code) => {
                    println!("\nScan this QR code with WhatsApp > Linked devices:\n\n{code}")
                }
                Err(e) => warn!("failed to render pairing QR code: {e}"),
            }
        }
    });
    let channel: Arc<dyn Channel> = whatsapp.clone();
    let messenger: Arc<dyn Messenger> = whatsapp;

    // Collaborators.
    let scraper = Arc::new(HttpScraper::from_config(&cfg.services)?);
    if !ffmpeg::is_available(&cfg.media.ffmpeg_path).await {
        warn!(
            "ffmpeg not found at '{}'; sticker and audio conversion will fail",
            cfg.media.ffmpeg_path
        );
    }
    let converter = Arc::new(FfmpegConverter::from_config(&cfg.media));

    info!("{} — starting bot...", cfg.bot.name);
    let gw = Arc::new(gateway::Gateway::new(
        channel, messenger, scraper, converter, cfg, lists,
    ));
    gw.run().await
}

async fn status(config_path: &str, cfg: &Config) -> anyhow::Result<()> {
    println!("{} — Status Check\n", cfg.bot.name);
    println!("Config: {config_path}");
    println!("Data dir: {}", cfg.data_dir().display());
    println!("Prefix: '{}'", cfg.bot.prefix);
    println!("Self mode: {}", if cfg.bot.self_mode { "on" } else { "off" });
    let owners = cfg
        .owner
        .numbers
        .iter()
        .map(|n| phone::digits(n))
        .collect::<Vec<_>>();
    println!(
        "Owners: {}",
        if owners.is_empty() {
            "(none)".to_string()
        } else {
            owners.join(", ")
        }
    );
    println!("Services: {}", cfg.services.base_url);
    println!();

    let lists = Lists::open(&cfg.lists_dir()).await?;
    println!("  premium: {}", lists.premium.len().await);
    println!("  users: {}", lists.users.len().await);
    println!("  anti-link groups: {}", lists.antilink.len().await);
    println!("  pinterest rules: {}", lists.pinterest.len().await);
    println!();

    println!(
        "  ffmpeg: {}",
        if ffmpeg::is_available(&cfg.media.ffmpeg_path).await {
            "available"
        } else {
            "not found"
        }
    );
    println!(
        "  whatsapp: {}",
        if !cfg.channel.whatsapp.enabled {
            "disabled"
        } else if cfg.session_path().exists() {
            "paired session found"
        } else {
            "not paired (run `zayden start` and scan the QR code)"
        }
    );
    Ok(())
}
