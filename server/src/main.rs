use anyhow::Context;
use beholdercore::stream::shutdown_channel;
use beholdercore::PluginState;
use bridge::HttpBridge;
use clap::Parser;
use log::info;
use producer::SyntheticProducer;
use settings::ServerSettings;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod bridge;
mod producer;
mod settings;

#[derive(Parser)]
#[command(author, version, about = "Streams live Beholder frames to the browser")]
struct Args {
    /// Load server settings from YAML (overrides the flags below)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Log directory whose plugins/beholder folder the producer writes to
    #[arg(long, default_value = "logs")]
    logdir: PathBuf,
    #[arg(long, default_value = "127.0.0.1:6006")]
    bind: SocketAddr,
    /// Write synthetic frames so the viewer has something to show
    #[arg(long, default_value_t = false)]
    produce: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = if let Some(path) = args.settings {
        ServerSettings::load(path)?
    } else {
        ServerSettings::from_args(args.logdir, args.bind, args.produce)
    };

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating server runtime")?;
    runtime.block_on(serve(settings))
}

async fn serve(settings: ServerSettings) -> anyhow::Result<()> {
    let dir = settings.plugin_dir();
    let state = Arc::new(
        PluginState::open(dir.clone())
            .with_context(|| format!("opening plugin directory {}", dir.root().display()))?,
    );
    let (trigger, shutdown) = shutdown_channel();

    let producer = if settings.produce {
        let producer = SyntheticProducer::new(dir.clone(), settings.producer.clone());
        Some(tokio::spawn(producer.run(shutdown.clone())))
    } else {
        None
    };

    let bridge = HttpBridge::new(state.clone(), shutdown);
    let (addr, server) = bridge.bind(settings.bind)?;
    let server = tokio::spawn(server);
    info!(
        "serving beholder on http://{}/data/plugin/beholder/ (FPS {}, plugin dir {})",
        addr,
        state.config().fps(),
        dir.root().display()
    );

    signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    info!("shutting down");
    trigger.trigger();

    server.await.context("joining http bridge")?;
    if let Some(producer) = producer {
        producer.await.context("joining synthetic producer")?;
    }

    let metrics = state.metrics().snapshot();
    info!(
        "served {} frames over {} streams",
        metrics.frames_sent, metrics.streams_opened
    );
    Ok(())
}
