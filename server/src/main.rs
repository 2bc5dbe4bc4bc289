use std::sync::Arc;

use clap::Parser;
use htmldisplay_server::{
    LogIconSink, PreviewAction, PreviewServer, PreviewSettings, SystemLauncher, args::Args,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let server = PreviewServer::new(args.config());
    server.start().await?;

    match args.markdown_settings() {
        Some(settings) => preview(&server, &args, settings).await,
        None => preview(&server, &args, args.settings()).await,
    }
}

async fn preview<S: PreviewSettings>(
    server: &PreviewServer,
    args: &Args,
    settings: S,
) -> anyhow::Result<()> {
    let action = PreviewAction::new(
        server.clone(),
        Arc::new(SystemLauncher),
        Arc::new(LogIconSink),
    );

    action.on_will_appear(&args.action_id, settings.clone());

    println!("Preview: {}", server.view_url(&args.action_id));

    if !args.no_open {
        action.on_key_down(&args.action_id, settings).await?;
    }

    tokio::signal::ctrl_c().await?;
    action.on_deleted(&args.action_id);

    Ok(())
}
