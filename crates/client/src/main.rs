mod headless;
mod tui;

use std::time::Duration;

use clap::Parser;

use quizsync::{Endpoint, Profile, SyncClient, SyncConfig, SystemClock};

#[derive(Parser)]
#[command(name = "quiz")]
#[command(about = "Live quiz client")]
struct Args {
    #[arg(long, default_value = "localhost", help = "Game server host")]
    host: String,

    #[arg(short, long, help = "Game server port (defaults to the profile's port)")]
    port: Option<u16>,

    #[arg(short, long, help = "Player name shown to the server")]
    user: String,

    #[arg(long, help = "Use production defaults (port 80)")]
    production: bool,

    #[arg(long, default_value_t = 1000, help = "Reconnect attempt interval in ms")]
    reconnect_ms: u64,

    #[arg(long, default_value_t = 1000, help = "Clock sync interval in ms")]
    time_sync_ms: u64,

    #[arg(long, default_value_t = 5000, help = "Connect attempt timeout in ms")]
    connect_timeout_ms: u64,

    #[arg(long, help = "Log game updates instead of drawing the terminal view")]
    headless: bool,
}

impl Args {
    fn sync_config(&self) -> SyncConfig {
        let profile = if self.production {
            Profile::Production
        } else {
            Profile::Development
        };

        let mut endpoint = Endpoint::for_profile(self.host.clone(), profile);
        if let Some(port) = self.port {
            endpoint.port = port;
        }

        SyncConfig {
            endpoint,
            user: self.user.clone(),
            reconnect_interval: Duration::from_millis(self.reconnect_ms),
            time_sync_interval: Duration::from_millis(self.time_sync_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // keep the terminal view readable unless asked otherwise
    let default_filter = if args.headless { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = args.sync_config();
    let runtime = tokio::runtime::Runtime::new()?;

    let connector = config.websocket_connector();
    let client = SyncClient::new(config, connector, SystemClock)?;
    let handle = runtime.block_on(async { client.spawn() });

    if args.headless {
        runtime.block_on(headless::run(handle))?;
    } else {
        let result = tui::run(handle, &runtime);
        if let Err(e) = &result {
            eprintln!("TUI error: {}", e);
        }
        result?;
    }

    Ok(())
}
