//! A terminal participant for a Kazhutha table.
//!
//! Connects to a host over WebSocket, joins with a name and peer id, and
//! reads commands from stdin.

use anyhow::Result;
use kazhutha::PeerId;
use kz_client::websocket_client::WebSocketClient;
use pico_args::Arguments;

const HELP: &str = "\
Join a Kazhutha table

USAGE:
  kz_client [OPTIONS]

OPTIONS:
  --server URL          Host WebSocket URL  [default: ws://127.0.0.1:6969/ws]
  --name NAME           Display name        [default: env USER or Player]
  --peer-id ID          Stable peer id      [default: random]

FLAGS:
  -h, --help            Print help information
";

struct Args {
    server_url: String,
    name: String,
    peer_id: PeerId,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| "ws://127.0.0.1:6969/ws".to_string()),
        name: pargs
            .opt_value_from_str("--name")?
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "Player".to_string()),
        peer_id: pargs
            .opt_value_from_str::<_, String>("--peer-id")?
            .map(|id| PeerId::new(&id))
            .unwrap_or_else(|| PeerId::new(&uuid::Uuid::new_v4().simple().to_string())),
    };

    env_logger::builder().format_target(false).init();

    WebSocketClient::new(args.server_url, args.name, args.peer_id)
        .connect_and_play()
        .await
}
