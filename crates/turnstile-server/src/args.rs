use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "turnstile-server", version, about = "WebSocket matchmaking server")]
pub struct Args {
    /// Interface to listen on
    #[arg(long, env = "TURNSTILE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "TURNSTILE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding one `*.toml` definition per game
    #[arg(long, env = "TURNSTILE_GAMES_DIR", default_value = "games")]
    pub games_dir: PathBuf,
}

impl Args {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
