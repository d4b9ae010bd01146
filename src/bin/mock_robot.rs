/// Mock robot receiver
///
/// Stands in for the balancing-robot firmware during desk testing: listens on
/// the tuner's UDP port, decodes each command line and prints it. Like the
/// real firmware it never replies.
///
/// Run with: cargo run --bin mock_robot

use std::net::UdpSocket;

use anyhow::Result;
use clap::Parser;

use lqr_tuner::protocol::{self, ROBOT_PORT};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// UDP port to listen on
    #[arg(long, default_value_t = ROBOT_PORT)]
    port: u16,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let sock = UdpSocket::bind(("0.0.0.0", args.port))?;
    println!("Mock robot listening on 0.0.0.0:{}", args.port);

    let mut buf = [0u8; 512];
    loop {
        let (n, from) = sock.recv_from(&mut buf)?;
        let line = String::from_utf8_lossy(&buf[..n]).to_string();
        match protocol::parse(&line) {
            Ok(cmd) => println!("{} -> {:?}", from, cmd),
            Err(e) => log::warn!("{} -> unparseable {:?}: {}", from, line, e),
        }
    }
}
