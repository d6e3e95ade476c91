use clap::{App, Arg};
use colored::*;
use cushion_remote::frame::{decode_frame, MAX_PACKET_SIZE};
use tokio::net::UdpSocket;
use tracing::{error, info};

const DEFAULT_BIND: &str = "127.0.0.1:7868";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("cushion-monitor")
        .version("0.1.0")
        .author("Air Cushion Controls Team")
        .about("📻 Receives and decodes air-cushion remote frames forwarded over UDP")
        .arg(
            Arg::with_name("bind")
                .short("b")
                .long("bind")
                .value_name("ADDR")
                .help("Local address to listen on")
                .takes_value(true)
                .default_value(DEFAULT_BIND),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["table", "json"])
                .default_value("table"),
        )
        .get_matches();

    tracing_subscriber::fmt::init();

    let bind = matches.value_of("bind").unwrap_or(DEFAULT_BIND);
    let json = matches.value_of("format") == Some("json");

    let socket = UdpSocket::bind(bind).await?;
    info!("📻 Listening for frames on {}", socket.local_addr()?);

    let mut buf = [0u8; MAX_PACKET_SIZE];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;

        let frame = match decode_frame(&buf[..len]) {
            Ok(frame) => frame,
            Err(e) => {
                error!("❌ Bad frame from {}: {}", from, e);
                continue;
            }
        };

        if json {
            println!("{}", serde_json::to_string(&frame)?);
            continue;
        }

        let code = frame.height_mass_code;
        match code.split() {
            Some((height, mass)) => println!(
                "{} {:>2}  height {}  mass {}",
                "CODE".green().bold(),
                code,
                height,
                mass
            ),
            // Receivers must not treat this as cushion level zero
            None => println!("{} {:>2}  no valid command", "CODE".yellow().bold(), code),
        }
    }
}
