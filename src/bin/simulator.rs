use clap::{App, Arg, ArgMatches};
use colored::*;
use cushion_remote::config::TransmitterConfig;
use cushion_remote::encoder::{Position, SwitchOrdinal, UNCLEAN_ORDINAL};
use cushion_remote::error::RadioError;
use cushion_remote::peripherals::sim::{SimBattery, SimLed, SimRadio, SimSwitch};
use cushion_remote::peripherals::{Peripherals, RadioLink, VoltageDivider};
use cushion_remote::scheduler::{SystemClock, SystemDelay};
use cushion_remote::Transmitter;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time;
use tracing::{info, warn, Level};

const LOOP_IDLE: Duration = Duration::from_millis(1);
const LED_REFRESH_MS: u64 = 50;

/// In-memory radio that also forwards every accepted packet over UDP.
struct SimulatorRadio {
    inner: SimRadio,
    uplink: Option<(UdpSocket, SocketAddr)>,
}

impl RadioLink for SimulatorRadio {
    fn init(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        self.inner.init(frequency_hz)
    }

    fn transmit(&mut self, payload: &[u8]) -> nb::Result<(), RadioError> {
        self.inner.transmit(payload)?;

        println!("📡 {}", String::from_utf8_lossy(payload).cyan());
        if let Some((socket, target)) = &self.uplink {
            if let Err(e) = socket.send_to(payload, target) {
                warn!("UDP forward to {} failed: {}", target, e);
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("cushion-simulator")
        .version("0.1.0")
        .author("Air Cushion Controls Team")
        .about("🎛️  Air-cushion remote transmitter running against simulated hardware")
        .arg(position_arg("height", "Initial height selector position"))
        .arg(position_arg("mass", "Initial mass selector position"))
        .arg(
            Arg::with_name("voltage")
                .long("voltage")
                .value_name("VOLTS")
                .help("Initial battery voltage")
                .takes_value(true)
                .default_value("3.9")
                .validator(|v| v.parse::<f32>().map(|_| ()).map_err(|_| "voltage must be a number".into())),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON config file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("udp")
                .short("u")
                .long("udp")
                .value_name("ADDR")
                .help("Forward transmitted packets to this UDP address (see cushion-monitor)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("absent-radio")
                .long("absent-radio")
                .help("Simulate a missing radio to exercise the fault display"),
        )
        .arg(
            Arg::with_name("adc")
                .long("adc")
                .help("Quantize battery readings through the board's ADC divider"),
        )
        .arg(
            Arg::with_name("diagnostics")
                .short("d")
                .long("diagnostics")
                .help("Mirror switch readings and outgoing frames on the log"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = match matches.value_of("config") {
        Some(path) => TransmitterConfig::load(path)?,
        None => TransmitterConfig::default(),
    };
    if matches.is_present("diagnostics") {
        config.diagnostics = true;
    }

    let height = SimSwitch::new(parse_position(&matches, "height"));
    let mass = SimSwitch::new(parse_position(&matches, "mass"));
    let volts: f32 = matches.value_of("voltage").unwrap_or("3.9").parse()?;
    let battery = if matches.is_present("adc") {
        SimBattery::with_adc(volts, VoltageDivider::default_board())
    } else {
        SimBattery::new(volts)
    };
    let power_led = SimLed::new(false);
    let link_led = SimLed::new(false);

    let uplink = match matches.value_of("udp") {
        Some(addr) => {
            let target: SocketAddr = addr.parse()?;
            let socket = UdpSocket::bind("0.0.0.0:0")?;
            info!("🔗 Forwarding packets to {}", target);
            Some((socket, target))
        }
        None => None,
    };
    let radio = SimulatorRadio {
        inner: if matches.is_present("absent-radio") { SimRadio::absent() } else { SimRadio::new() },
        uplink,
    };

    println!("🎛️  Air-Cushion Remote Simulator");
    println!("================================");
    println!("Commands: height <L|M|H|X>, mass <L|M|H|X>, voltage <VOLTS>, quit");

    let peripherals = Peripherals {
        height_switch: height.clone(),
        mass_switch: mass.clone(),
        battery: battery.clone(),
        radio,
        power_led: power_led.clone(),
        link_led: link_led.clone(),
    };

    // The control loop is single-threaded and never yields; keep it off the runtime.
    let control_loop = tokio::task::spawn_blocking(move || {
        let mut transmitter = Transmitter::boot(peripherals, SystemClock::new(), SystemDelay, config);
        transmitter.run(|| std::thread::sleep(LOOP_IDLE))
    });

    let leds = tokio::spawn(watch_leds(power_led, link_led));

    tokio::select! {
        result = operator_console(height, mass, battery) => result?,
        _ = tokio::signal::ctrl_c() => {}
        result = control_loop => {
            if let Err(e) = result {
                warn!("control loop ended: {}", e);
            }
        }
    }

    leds.abort();
    println!("🛑 Simulator stopped");
    // The blocking control loop never returns on its own
    std::process::exit(0);
}

fn position_arg(name: &'static str, help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name)
        .long(name)
        .value_name("POSITION")
        .help(help)
        .takes_value(true)
        .possible_values(&["L", "M", "H"])
        .default_value("L")
}

fn parse_position(matches: &ArgMatches, name: &str) -> Position {
    match matches.value_of(name) {
        Some("M") => Position::Medium,
        Some("H") => Position::High,
        _ => Position::Low,
    }
}

fn parse_ordinal(token: &str) -> Option<SwitchOrdinal> {
    match token.to_ascii_uppercase().as_str() {
        "L" | "0" => Some(Position::Low.ordinal()),
        "M" | "1" => Some(Position::Medium.ordinal()),
        "H" | "2" => Some(Position::High.ordinal()),
        // Between detents: no contact closed
        "X" => Some(UNCLEAN_ORDINAL),
        _ => None,
    }
}

async fn operator_console(
    height: SimSwitch,
    mass: SimSwitch,
    battery: SimBattery,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("height"), Some(token)) => match parse_ordinal(token) {
                Some(ordinal) => height.set_ordinal(ordinal),
                None => println!("{}", format!("unknown position '{}'", token).red()),
            },
            (Some("mass"), Some(token)) => match parse_ordinal(token) {
                Some(ordinal) => mass.set_ordinal(ordinal),
                None => println!("{}", format!("unknown position '{}'", token).red()),
            },
            (Some("voltage"), Some(token)) => match token.parse::<f32>() {
                Ok(volts) => battery.set_voltage(volts),
                Err(_) => println!("{}", format!("invalid voltage '{}'", token).red()),
            },
            (Some("quit"), None) | (Some("exit"), None) => break,
            (None, _) => {}
            _ => println!("{}", "commands: height <L|M|H|X>, mass <L|M|H|X>, voltage <VOLTS>, quit".yellow()),
        }
    }

    Ok(())
}

async fn watch_leds(power_led: SimLed, link_led: SimLed) {
    let mut interval = time::interval(Duration::from_millis(LED_REFRESH_MS));
    let mut last = None;

    loop {
        interval.tick().await;
        let now = (power_led.is_lit(), link_led.is_lit());
        if last != Some(now) {
            println!("💡 PWR {}  LINK {}", led_label(now.0, "green"), led_label(now.1, "blue"));
            last = Some(now);
        }
    }
}

fn led_label(lit: bool, color: &str) -> ColoredString {
    if lit {
        "●".color(color)
    } else {
        "○".dimmed()
    }
}
