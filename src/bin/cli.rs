use clap::{App, Arg};
use log::info;
use relais::{RelaisError, RelayConfig, RelayServer, Result};
use std::net::SocketAddr;

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("relais-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Readiness-driven TCP relay between a listen address and a fixed origin")
        .arg(
            Arg::with_name("listen")
                .short("l")
                .long("listen")
                .value_name("ADDR")
                .help("Address to listen on, e.g. 127.0.0.1:1110")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("origin")
                .short("o")
                .long("origin")
                .value_name("ADDR")
                .help("Origin address every session dials, e.g. 127.0.0.1:110")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("buffer-size")
                .short("b")
                .long("buffer-size")
                .value_name("BYTES")
                .help("Capacity of each backpressure window in bytes")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("max-pool")
                .long("max-pool")
                .value_name("COUNT")
                .help("Maximum number of retired sessions kept for reuse")
                .takes_value(true),
        )
        .get_matches();

    let listen = parse_addr("listen", matches.value_of("listen"))?;
    let origin = parse_addr("origin", matches.value_of("origin"))?;

    let mut config = RelayConfig::new(listen, origin);
    if let Some(value) = matches.value_of("buffer-size") {
        config = config.with_window_capacity(parse_number("buffer-size", value)?);
    }
    if let Some(value) = matches.value_of("max-pool") {
        config = config.with_max_pool(parse_number("max-pool", value)?);
    }

    let mut server = RelayServer::new(config)?;
    info!(
        "relais {} listening on {}, origin {}",
        relais::VERSION,
        server.local_addr()?,
        origin
    );
    server.run()
}

fn parse_addr(name: &str, value: Option<&str>) -> Result<SocketAddr> {
    let value = value.ok_or_else(|| RelaisError::invalid_parameter(name, "missing value"))?;
    value.parse().map_err(|_| {
        RelaisError::invalid_parameter(name, format!("'{}' is not a valid socket address", value))
    })
}

fn parse_number(name: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        RelaisError::invalid_parameter(name, format!("'{}' is not a valid number", value))
    })
}
