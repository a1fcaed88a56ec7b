use std::env;
use std::net::SocketAddr;
use std::process;

use getopts::Options;
use tokio::time::Duration;

const SECS_PER_DAY: u64 = 60 * 60 * 24;

pub struct Args {
    pub address: SocketAddr,
    pub ttl: Duration,
    pub capacity: usize,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "t",
        "ttl",
        "Days a calendar is kept after its last save [Default: 30]",
        "DAYS",
    );
    opts.optopt(
        "c",
        "capacity",
        "Maximum number of stored calendars [Default: 100000]",
        "ENTRIES",
    );
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = match matches.opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
    {
        Ok(address) => address,
        Err(err) => {
            eprintln!("Provided value for option 'address' is invalid: {err}");
            process::exit(1);
        }
    };

    let ttl = match matches.opt_get_default::<u64>("ttl", 30) {
        Ok(days) if days > 0 => Duration::from_secs(days * SECS_PER_DAY),
        Ok(_) => {
            eprintln!("Provided value for option 'ttl' must be at least one day");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("Provided value for option 'ttl' is invalid: {err}");
            process::exit(1);
        }
    };

    let capacity = match matches.opt_get_default::<usize>("capacity", 100_000) {
        Ok(capacity) if capacity > 0 => capacity,
        Ok(_) => {
            eprintln!("Provided value for option 'capacity' must be positive");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("Provided value for option 'capacity' is invalid: {err}");
            process::exit(1);
        }
    };

    Args {
        address,
        ttl,
        capacity,
    }
}
