//! The command-line entry point.

use std::error::Error;
use std::fs::File;
use std::time::Instant;
use clap::{Arg, ArgAction, Command};
use simplelog::{Config, LevelFilter, WriteLogger};
use lysander::position::Position;
use lysander::position::move_generation::perft;
use lysander::search::tt::{TT_MAX_SIZE_MB, TT_MIN_SIZE_MB};
use lysander::uci;
use lysander::Engine;

fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("lysander")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A UCI chess engine.")
        .arg(Arg::new("log")
                 .long("log")
                 .short('l')
                 .action(ArgAction::SetTrue)
                 .global(true)
                 .help("Turns on logging"))
        .arg(Arg::new("log-file")
                 .long("log-file")
                 .value_name("LOG_FILE")
                 .global(true)
                 .default_value("lysander.log")
                 .help("Sets the log file if logging is turned on"))
        .arg(Arg::new("log-level")
                 .long("log-level")
                 .value_name("LEVEL")
                 .global(true)
                 .default_value("info")
                 .help("Sets the log level if logging is turned on"))
        .arg(Arg::new("hash")
                 .long("hash")
                 .value_name("MEGABYTES")
                 .default_value("64")
                 .help("Sets the transposition table size in megabytes"))
        .subcommand(Command::new("perft")
                        .about("Counts the leaf nodes of the legal-move tree from a given \
                                position. Defaults to the standard starting position.")
                        .arg(Arg::new("depth")
                                 .long("depth")
                                 .short('d')
                                 .value_name("DEPTH")
                                 .default_value("5")
                                 .help("The depth to count to"))
                        .arg(Arg::new("fen")
                                 .long("fen")
                                 .value_name("FEN")
                                 .help("The position to count from")))
        .get_matches();

    if matches.get_flag("log") {
        let level = match matches.get_one::<String>("log-level").map(String::as_str) {
            Some("trace") => LevelFilter::Trace,
            Some("debug") => LevelFilter::Debug,
            Some("warn") => LevelFilter::Warn,
            Some("error") => LevelFilter::Error,
            _ => LevelFilter::Info,
        };
        let log_file = matches.get_one::<String>("log-file").unwrap();
        WriteLogger::init(level, Config::default(), File::create(log_file)?)?;
    }

    if let Some(matches) = matches.subcommand_matches("perft") {
        let depth = matches.get_one::<String>("depth").unwrap().parse::<u8>()?;
        let mut position = match matches.get_one::<String>("fen") {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::startpos(),
        };
        for depth in 1..=depth {
            let started = Instant::now();
            let nodes = perft(&mut position, depth);
            println!("perft({}) = {} ({:.3} s)",
                     depth,
                     nodes,
                     started.elapsed().as_secs_f64());
        }
        return Ok(());
    }

    let size_mb = matches.get_one::<String>("hash").unwrap().parse::<usize>()?;
    let mut engine = Engine::new();
    engine.set_hash_size_mb(size_mb.clamp(TT_MIN_SIZE_MB, TT_MAX_SIZE_MB));

    uci::run_forever(engine);
    Ok(())
}
