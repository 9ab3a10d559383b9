//! This module handles the "Universal Chess Interface" protocol
//! communication.
//!
//! The adapter is a line-oriented wrapper over the engine: it parses
//! GUI commands, translates move text to engine moves, allocates
//! thinking time from the clock, and prints `info`/`bestmove` lines.
//! Searches run on a background thread so that `stop` can interrupt
//! them; everything written to the output stream goes through one
//! shared mutex, whichever thread produces it.

use std::error::Error;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use crate::board::*;
use crate::depth::Depth;
use crate::engine::Engine;
use crate::moves::Move;
use crate::notation::{parse_uci_move, NotationError, UciMove};
use crate::position::Position;
use crate::search::{Limits, Report, Reporter};
use crate::search::tt::{TT_DEFAULT_SIZE_MB, TT_MAX_SIZE_MB, TT_MIN_SIZE_MB};
use crate::tablebase;
use crate::tablebase::TablebaseConfig;

/// A command from the GUI to the engine.
///
/// Besides the standard UCI commands the engine answers a few
/// diagnostic ones (`perft`, `eval`, `printfen`, `zobrist`,
/// `domove`) that are invaluable when debugging over a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    NewGame,
    SetOption(SetOptionParams),
    Position(PositionParams),
    Go(GoParams),
    Stop,
    Quit,
    Perft(Depth),
    Eval,
    PrintFen,
    Zobrist,
    DoMove(UciMove),
}

/// Parameters for `UciCommand::SetOption`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOptionParams {
    pub name: String,
    pub value: Option<String>,
}

/// Parameters for `UciCommand::Position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionParams {
    pub fen: String,
    pub moves: Vec<UciMove>,
}

/// Parameters for `UciCommand::Go`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoParams {
    pub depth: Option<Depth>,
    pub nodes: Option<u64>,
    pub movetime: Option<Duration>,
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub infinite: bool,
}

/// An error raised when a GUI line can not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for ParseError {}

impl From<NotationError> for ParseError {
    fn from(_: NotationError) -> ParseError {
        ParseError("invalid notation".to_string())
    }
}

/// Tries to interpret a string as a UCI command.
pub fn parse_uci_command(s: &str) -> Result<UciCommand, ParseError> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\b(setoption|isready|ucinewgame|position|go|stop|quit|uci|perft|eval|printfen|zobrist|domove)\s*(?:\s(.*)|$)").unwrap();
    }
    let captures = RE.captures(s)
                     .ok_or_else(|| ParseError(format!("unknown command '{}'", s.trim())))?;
    let command = captures.get(1).unwrap().as_str();
    let params = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    match command {
        "uci" => Ok(UciCommand::Uci),
        "isready" => Ok(UciCommand::IsReady),
        "ucinewgame" => Ok(UciCommand::NewGame),
        "stop" => Ok(UciCommand::Stop),
        "quit" => Ok(UciCommand::Quit),
        "eval" => Ok(UciCommand::Eval),
        "printfen" => Ok(UciCommand::PrintFen),
        "zobrist" => Ok(UciCommand::Zobrist),
        "setoption" => Ok(UciCommand::SetOption(parse_setoption_params(params)?)),
        "position" => Ok(UciCommand::Position(parse_position_params(params)?)),
        "go" => Ok(UciCommand::Go(parse_go_params(params)?)),
        "perft" => {
            let depth = params.trim()
                              .parse::<Depth>()
                              .map_err(|_| ParseError("invalid perft depth".to_string()))?;
            Ok(UciCommand::Perft(depth))
        }
        "domove" => {
            let m = parse_uci_move(params.trim())
                        .map_err(|_| ParseError(format!("invalid move '{}'", params.trim())))?;
            Ok(UciCommand::DoMove(m))
        }
        _ => Err(ParseError(format!("unknown command '{}'", command))),
    }
}

// A helper function for `parse_uci_command`. It parses parameters
// for the "setoption" command.
fn parse_setoption_params(s: &str) -> Result<SetOptionParams, ParseError> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^name\s+(.*?)(?:\s+value\s+(.*?))?\s*$").unwrap();
    }
    let captures = RE.captures(s)
                     .ok_or_else(|| ParseError("missing option name".to_string()))?;
    Ok(SetOptionParams {
        name: captures.get(1).unwrap().as_str().to_lowercase(),
        value: captures.get(2).map(|m| m.as_str().to_string()),
    })
}

// A helper function for `parse_uci_command`. It parses parameters
// for the "position" command.
fn parse_position_params(s: &str) -> Result<PositionParams, ParseError> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^(?:fen\s+(?P<fen>[1-8KQRBNPkqrbnp/]+\s+[wb]\s+(?:[KQkq]{1,4}|-)\s+(?:[a-h][1-8]|-)\s+\d+\s+\d+)|startpos)(?:\s+moves(?P<moves>(?:\s+[a-h][1-8][a-h][1-8][qrbn]?)*))?\s*$").unwrap();
    }
    let captures = RE.captures(s)
                     .ok_or_else(|| ParseError("invalid position parameters".to_string()))?;
    let fen = captures.name("fen")
                      .map(|m| m.as_str().to_string())
                      .unwrap_or_else(|| crate::position::START_POS_FEN.to_string());

    // Validate the FEN before accepting the command, so a bad
    // position leaves the engine state untouched.
    Position::from_fen(&fen).map_err(|_| ParseError(format!("invalid FEN '{}'", fen)))?;

    let mut moves = Vec::new();
    if let Some(list) = captures.name("moves") {
        for token in list.as_str().split_whitespace() {
            moves.push(parse_uci_move(token)
                           .map_err(|_| ParseError(format!("invalid move '{}'", token)))?);
        }
    }
    Ok(PositionParams {
        fen: fen,
        moves: moves,
    })
}

// A helper function for `parse_uci_command`. It parses parameters
// for the "go" command.
fn parse_go_params(s: &str) -> Result<GoParams, ParseError> {
    let mut params = GoParams::default();
    let tokens: Vec<_> = s.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        let keyword = tokens[i];
        if keyword == "infinite" {
            params.infinite = true;
            i += 1;
            continue;
        }
        let value = *tokens.get(i + 1)
                           .ok_or_else(|| {
                               ParseError(format!("missing value for '{}' attribute", keyword))
                           })?;
        match keyword {
            "depth" => params.depth = Some(parse_number::<Depth>(keyword, value)?),
            "nodes" => params.nodes = Some(parse_number::<u64>(keyword, value)?),
            "movetime" => params.movetime = Some(parse_duration(keyword, value)?),
            "wtime" => params.wtime = Some(parse_duration(keyword, value)?),
            "btime" => params.btime = Some(parse_duration(keyword, value)?),
            "winc" => params.winc = Some(parse_duration(keyword, value)?),
            "binc" => params.binc = Some(parse_duration(keyword, value)?),
            _ => return Err(ParseError(format!("unknown attribute '{}'", keyword))),
        }
        i += 2;
    }
    Ok(params)
}

fn parse_number<T: std::str::FromStr>(attribute: &str, value: &str) -> Result<T, ParseError> {
    value.parse::<T>()
         .map_err(|_| ParseError(format!("invalid value for '{}' attribute", attribute)))
}

fn parse_duration(attribute: &str, value: &str) -> Result<Duration, ParseError> {
    let ms = value.parse::<i64>()
                  .map_err(|_| {
                      ParseError(format!("invalid value for '{}' attribute", attribute))
                  })?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

/// Calculates how long to think on one move.
///
/// A thirtieth of the remaining time plus half the increment,
/// capped so that a safety reserve (a twentieth of the remaining
/// time, at least 50 milliseconds) always stays on the clock.
pub fn calculate_allocated_time(time_left: Duration, increment: Option<Duration>) -> Duration {
    if time_left.is_zero() {
        return time_left;
    }
    let reserve = std::cmp::max(time_left / 20, Duration::from_millis(50));
    let max_time = time_left.saturating_sub(reserve);
    std::cmp::min(time_left / 30 + increment.unwrap_or_default() / 2, max_time)
}

/// Reconstructs an engine move from UCI move text.
///
/// The moved piece is looked up on the origin square; a pawn landing
/// on the current en-passant target is an en-passant capture, with
/// the captured pawn filled in accordingly.
pub fn to_engine_move(uci_move: &UciMove, pos: &Position) -> Result<Move, NotationError> {
    let piece = pos.board.piece_at(uci_move.orig_square).ok_or(NotationError)?;
    let is_enpassant = is_pawn(piece) && pos.enpassant_square == Some(uci_move.dest_square);
    let captured_piece = if is_enpassant {
        Some(pawn(opponent(piece_color(piece))))
    } else {
        pos.board.piece_at(uci_move.dest_square)
    };
    Ok(Move {
        piece: piece,
        orig_square: uci_move.orig_square,
        dest_square: uci_move.dest_square,
        captured_piece: captured_piece,
        promotion_piece: uci_move.promotion_piece,
        is_enpassant: is_enpassant,
    })
}

/// A reporter that prints UCI `info` lines.
pub struct UciReporter<W: Write> {
    out: Arc<Mutex<W>>,
}

impl<W: Write> UciReporter<W> {
    pub fn new(out: Arc<Mutex<W>>) -> UciReporter<W> {
        UciReporter { out: out }
    }
}

impl<W: Write> Reporter for UciReporter<W> {
    fn send(&mut self, report: &Report) {
        let elapsed_ms = std::cmp::max(report.elapsed().as_millis() as u64, 1);
        let nps = report.nodes * 1000 / elapsed_ms;
        let hashfull = if report.tt_capacity == 0 {
            0
        } else {
            report.tt_usage * 1000 / report.tt_capacity
        };

        let mut line = format!("info depth {} nodes {} nps {} hashfull {} time {}",
                               report.depth,
                               report.nodes,
                               nps,
                               hashfull,
                               elapsed_ms);

        if let Some((ref pv, value)) = report.pv {
            if let Some(plies) = report.plies_until_mate() {
                // UCI mate scores count full moves, not plies.
                let moves_until_mate = (plies + 1) / 2;
                let sign = if value >= 0 { 1 } else { -1 };
                line.push_str(&format!(" score mate {}", sign * moves_until_mate as i32));
            } else {
                line.push_str(&format!(" score cp {}", value));
            }
            if !pv.is_empty() {
                line.push_str(" pv");
                for m in pv.iter() {
                    line.push(' ');
                    line.push_str(&m.notation());
                }
            }
        }

        let mut out = self.out.lock().unwrap();
        writeln!(out, "{}", line).ok();
        out.flush().ok();
    }
}

// A running background search: the thread and the flag that stops
// it.
struct SearchHandle {
    thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
}

impl SearchHandle {
    fn idle() -> SearchHandle {
        SearchHandle {
            thread: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals the running search to stop and waits for it.
    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn write_line<W: Write>(out: &Arc<Mutex<W>>, line: &str) {
    info!("<engine>: {}", line);
    let mut out = out.lock().unwrap();
    writeln!(out, "{}", line).ok();
    out.flush().ok();
}

/// The main UCI serving loop.
///
/// Drives a given engine from commands read line by line until
/// `quit` or end of input. All mutations of the engine state first
/// stop and join any running search, so the search thread is the
/// only one touching the engine while it thinks.
pub fn run_loop<R, W>(engine: Engine, input: R, out: Arc<Mutex<W>>)
    where R: BufRead,
          W: Write + Send + 'static
{
    let engine = Arc::new(Mutex::new(engine));
    let mut search_handle = SearchHandle::idle();

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        info!("<gui>: {}", line);

        let command = match parse_uci_command(&line) {
            Ok(command) => command,
            Err(error) => {
                write_line(&out, &format!("error: {}", error));
                continue;
            }
        };

        match command {
            UciCommand::Uci => {
                write_line(&out, &format!("id name {}", engine_id()));
                write_line(&out, &format!("id author {}", ENGINE_AUTHOR));
                write_line(&out,
                           &format!("option name Hash type spin default {} min {} max {}",
                                    TT_DEFAULT_SIZE_MB,
                                    TT_MIN_SIZE_MB,
                                    TT_MAX_SIZE_MB));
                write_line(&out, "option name SyzygyPath type string default <empty>");
                write_line(&out,
                           "option name SyzygyProbeDepth type spin default 1 min 1 max 100");
                write_line(&out, "option name Syzygy50MoveRule type check default true");
                write_line(&out,
                           "option name SyzygyProbeLimit type spin default 6 min 0 max 7");
                write_line(&out, "uciok");
            }

            UciCommand::IsReady => {
                write_line(&out, "readyok");
            }

            UciCommand::NewGame => {
                search_handle.stop();
                engine.lock().unwrap().new_game();
            }

            UciCommand::Position(params) => {
                search_handle.stop();
                let mut engine = engine.lock().unwrap();
                if let Err(error) = apply_position_command(&params, &mut engine) {
                    write_line(&out, &format!("error: {}", error));
                }
            }

            UciCommand::Go(params) => {
                search_handle.stop();

                let limits = {
                    let engine = engine.lock().unwrap();
                    go_limits(&params, engine.position().to_move)
                };

                let stop_flag = Arc::new(AtomicBool::new(false));
                search_handle.stop_flag = stop_flag.clone();
                let engine = engine.clone();
                let out = out.clone();
                search_handle.thread = Some(std::thread::spawn(move || {
                    let mut reporter = UciReporter::new(out.clone());
                    let result = engine.lock()
                                       .unwrap()
                                       .search(&limits, &mut reporter, Some(stop_flag));
                    match result.pv.first() {
                        Some(m) => write_line(&out, &format!("bestmove {}", m.notation())),
                        None => write_line(&out, "bestmove (none)"),
                    }
                }));
            }

            UciCommand::SetOption(option) => {
                search_handle.stop();
                if let Err(error) = apply_setoption_command(&option, &engine) {
                    write_line(&out, &format!("error: {}", error));
                }
            }

            UciCommand::Perft(depth) => {
                search_handle.stop();
                let started = std::time::Instant::now();
                let nodes = engine.lock().unwrap().perft(depth);
                let ms = std::cmp::max(started.elapsed().as_millis() as u64, 1);
                write_line(&out, &format!("nodes: {}", nodes));
                write_line(&out, &format!("time: {} ms", ms));
                write_line(&out, &format!("nps: {}", nodes * 1000 / ms));
            }

            UciCommand::Eval => {
                search_handle.stop();
                let value = engine.lock().unwrap().evaluate_static();
                write_line(&out, &format!("eval: {}", value));
            }

            UciCommand::PrintFen => {
                search_handle.stop();
                let fen = engine.lock().unwrap().position().to_fen();
                write_line(&out, &fen);
            }

            UciCommand::Zobrist => {
                search_handle.stop();
                let key = engine.lock().unwrap().position().key;
                write_line(&out, &format!("zobrist: {:#018x}", key));
            }

            UciCommand::DoMove(uci_move) => {
                search_handle.stop();
                let mut engine = engine.lock().unwrap();
                let m = to_engine_move(&uci_move, engine.position());
                match m {
                    Ok(m) => engine.apply_move(&m),
                    Err(error) => write_line(&out, &format!("error: {}", error)),
                }
            }

            UciCommand::Stop => {
                search_handle.stop();
            }

            UciCommand::Quit => {
                search_handle.stop();
                return;
            }
        }
    }
}

/// Runs the UCI serving loop over standard input and output.
pub fn run_forever(engine: Engine) {
    let stdin = io::stdin();
    let out = Arc::new(Mutex::new(io::stdout()));
    run_loop(engine, stdin.lock(), out);
}

const ENGINE_AUTHOR: &str = "the lysander developers";

fn engine_id() -> String {
    format!("lysander {}", env!("CARGO_PKG_VERSION"))
}

/// Applies a parsed `position` command to the engine.
fn apply_position_command(params: &PositionParams, engine: &mut Engine)
                          -> Result<(), ParseError> {
    engine.set_position_from_fen(&params.fen)?;
    for uci_move in params.moves.iter() {
        let m = to_engine_move(uci_move, engine.position())?;
        engine.apply_move(&m);
    }
    Ok(())
}

/// Applies a parsed `setoption` command.
fn apply_setoption_command(option: &SetOptionParams, engine: &Arc<Mutex<Engine>>)
                           -> Result<(), ParseError> {
    let value = option.value.as_deref();
    match option.name.as_str() {
        "hash" => {
            let size_mb = parse_number::<usize>("hash", value.unwrap_or(""))?;
            if !(TT_MIN_SIZE_MB..=TT_MAX_SIZE_MB).contains(&size_mb) {
                return Err(ParseError("invalid value for 'hash' option".to_string()));
            }
            engine.lock().unwrap().set_hash_size_mb(size_mb);
        }
        "syzygypath" => {
            let path = value.unwrap_or("");
            TablebaseConfig::set_path(path);
            tablebase::init(path);
        }
        "syzygyprobedepth" => {
            TablebaseConfig::set_probe_depth(parse_number::<u8>("syzygyprobedepth",
                                                                value.unwrap_or(""))?);
        }
        "syzygy50moverule" => {
            match value {
                Some("true") => TablebaseConfig::set_50_move_rule(true),
                Some("false") => TablebaseConfig::set_50_move_rule(false),
                _ => {
                    return Err(ParseError("invalid value for 'syzygy50moverule' option"
                                              .to_string()))
                }
            }
        }
        "syzygyprobelimit" => {
            let limit = parse_number::<u8>("syzygyprobelimit", value.unwrap_or(""))?;
            if limit > 7 {
                return Err(ParseError("invalid value for 'syzygyprobelimit' option"
                                          .to_string()));
            }
            TablebaseConfig::set_probe_limit(limit);
        }
        _ => return Err(ParseError(format!("unknown option '{}'", option.name))),
    }
    Ok(())
}

/// Builds search limits from `go` parameters.
///
/// An explicit `movetime` wins; otherwise the side to move's clock
/// and increment are fed to the allocation heuristic.
fn go_limits(params: &GoParams, to_move: Color) -> Limits {
    let time = if params.infinite {
        None
    } else if params.movetime.is_some() {
        params.movetime
    } else {
        let (time_left, increment) = if to_move == WHITE {
            (params.wtime, params.winc)
        } else {
            (params.btime, params.binc)
        };
        time_left.map(|time_left| calculate_allocated_time(time_left, increment))
    };
    Limits {
        depth: params.depth,
        nodes: params.nodes,
        time: time,
    }
}
