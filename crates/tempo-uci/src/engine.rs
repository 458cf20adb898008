//! Event-driven UCI engine: the I/O loop runs on the main thread and hands
//! each search off to a worker thread so `stop`/`quit` stay responsive while
//! the (single-threaded) search runs.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use tracing::{debug, info, warn};

use tempo_core::{Board, PositionHistory};
use tempo_engine::search::tt::{DEFAULT_SIZE_MB, MAX_HASH_SIZE_MB};
use tempo_engine::{SearchControl, SearchResult, Searcher, limits_from_go};

use crate::command::{GoParams, parse_command, Command};
use crate::error::UciError;

/// Internal engine state — tracks whether the engine is idle or searching.
enum EngineState {
    Idle,
    Searching,
}

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    searcher: Searcher,
}

/// The UCI engine, holding current board state and searcher.
///
/// Runs an event-driven loop on the main thread, dispatching searches
/// to a worker thread and processing UCI commands concurrently.
pub struct UciEngine {
    board: Board,
    /// Zobrist hashes of every position played so far this game, fed to the
    /// searcher as `root_history` so repetitions spanning prior moves and the
    /// current search tree are both visible.
    position_history: PositionHistory,
    searcher: Option<Searcher>,
    state: EngineState,
    stop_flag: Arc<AtomicBool>,
    control: Option<Arc<SearchControl>>,
    pending_clear_tt: bool,
    /// Deferred `setoption name Hash` size, applied once the searcher is idle.
    pending_resize_mb: Option<usize>,
    /// `OwnBook` setting — recognised but acted on by an external book lookup.
    #[allow(dead_code)]
    own_book: bool,
}

impl UciEngine {
    /// Create a new engine with the starting position.
    pub fn new() -> Self {
        Self {
            board: Board::starting_position(),
            position_history: PositionHistory::new(),
            searcher: Some(Searcher::new()),
            state: EngineState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            control: None,
            pending_clear_tt: false,
            pending_resize_mb: None,
            own_book: false,
        }
    }

    /// Run the UCI event loop, reading from stdin until `quit` or input closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        // Spawn stdin reader thread
        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            let reader = stdin.lock();
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        let trimmed = line.trim().to_string();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(cmd = %trimmed, "received UCI command");
                        let cmd = parse_command(&trimmed);
                        if stdin_tx.send(EngineEvent::UciCommand(cmd)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        let _ = stdin_tx.send(EngineEvent::InputClosed);
                        break;
                    }
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => self.handle_isready(),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(board, history) => self.handle_position(board, history),
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::Stop => self.handle_stop(),
                    Command::SetOption { name, value } => self.handle_setoption(&name, value),
                    Command::Quit => {
                        // Stop any active search and wait for it to finish
                        if !matches!(self.state, EngineState::Idle) {
                            self.handle_stop();
                            // Drain events until we get SearchDone
                            for ev in &rx {
                                if let EngineEvent::SearchDone(done) = ev {
                                    self.finish_search(done);
                                    break;
                                }
                            }
                        }
                        break;
                    }
                    Command::Unknown(_) => {}
                },
                EngineEvent::UciCommand(Err(e)) => {
                    warn!(error = %e, "UCI parse error");
                }
                EngineEvent::SearchDone(done) => {
                    self.finish_search(done);
                }
                EngineEvent::InputClosed => break,
            }
        }

        info!("tempo shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name tempo");
        println!("id author Nicolas Lazaro");
        println!(
            "option name Hash type spin default {DEFAULT_SIZE_MB} min 1 max {MAX_HASH_SIZE_MB}"
        );
        println!("option name OwnBook type check default false");
        println!("uciok");
    }

    fn handle_isready(&mut self) {
        self.apply_pending_resize();
        println!("readyok");
    }

    /// Parse and store (or apply) a `setoption` command.
    ///
    /// `Hash` is deferred via `pending_resize_mb` — §6.4 specifies the resize
    /// takes effect "on next isready", and a mid-search resize would race the
    /// search thread that currently owns the searcher.
    fn handle_setoption(&mut self, name: &str, value: Option<String>) {
        match name {
            "hash" => {
                let Some(raw) = value else {
                    warn!("setoption Hash missing value");
                    return;
                };
                match raw.trim().parse::<usize>() {
                    Ok(mb) => {
                        self.pending_resize_mb = Some(mb.clamp(1, MAX_HASH_SIZE_MB));
                    }
                    Err(_) => warn!(value = %raw, "setoption Hash: not an integer"),
                }
            }
            "ownbook" => {
                self.own_book = value.as_deref().is_some_and(|v| v.eq_ignore_ascii_case("true"));
            }
            _ => debug!(option = %name, "ignoring unrecognised setoption"),
        }
    }

    /// Apply a deferred `Hash` resize once the engine is idle (or defer again
    /// if a search is still running — the searcher is owned by its thread).
    fn apply_pending_resize(&mut self) {
        let Some(mb) = self.pending_resize_mb else {
            return;
        };
        if let Some(ref mut searcher) = self.searcher {
            searcher.resize_tt(mb);
            self.pending_resize_mb = None;
        }
        // else: still searching — retried on the next isready or at finish_search.
    }

    fn handle_ucinewgame(&mut self) {
        self.board = Board::starting_position();
        self.position_history.clear();
        if let Some(ref mut searcher) = self.searcher {
            searcher.clear_tt();
        } else {
            // Search thread owns the searcher — defer clear until it comes back
            self.pending_clear_tt = true;
        }
    }

    fn handle_position(&mut self, board: Board, history: PositionHistory) {
        self.board = board;
        self.position_history = history;
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if !matches!(self.state, EngineState::Idle) {
            warn!("go received while not idle, ignoring");
            return;
        }

        // Reset stop flag
        self.stop_flag = Arc::new(AtomicBool::new(false));

        let side = self.board.side_to_move();
        let control = Arc::new(limits_from_go(
            params.wtime,
            params.btime,
            params.winc,
            params.binc,
            params.movestogo,
            params.movetime,
            params.infinite,
            side,
            Arc::clone(&self.stop_flag),
        ));

        // 99 plies is effectively unbounded: time management, not depth, ends the search.
        let max_depth = params.depth.unwrap_or(99);

        // Take the searcher — the search thread will own it
        let mut searcher = self.searcher.take().unwrap_or_default();

        let board = self.board;
        let root_history: Vec<u64> = self.position_history.hashes().to_vec();
        let search_control = Arc::clone(&control);
        let tx = tx.clone();

        std::thread::spawn(move || {
            let result = searcher.search(
                &board,
                &root_history,
                max_depth,
                &search_control,
                |d, score, nodes, pv| {
                    let elapsed = search_control.elapsed();
                    let elapsed_ms = elapsed.as_millis().max(1);
                    let nps = (nodes as u128 * 1000) / elapsed_ms;

                    let pv_str: String = pv
                        .iter()
                        .filter(|m| !m.is_null())
                        .map(|m| m.to_uci())
                        .collect::<Vec<_>>()
                        .join(" ");

                    println!(
                        "info depth {} score {} nodes {} nps {} time {} pv {}",
                        d,
                        format_score(score),
                        nodes,
                        nps,
                        elapsed_ms,
                        pv_str
                    );
                });
            let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, searcher }));
        });

        self.state = EngineState::Searching;
        self.control = Some(control);
    }

    fn handle_stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    fn finish_search(&mut self, done: SearchDone) {
        let mut searcher = done.searcher;

        if self.pending_clear_tt {
            searcher.clear_tt();
            self.pending_clear_tt = false;
        }

        self.searcher = Some(searcher);
        self.control = None;
        self.apply_pending_resize();

        let result = &done.result;
        if result.best_move.is_null() {
            println!("bestmove 0000");
        } else {
            println!("bestmove {}", result.best_move.to_uci());
        }

        self.state = EngineState::Idle;
    }
}

/// Format a centipawn score as a UCI `score` token: `cp N` or `mate K`.
///
/// `K` is the number of full moves to mate, signed from the engine's
/// perspective (positive = engine mates, negative = engine gets mated).
fn format_score(score: i32) -> String {
    use tempo_engine::search::negamax::{MATE_SCORE, MATE_THRESHOLD};

    if score.abs() >= MATE_THRESHOLD {
        let plies_to_mate = MATE_SCORE - score.abs();
        let moves_to_mate = (plies_to_mate + 1) / 2;
        let signed = if score > 0 { moves_to_mate } else { -moves_to_mate };
        format!("mate {signed}")
    } else {
        format!("cp {score}")
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}
