//! UCI command parsing.

use std::time::Duration;

use tempo_core::{Board, Move, PositionHistory};

use crate::error::UciError;

/// Parsed parameters from a `go` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoParams {
    /// White's remaining clock time.
    pub wtime: Option<Duration>,
    /// Black's remaining clock time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves remaining until the next time control.
    pub movestogo: Option<u32>,
    /// Fixed time to search for this move.
    pub movetime: Option<Duration>,
    /// Maximum search depth in plies.
    pub depth: Option<u8>,
    /// Search until `stop` is received, ignoring time management.
    pub infinite: bool,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- set up a board position with optional moves applied.
    ///
    /// The second field is the Zobrist hash of every position reached by
    /// the moves list, in order, ending with the resulting board's own
    /// hash — fed to the searcher so in-game repetitions are visible at
    /// the root, not just within a single search tree.
    Position(Board, PositionHistory),
    /// `go [wtime/btime/...] [depth N] [movetime N] [infinite]` -- start a search.
    Go(GoParams),
    /// `stop` -- halt the current search.
    Stop,
    /// `setoption name <id> [value <x>]` -- change an engine configuration option.
    SetOption {
        /// The option's `name` field, lowercased.
        name: String,
        /// The option's `value` field, if given, verbatim.
        value: Option<String>,
    },
    /// `quit` -- exit the engine.
    Quit,
    /// Unrecognized command, or a recognised-but-unsupported one (e.g. `ponderhit`):
    /// silently ignored per UCI spec.
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Command::Unknown(String::new()));
    }

    match tokens[0] {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        "setoption" => parse_setoption(&tokens[1..]),
        other => Ok(Command::Unknown(other.to_string())),
    }
}

/// Parse `setoption name <id> [value <x>]`.
///
/// The option name may contain spaces (e.g. "Clear Hash"), so everything
/// between `name` and `value` (or end of line) is joined and lowercased.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let Some(name_pos) = tokens.iter().position(|&t| t == "name") else {
        return Ok(Command::Unknown("setoption".to_string()));
    };
    let rest = &tokens[name_pos + 1..];
    let value_pos = rest.iter().position(|&t| t == "value");

    let (name_tokens, value) = match value_pos {
        Some(vp) => (&rest[..vp], Some(rest[vp + 1..].join(" "))),
        None => (rest, None),
    };

    if name_tokens.is_empty() {
        return Ok(Command::Unknown("setoption".to_string()));
    }

    Ok(Command::SetOption {
        name: name_tokens.join(" ").to_lowercase(),
        value,
    })
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (mut board, rest) = if tokens[0] == "startpos" {
        let rest = &tokens[1..];
        (Board::starting_position(), rest)
    } else if tokens[0] == "fen" {
        // FEN is 6 space-separated fields
        if tokens.len() < 7 {
            return Err(UciError::InvalidFen {
                fen: tokens[1..].join(" "),
            });
        }
        let fen = tokens[1..7].join(" ");
        let board: Board = fen.parse().map_err(|_| UciError::InvalidFen {
            fen: fen.clone(),
        })?;
        (board, &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    // Apply moves if present: "moves e2e4 d7d5 ..."
    let mut history = PositionHistory::new();
    if !rest.is_empty() && rest[0] == "moves" {
        for uci_str in &rest[1..] {
            let mv = Move::from_uci(uci_str, &board).ok_or_else(|| UciError::InvalidMove {
                uci_move: uci_str.to_string(),
            })?;
            board = board.make_move(mv);
            history.push(board.hash());
        }
    }

    Ok(Command::Position(board, history))
}

/// Parse the `go` command arguments into [`GoParams`].
///
/// Recognises `wtime`, `btime`, `winc`, `binc`, `movestogo`, `movetime`,
/// `depth` and `infinite`. Unrecognised subtokens (`ponder`, `searchmoves`,
/// `nodes`, `mate`) are skipped rather than rejected — they are valid UCI
/// tokens the core search does not act on.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            "ponder" => {
                i += 1;
            }
            "wtime" => {
                params.wtime = Some(parse_millis(tokens, &mut i, "wtime")?);
            }
            "btime" => {
                params.btime = Some(parse_millis(tokens, &mut i, "btime")?);
            }
            "winc" => {
                params.winc = Some(parse_millis(tokens, &mut i, "winc")?);
            }
            "binc" => {
                params.binc = Some(parse_millis(tokens, &mut i, "binc")?);
            }
            "movetime" => {
                params.movetime = Some(parse_millis(tokens, &mut i, "movetime")?);
            }
            "movestogo" => {
                params.movestogo = Some(parse_next(tokens, &mut i, "movestogo")?);
            }
            "depth" => {
                params.depth = Some(parse_next(tokens, &mut i, "depth")?);
            }
            // searchmoves takes a move list until the next known keyword; since the
            // core searches all legal moves, we skip the token without consuming
            // the moves that follow it.
            _ => {
                i += 1;
            }
        }
    }

    Ok(Command::Go(params))
}

/// Consume `tokens[*i]` (the keyword) and `tokens[*i + 1]` (its value),
/// parsing the value as milliseconds.
fn parse_millis(tokens: &[&str], i: &mut usize, param: &str) -> Result<Duration, UciError> {
    let value: u64 = parse_next(tokens, i, param)?;
    Ok(Duration::from_millis(value))
}

/// Consume `tokens[*i]` (the keyword) and `tokens[*i + 1]` (its value),
/// parsing the value with [`std::str::FromStr`].
fn parse_next<T: std::str::FromStr>(
    tokens: &[&str],
    i: &mut usize,
    param: &str,
) -> Result<T, UciError> {
    let Some(raw) = tokens.get(*i + 1) else {
        return Err(UciError::MissingGoValue {
            param: param.to_string(),
        });
    };
    let parsed = raw.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: raw.to_string(),
    })?;
    *i += 2;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uci() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
    }

    #[test]
    fn parse_isready() {
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
    }

    #[test]
    fn parse_quit() {
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
    }

    #[test]
    fn parse_ucinewgame() {
        assert!(matches!(
            parse_command("ucinewgame").unwrap(),
            Command::UciNewGame
        ));
    }

    #[test]
    fn parse_position_startpos() {
        let cmd = parse_command("position startpos").unwrap();
        assert!(matches!(cmd, Command::Position(_, _)));
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        assert!(matches!(cmd, Command::Position(_, _)));
    }

    #[test]
    fn parse_position_records_a_hash_per_move() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        match cmd {
            Command::Position(board, history) => {
                assert_eq!(history.len(), 2, "one hash per played move");
                assert_eq!(
                    history.hashes().last().copied(),
                    Some(board.hash()),
                    "last recorded hash should match the resulting position"
                );
            }
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_position_no_moves_has_empty_history() {
        let cmd = parse_command("position startpos").unwrap();
        match cmd {
            Command::Position(_, history) => assert!(history.is_empty()),
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_position_fen() {
        let cmd = parse_command(
            "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        )
        .unwrap();
        assert!(matches!(cmd, Command::Position(_, _)));
    }

    #[test]
    fn parse_go_depth() {
        let cmd = parse_command("go depth 6").unwrap();
        match cmd {
            Command::Go(params) => assert_eq!(params.depth, Some(6)),
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_bare_has_no_limits() {
        let cmd = parse_command("go").unwrap();
        match cmd {
            Command::Go(params) => {
                assert_eq!(params.depth, None);
                assert!(!params.infinite);
                assert_eq!(params.movetime, None);
            }
            _ => panic!("expected Go with no limits set"),
        }
    }

    #[test]
    fn parse_go_infinite() {
        let cmd = parse_command("go infinite").unwrap();
        match cmd {
            Command::Go(params) => assert!(params.infinite),
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_clock_params() {
        let cmd = parse_command("go wtime 300000 btime 290000 winc 2000 binc 2000 movestogo 30")
            .unwrap();
        match cmd {
            Command::Go(params) => {
                assert_eq!(params.wtime, Some(Duration::from_millis(300_000)));
                assert_eq!(params.btime, Some(Duration::from_millis(290_000)));
                assert_eq!(params.winc, Some(Duration::from_millis(2_000)));
                assert_eq!(params.binc, Some(Duration::from_millis(2_000)));
                assert_eq!(params.movestogo, Some(30));
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_movetime() {
        let cmd = parse_command("go movetime 5000").unwrap();
        match cmd {
            Command::Go(params) => assert_eq!(params.movetime, Some(Duration::from_millis(5000))),
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_ponder_token_ignored() {
        // "ponder" is a recognised UCI go-subcommand but this engine does not
        // implement pondering; it is consumed without affecting other params.
        let cmd = parse_command("go ponder wtime 1000 btime 1000").unwrap();
        match cmd {
            Command::Go(params) => assert_eq!(params.wtime, Some(Duration::from_millis(1000))),
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_missing_value_errs() {
        let result = parse_command("go depth");
        assert!(result.is_err());
    }

    #[test]
    fn parse_go_invalid_value_errs() {
        let result = parse_command("go depth abc");
        assert!(result.is_err());
    }

    #[test]
    fn parse_unknown_command() {
        let cmd = parse_command("foobar").unwrap();
        assert!(matches!(cmd, Command::Unknown(_)));
    }

    #[test]
    fn parse_ponderhit_is_unknown() {
        // ponderhit is a real UCI command, but this engine never enters the
        // pondering state, so it is parsed (not rejected) and then ignored.
        let cmd = parse_command("ponderhit").unwrap();
        assert!(matches!(cmd, Command::Unknown(_)));
    }

    #[test]
    fn parse_empty_line() {
        let cmd = parse_command("").unwrap();
        assert!(matches!(cmd, Command::Unknown(_)));
    }

    #[test]
    fn parse_position_missing_keyword() {
        let result = parse_command("position");
        assert!(result.is_err());
    }

    #[test]
    fn parse_position_invalid_fen() {
        let result = parse_command("position fen invalid");
        assert!(result.is_err());
    }

    #[test]
    fn parse_stop() {
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
    }

    #[test]
    fn parse_setoption_hash() {
        let cmd = parse_command("setoption name Hash value 64").unwrap();
        match cmd {
            Command::SetOption { name, value } => {
                assert_eq!(name, "hash");
                assert_eq!(value, Some("64".to_string()));
            }
            _ => panic!("expected SetOption"),
        }
    }

    #[test]
    fn parse_setoption_multiword_name() {
        let cmd = parse_command("setoption name Own Book value true").unwrap();
        match cmd {
            Command::SetOption { name, value } => {
                assert_eq!(name, "own book");
                assert_eq!(value, Some("true".to_string()));
            }
            _ => panic!("expected SetOption"),
        }
    }

    #[test]
    fn parse_setoption_no_value() {
        let cmd = parse_command("setoption name Clear Hash").unwrap();
        match cmd {
            Command::SetOption { name, value } => {
                assert_eq!(name, "clear hash");
                assert_eq!(value, None);
            }
            _ => panic!("expected SetOption"),
        }
    }

    #[test]
    fn parse_setoption_missing_name_is_unknown() {
        let cmd = parse_command("setoption").unwrap();
        assert!(matches!(cmd, Command::Unknown(_)));
    }
}
