use std::{fmt::Display, str::FromStr};

use lancer_lib::{board::eval_params::EvalParams, search::MAX_SEARCH_DEPTH};

#[macro_use]
mod macros;

uci_options![
    PawnValue(Spin<i32> { default: 100, min: 0, max: 200 }),
    KnightValue(Spin<i32> { default: 320, min: 0, max: 640 }),
    BishopValue(Spin<i32> { default: 330, min: 0, max: 660 }),
    RookValue(Spin<i32> { default: 500, min: 0, max: 1000 }),
    QueenValue(Spin<i32> { default: 900, min: 0, max: 1800 }),
    KingValue(Spin<i32> { default: 2000, min: 0, max: 4000 }),
    MateScore(Spin<i32> { default: 100000, min: 50000, max: 200000 }),
    RestrictKingBonus(Spin<i32> { default: 10, min: 0, max: 50 }),
    KingShieldBonus(Spin<i32> { default: 50, min: 0, max: 100 }),
    AiryKingPenalty(Spin<i32> { default: 30, min: 0, max: 100 }),
    SupportedPawnBonus(Spin<i32> { default: 15, min: 0, max: 50 }),
    SupportingPawnBonus(Spin<i32> { default: 10, min: 0, max: 50 }),
    PassedPawnBonus(Spin<i32> { default: 100, min: 0, max: 200 }),
    SupportingPieceBonus(Spin<i32> { default: 8, min: 0, max: 50 }),
    DoubledPawnPenalty(Spin<i32> { default: 40, min: 0, max: 100 }),
    IsolatedPawnPenalty(Spin<i32> { default: 20, min: 0, max: 100 }),
    CheckedPenalty(Spin<i32> { default: 50, min: 0, max: 200 }),
    CheckingBonus(Spin<i32> { default: 30, min: 0, max: 200 }),
    BishopPairBonus(Spin<i32> { default: 30, min: 0, max: 100 }),
    RookOpenFileBonus(Spin<i32> { default: 25, min: 0, max: 100 }),
];

/// Folds a validated option value into the parameter set handed to engines.
pub fn apply_option(params: &mut EvalParams, option: UciOption) {
    use UciOption::*;
    match option {
        PawnValue(v) => params.piece_values[0] = v,
        KnightValue(v) => params.piece_values[1] = v,
        BishopValue(v) => params.piece_values[2] = v,
        RookValue(v) => params.piece_values[3] = v,
        QueenValue(v) => params.piece_values[4] = v,
        KingValue(v) => params.piece_values[5] = v,
        MateScore(v) => params.mate_score = v,
        RestrictKingBonus(v) => params.restrict_king_bonus = v,
        KingShieldBonus(v) => params.king_shield_bonus = v,
        AiryKingPenalty(v) => params.airy_king_penalty = v,
        SupportedPawnBonus(v) => params.supported_pawn_bonus = v,
        SupportingPawnBonus(v) => params.supporting_pawn_bonus = v,
        PassedPawnBonus(v) => params.passed_pawn_bonus = v,
        SupportingPieceBonus(v) => params.supporting_piece_bonus = v,
        DoubledPawnPenalty(v) => params.doubled_pawn_penalty = v,
        IsolatedPawnPenalty(v) => params.isolated_pawn_penalty = v,
        CheckedPenalty(v) => params.checked_penalty = v,
        CheckingBonus(v) => params.checking_bonus = v,
        BishopPairBonus(v) => params.bishop_pair_bonus = v,
        RookOpenFileBonus(v) => params.rook_open_file_bonus = v,
    }
}

pub enum UciCommand {
    Uci,
    IsReady,
    SetOption(UciOption),
    UciNewGame,
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go {
        wtime: Option<i64>,
        btime: Option<i64>,
        winc: Option<i64>,
        binc: Option<i64>,
        depth: Option<usize>,
        nodes: Option<usize>,
        movetime: Option<u64>,
        infinite: bool,
        perft: Option<usize>,
    },
    Stop,
    Quit,
}

pub trait ValidateOption {
    type Output: FromStr;
    fn validate<S: AsRef<str>>(&self, data: S) -> Result<Self::Output, UciParseError>;
    fn details(&self) -> String;
}

pub struct Spin<T> {
    default: T,
    min: T,
    max: T,
}

impl<T: FromStr + PartialOrd + Display> ValidateOption for Spin<T> {
    type Output = T;
    fn validate<S: AsRef<str>>(&self, data: S) -> Result<Self::Output, UciParseError> {
        let value = data.as_ref().parse::<T>().map_err(|_| {
            UciParseError::Other(format!("Invalid value for spin option: {}", data.as_ref()))
        })?;

        if value >= self.min && value <= self.max {
            Ok(value)
        } else {
            Err(UciParseError::Other(format!(
                "Value for spin option out of range [{}, {}]",
                self.min, self.max
            )))
        }
    }

    fn details(&self) -> String {
        format!(
            "type spin default {} min {} max {}",
            self.default, self.min, self.max
        )
    }
}

#[derive(Debug)]
pub enum UciParseError {
    Empty,
    /// Unknown commands and option names are silently ignored per convention.
    UnknownCommand,
    UnknownOption,
    Other(String),
}

impl Display for UciParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                UciParseError::Empty => "",
                UciParseError::UnknownCommand => "unknown command",
                UciParseError::UnknownOption => "unknown option",
                UciParseError::Other(reason) => reason,
            }
        )
    }
}
impl std::error::Error for UciParseError {}

pub fn parse_uci_command<T: AsRef<str>>(cmd: T) -> Result<UciCommand, UciParseError> {
    let words = cmd.as_ref().split_whitespace().collect::<Vec<&str>>();

    use UciCommand::*;

    match words.first() {
        Some(word) => match word.to_lowercase().as_str() {
            "uci" => Ok(Uci),
            "isready" => Ok(IsReady),
            "setoption" => {
                let name = match words.get(1).copied() {
                    Some("name") => words.get(2).copied().ok_or_else(|| {
                        UciParseError::Other(
                            "Missing token in UCI setoption command: no name specified".to_string(),
                        )
                    })?,
                    _ => {
                        return Err(UciParseError::Other(
                            "Expected 'name' in UCI setoption command".to_string(),
                        ))
                    }
                };
                let value = match words.get(3).copied() {
                    Some("value") => words.get(4).copied().ok_or_else(|| {
                        UciParseError::Other(
                            "Missing token in UCI setoption command: no value specified"
                                .to_string(),
                        )
                    })?,
                    _ => {
                        return Err(UciParseError::Other(
                            "Expected 'value' in UCI setoption command".to_string(),
                        ))
                    }
                };
                UciOption::parse(name, value).map(UciCommand::SetOption)
            }
            "ucinewgame" => Ok(UciNewGame),
            "position" => {
                let (fen, moves_index) = match words.get(1) {
                    Some(&"startpos") => (None, 2),
                    Some(&"fen") => {
                        // collect everything up to `moves` and let the board
                        // parser judge it, so malformed FENs can revert the
                        // position instead of aborting the command
                        let rest = &words[2..];
                        let end = rest.iter().position(|&w| w == "moves").unwrap_or(rest.len());
                        (Some(rest[..end].join(" ")), 2 + end)
                    }
                    _ => {
                        return Err(UciParseError::Other(
                            "Expected 'startpos' or 'fen' in UCI position command".to_string(),
                        ))
                    }
                };

                let moves = match words.get(moves_index) {
                    Some(&"moves") => words[(moves_index + 1)..]
                        .iter()
                        .map(|m| m.to_string())
                        .collect(),
                    Some(other) => {
                        return Err(UciParseError::Other(format!(
                            "Expected 'moves' in UCI position command, found {other}"
                        )))
                    }
                    None => Vec::new(),
                };

                Ok(Position { fen, moves })
            }
            "go" => {
                parse_uci_go_value!(words, wtime, i64);
                parse_uci_go_value!(words, btime, i64);
                parse_uci_go_value!(words, winc, i64);
                parse_uci_go_value!(words, binc, i64);
                parse_uci_go_value!(words, nodes, usize);
                parse_uci_go_value!(words, movetime, u64);
                parse_uci_go_value!(words, perft, usize);

                // `depth infinite` is a synonym for the maximum depth
                let depth = match words.iter().position(|&w| w == "depth") {
                    Some(p) => match words.get(p + 1) {
                        Some(&"infinite") => Some(MAX_SEARCH_DEPTH),
                        Some(n) => Some(n.parse::<usize>().map_err(|_| {
                            UciParseError::Other(format!(
                                "Invalid value for depth in UCI go command: {n}"
                            ))
                        })?),
                        None => {
                            return Err(UciParseError::Other(
                                "Missing token in UCI go command: no value specified for depth"
                                    .to_string(),
                            ))
                        }
                    },
                    None => None,
                };

                // a bare `infinite` token, as opposed to `depth infinite`
                let infinite = words
                    .iter()
                    .enumerate()
                    .any(|(i, &w)| w == "infinite" && words[i - 1] != "depth");

                Ok(Go {
                    wtime,
                    btime,
                    winc,
                    binc,
                    depth,
                    nodes,
                    movetime,
                    infinite,
                    perft,
                })
            }
            "stop" => Ok(Stop),
            "quit" => Ok(Quit),
            _ => Err(UciParseError::UnknownCommand),
        },
        None => Err(UciParseError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_go_limits() {
        let cmd = parse_uci_command("go wtime 60000 btime 45000 winc 500 binc 500").unwrap();
        match cmd {
            UciCommand::Go {
                wtime,
                btime,
                winc,
                binc,
                infinite,
                ..
            } => {
                assert_eq!(wtime, Some(60000));
                assert_eq!(btime, Some(45000));
                assert_eq!(winc, Some(500));
                assert_eq!(binc, Some(500));
                assert!(!infinite);
            }
            _ => panic!("expected go"),
        }
    }

    #[test]
    fn test_depth_infinite_is_max_depth() {
        match parse_uci_command("go depth infinite").unwrap() {
            UciCommand::Go {
                depth, infinite, ..
            } => {
                assert_eq!(depth, Some(MAX_SEARCH_DEPTH));
                assert!(!infinite);
            }
            _ => panic!("expected go"),
        }

        match parse_uci_command("go infinite").unwrap() {
            UciCommand::Go {
                depth, infinite, ..
            } => {
                assert_eq!(depth, None);
                assert!(infinite);
            }
            _ => panic!("expected go"),
        }
    }

    #[test]
    fn test_position_with_moves() {
        match parse_uci_command("position startpos moves e2e4 e7e5").unwrap() {
            UciCommand::Position { fen, moves } => {
                assert!(fen.is_none());
                assert_eq!(moves, vec!["e2e4", "e7e5"]);
            }
            _ => panic!("expected position"),
        }
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        assert!(matches!(
            parse_uci_command("UCINEWGAME"),
            Ok(UciCommand::UciNewGame)
        ));
        assert!(matches!(parse_uci_command("IsReady"), Ok(UciCommand::IsReady)));
    }

    #[test]
    fn test_unknown_inputs() {
        assert!(matches!(
            parse_uci_command("xyzzy"),
            Err(UciParseError::UnknownCommand)
        ));
        assert!(matches!(parse_uci_command(""), Err(UciParseError::Empty)));
        assert!(matches!(
            parse_uci_command("setoption name NoSuchOption value 1"),
            Err(UciParseError::UnknownOption)
        ));
    }

    #[test]
    fn test_option_validation() {
        let opt = UciOption::parse("PawnValue", "150").unwrap();
        assert_eq!(opt, UciOption::PawnValue(150));

        let mut params = EvalParams::default();
        apply_option(&mut params, opt);
        assert_eq!(params.piece_values[0], 150);

        // out of range keeps the previous value by failing validation
        assert!(UciOption::parse("PawnValue", "9999").is_err());
        assert!(UciOption::parse("PawnValue", "pawn").is_err());
    }
}
