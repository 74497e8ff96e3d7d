use lancer_lib::{
    board::{eval_params::EvalParams, Board},
    engine::{Engine, SearchEngine},
    moves::Move,
    search::{Search, SearchLimits, ABORT_SEARCH, NODE_COUNT},
    types::Color,
};

use std::{
    error::Error,
    io::{prelude::*, stdin},
    sync::atomic::Ordering,
    thread::{self, JoinHandle},
    time::Instant,
};

mod uci;

fn main() -> Result<(), Box<dyn Error>> {
    if std::env::args().nth(1).as_deref() == Some("bench") {
        bench();
        return Ok(());
    }

    run_uci(SearchEngine::new())
}

/// The command loop: reads UCI commands from stdin and keeps at most one
/// search worker alive. Commands other than `stop`, `quit` and `isready`
/// wait for a running search to finish, so search state has exactly one
/// owner at any time.
fn run_uci<E: Engine + Send + 'static>(engine: E) -> Result<(), Box<dyn Error>> {
    let mut board = Board::new();
    let mut params = EvalParams::default();
    let mut engine = Some(engine);
    let mut worker: Option<JoinHandle<E>> = None;

    for line in stdin().lock().lines() {
        let cmd = match uci::parse_uci_command(line?) {
            Ok(cmd) => cmd,
            // unknown commands and option names are silently ignored
            Err(uci::UciParseError::Empty)
            | Err(uci::UciParseError::UnknownCommand)
            | Err(uci::UciParseError::UnknownOption) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match cmd {
            uci::UciCommand::Uci => {
                collect_worker(&mut worker, &mut engine);
                let engine = engine.as_ref().expect("engine present after join");
                println!("id name {}", engine.name());
                println!("id author {}", engine.author());
                uci::print_uci_options();
                println!("uciok");
            }
            uci::UciCommand::IsReady => println!("readyok"),
            uci::UciCommand::SetOption(option) => {
                collect_worker(&mut worker, &mut engine);
                uci::apply_option(&mut params, option);
                engine
                    .as_mut()
                    .expect("engine present after join")
                    .set_params(params);
            }
            uci::UciCommand::UciNewGame => {
                collect_worker(&mut worker, &mut engine);
                board.reset();
                let engine = engine.as_mut().expect("engine present after join");
                engine.new_game();
                engine.set_params(params);
            }
            uci::UciCommand::Position { fen, moves } => {
                collect_worker(&mut worker, &mut engine);
                match fen {
                    Some(fen) => {
                        if let Err(e) = board.set_from_fen(&fen) {
                            eprintln!("invalid FEN ({e}), reverting to the starting position");
                            board.reset();
                        }
                    }
                    None => board.reset(),
                }
                for coords in moves {
                    match Move::from_coords(&board, &coords) {
                        Some(mv) if board.legal_moves().contains(mv) => board.apply_game_move(mv),
                        _ => eprintln!("skipping unplayable move: {coords}"),
                    }
                }
            }
            uci::UciCommand::Go {
                wtime,
                btime,
                winc,
                binc,
                depth,
                nodes,
                movetime,
                infinite,
                perft,
            } => {
                collect_worker(&mut worker, &mut engine);

                if let Some(depth) = perft {
                    board.divide(depth);
                    continue;
                }

                let movetime = if infinite {
                    None
                } else {
                    movetime.or_else(|| {
                        let (time, _inc) = match board.current_player() {
                            Color::White => (wtime, winc),
                            Color::Black => (btime, binc),
                        };
                        time.map(allocate_time)
                    })
                };
                let limits = SearchLimits {
                    depth,
                    nodes,
                    movetime,
                };

                ABORT_SEARCH.store(false, Ordering::Relaxed);
                NODE_COUNT.store(0, Ordering::Relaxed);

                let mut active = engine.take().expect("engine present after join");
                let position = board.clone();
                worker = Some(thread::spawn(move || {
                    let best_move = active.go(position, limits);
                    if best_move.is_null() {
                        println!("bestmove 0000");
                    } else {
                        println!("bestmove {}", best_move.coords());
                    }
                    active
                }));
            }
            uci::UciCommand::Stop => {
                ABORT_SEARCH.store(true, Ordering::Relaxed);
                collect_worker(&mut worker, &mut engine);
            }
            uci::UciCommand::Quit => {
                ABORT_SEARCH.store(true, Ordering::Relaxed);
                collect_worker(&mut worker, &mut engine);
                break;
            }
        }
    }
    Ok(())
}

/// Joins the worker, if any, and takes its engine back. A panicking search
/// thread is fatal: the engine state is gone.
fn collect_worker<E: Engine + Send + 'static>(
    worker: &mut Option<JoinHandle<E>>,
    engine: &mut Option<E>,
) {
    if let Some(handle) = worker.take() {
        match handle.join() {
            Ok(returned) => *engine = Some(returned),
            Err(_) => {
                eprintln!("search worker panicked");
                std::process::exit(1);
            }
        }
    }
}

/// Per-move thinking is capped at a tenth of the remaining clock.
fn allocate_time(remaining_ms: i64) -> u64 {
    (remaining_ms.max(0) as u64 / 10).max(1)
}

fn bench() {
    ABORT_SEARCH.store(false, Ordering::Relaxed);
    NODE_COUNT.store(0, Ordering::Relaxed);

    let mut search = Search::new(Board::new()).limits(SearchLimits {
        depth: Some(8),
        ..Default::default()
    });
    let start = Instant::now();
    search.search();
    let time = start.elapsed();

    let nodes = NODE_COUNT.load(Ordering::Relaxed);
    let nps = (nodes as f64 / time.as_secs_f64()) as usize;
    println!("{nodes} nodes {nps} nps");
}
