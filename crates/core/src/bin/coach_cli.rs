use std::env;
use std::fs;
use std::process;

use chess_coach_core::engine::PositionAnalyzer;
use chess_coach_core::parser::parse_pgn;
use chess_coach_core::quality::Classification;
use chess_coach_core::{analyze_line, init_tracing, CoachConfig, PositionEvaluator, Side};

#[tokio::main]
async fn main() {
    init_tracing();

    println!("Chess Coach");
    println!("==================");
    println!();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let config = match CoachConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("[ERROR] {}", e);
            process::exit(1);
        }
    };
    let mut evaluator = PositionEvaluator::from_config(&config);

    let code = match args[1].as_str() {
        "analyze" => {
            if args.len() < 3 {
                println!("Error: Please provide a PGN file");
                println!("Usage: {} analyze <pgn_file> [white|black]", args[0]);
                1
            } else {
                analyze_file(&mut evaluator, &args[2], args.get(3).map(String::as_str)).await
            }
        }
        "eval" => {
            if args.len() < 3 {
                println!("Error: Please provide a FEN string");
                println!("Usage: {} eval \"<fen>\"", args[0]);
                1
            } else {
                eval_position(&mut evaluator, &args[2]).await
            }
        }
        "test-engine" => test_engine(&mut evaluator).await,
        _ => {
            print_usage(&args[0]);
            1
        }
    };

    evaluator.stop().await;
    process::exit(code);
}

fn print_usage(program: &str) {
    println!("Usage: {} <command> [arguments]", program);
    println!();
    println!("Commands:");
    println!("  analyze <pgn_file> [white|black]   Review a game from one side (default white)");
    println!("  eval \"<fen>\"                       Evaluate a position (FEN string)");
    println!("  test-engine                        Test the analysis engine");
    println!();
    println!("Examples:");
    println!("  {} analyze game.pgn black", program);
    println!(
        "  {} eval \"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1\"",
        program
    );
}

async fn test_engine(evaluator: &mut PositionEvaluator) -> i32 {
    println!("Testing analysis engine ({})...", evaluator.session().path());
    println!();

    let status = evaluator.engine_status().await;
    if !status.available {
        println!(
            "[ERROR] {}",
            status.error.unwrap_or_else(|| "engine unavailable".to_string())
        );
        println!();
        println!("Make sure Stockfish is installed:");
        println!("  sudo apt install stockfish   (or set STOCKFISH_PATH)");
        return 1;
    }

    println!(
        "[OK] {} is working",
        status.engine_name.as_deref().unwrap_or("Engine")
    );
    println!("   Best move: {}", status.best_move.unwrap_or_default());
    println!("   Evaluation: {}", status.evaluation.unwrap_or_default());

    println!();
    println!("Analyzing tactical position...");
    let tactical_fen = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
    let limits = evaluator.position_limits();
    match evaluator.analyze_position(tactical_fen, limits).await {
        Ok(result) => {
            println!("   Position: Scholar's Mate threat");
            println!("   Best move: {} (should be h5f7)", result.best_move);
            if let Some(eval) = result.evaluation {
                println!("   Evaluation: {}", eval);
            }
        }
        Err(e) => {
            println!("[ERROR] Analysis failed: {}", e);
            return 1;
        }
    }

    println!();
    println!("[OK] Engine test complete!");
    0
}

async fn eval_position(evaluator: &mut PositionEvaluator, fen: &str) -> i32 {
    println!("Evaluating position...");
    println!("   FEN: {}", fen);
    println!();

    let limits = evaluator.position_limits();
    match evaluator.analyze_position(fen, limits).await {
        Ok(result) => {
            println!("----------------------------------------");
            if let Some(eval) = result.evaluation {
                println!("   Evaluation: {}", eval);
            }
            println!("   Best move: {}", result.best_move);
            println!("   Depth: {}", result.depth);
            println!(
                "   Best line: {}",
                result.pv.iter().take(8).cloned().collect::<Vec<_>>().join(" ")
            );
            println!("----------------------------------------");
            0
        }
        Err(e) => {
            println!("[ERROR] {}", e);
            1
        }
    }
}

async fn analyze_file(evaluator: &mut PositionEvaluator, path: &str, side: Option<&str>) -> i32 {
    let user_side: Side = match side.unwrap_or("white").parse() {
        Ok(side) => side,
        Err(e) => {
            println!("[ERROR] {}", e);
            return 1;
        }
    };

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            println!("[ERROR] Cannot read {}: {}", path, e);
            return 1;
        }
    };

    let game = match parse_pgn(&text) {
        Ok(game) => game,
        Err(e) => {
            println!("[ERROR] {}", e);
            return 1;
        }
    };

    println!("{}", game.summary());
    println!("Reviewing {} plies as {}...", game.move_count(), user_side);
    println!();

    let limits = evaluator.game_limits();
    let analysis = match analyze_line(evaluator, &game.line(), user_side, limits).await {
        Ok(analysis) => analysis,
        Err(e) => {
            println!("[ERROR] {}", e);
            return 1;
        }
    };

    for record in &analysis.records {
        let mv = &record.mv;
        let dots = if mv.side == Side::White { "." } else { "..." };
        match (record.analysis(), record.error()) {
            (Some(ply), _) if ply.is_user_move => {
                println!(
                    "{:>3}{} {:<8} {:<11} {}",
                    mv.move_number,
                    dots,
                    mv.san,
                    ply.move_quality.classification,
                    ply.explanation
                );
            }
            (Some(_), _) => println!("{:>3}{} {}", mv.move_number, dots, mv.san),
            (None, Some(error)) => {
                println!("{:>3}{} {:<8} [ERROR] {}", mv.move_number, dots, mv.san, error)
            }
            (None, None) => {}
        }
    }

    println!();
    println!("Summary ({:?}):", analysis.status);
    for (class, count) in analysis.classification_counts() {
        if class != Classification::Opponent {
            println!("   {:<11} {}", class, count);
        }
    }
    0
}
