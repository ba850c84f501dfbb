//! Quick check that the configured engine starts and answers

use chess_tutor_core::{Orchestrator, Position, TutorConfig};

#[tokio::main]
async fn main() {
    let config = match TutorConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let fen = std::env::args()
        .nth(1)
        .unwrap_or_else(|| Position::starting().fen());

    let engine = config
        .engine
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stockfish (from PATH)".to_string());
    println!("Testing engine: {}", engine);
    println!();

    let orchestrator = Orchestrator::new(&config);

    if let Err(e) = orchestrator.warm_up().await {
        println!("[ERROR] Failed to start engine: {}", e);
        println!();
        println!("Make sure Stockfish is installed or set STOCKFISH_PATH:");
        println!("  sudo apt install stockfish");
        std::process::exit(1);
    }
    println!("[OK] Engine started");
    println!("   Status: {}", if orchestrator.status().await { "available" } else { "unavailable" });
    println!();

    let depth = orchestrator.default_depth();
    println!("Analyzing (depth {})...", depth);
    println!("   FEN: {}", fen);

    let code = match orchestrator.analyze(&fen, i64::from(depth)).await {
        Ok(result) => {
            println!("   {}", result.summary());
            println!("   Nodes: {}", result.nodes);
            0
        }
        Err(e) => {
            println!("[ERROR] Analysis failed: {}", e);
            1
        }
    };

    orchestrator.shutdown().await;
    std::process::exit(code);
}
