use anyhow::{anyhow, bail, Context};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use xiangqi_engine::{
    search_with_budget, Board, Color, Engine, EngineConfig, EngineError, GameKind, GameRegistry,
    GameState, Move,
};

/// Parameters of a `go` command.
#[derive(Debug, Default, PartialEq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub force_break: bool,
}

pub fn parse_go_command(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 0;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                params.depth = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "movetime" => {
                params.movetime_ms = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "breakloop" => {
                params.force_break = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    params
}

/// `position startpos [moves ...]` or `position fen <board> [w|b] [moves ...]`.
pub fn parse_position_command(parts: &[&str], capacity: usize) -> anyhow::Result<GameState> {
    let moves_idx = parts.iter().position(|&x| x == "moves").unwrap_or(parts.len());
    let mut game = match parts.get(1) {
        Some(&"startpos") => GameState::new(),
        Some(&"fen") => {
            let layout = parts.get(2).ok_or_else(|| anyhow!("missing board after fen"))?;
            let board = Board::decode(layout)?;
            let side = parts[3..moves_idx]
                .first()
                .and_then(|s| s.chars().next())
                .and_then(Color::from_fen_side)
                .unwrap_or(Color::Red);
            GameState::from_board(board, side)
        }
        _ => bail!("expected startpos or fen"),
    }
    .with_history_capacity(capacity);

    for move_str in parts.iter().skip(moves_idx + 1) {
        let mv = Move::from_uci_string(move_str)
            .ok_or_else(|| anyhow!("bad move notation '{}'", move_str))?;
        game.apply_move(mv.from_sq(), mv.to_sq())
            .with_context(|| format!("while replaying {}", move_str))?;
    }
    Ok(game)
}

struct Driver {
    game: GameState,
    config: EngineConfig,
}

impl Driver {
    fn new(config: EngineConfig) -> Self {
        let game = GameState::new().with_history_capacity(config.position_history_capacity);
        Self { game, config }
    }

    /// Handles one command line. Returns `false` on `quit`.
    async fn handle(&mut self, line: &str) -> anyhow::Result<bool> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = parts.first() else {
            return Ok(true);
        };
        match *command {
            "uci" => {
                println!("id name Xiangqi");
                println!("id author xiangqi-engine");
                println!("option name Depth type spin default 3 min 1 max 8");
                println!("option name MoveTime type spin default 0 min 0 max 600000");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => {
                *self = Driver::new(self.config.clone());
            }
            "setoption" => self.set_option(&parts)?,
            "position" => {
                self.game = parse_position_command(&parts, self.config.position_history_capacity)?;
            }
            "go" => {
                let params = parse_go_command(&parts);
                let mut config = self.config.clone();
                if let Some(depth) = params.depth {
                    config.search_depth = depth;
                }
                let budget = params
                    .movetime_ms
                    .or(config.time_budget_ms)
                    .map(Duration::from_millis);
                let color = self.game.current_player();
                match search_with_budget(self.game.clone(), color, params.force_break, config, budget).await {
                    Ok(Some(mv)) => println!("bestmove {}", mv.to_uci_string()),
                    Ok(None) => println!("bestmove (none)"),
                    Err(EngineError::SearchTimedOut { budget_ms }) => {
                        warn!("search gave up after {} ms", budget_ms);
                        println!("bestmove (none)");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            "undo" => {
                if !self.game.undo() {
                    println!("info string nothing to undo");
                }
            }
            "draw" => {
                // The side to move answers a draw offer.
                let color = self.game.current_player();
                let accept = Engine::new(self.config.clone()).should_accept_draw(&self.game, color);
                println!("draw {}", if accept { "accept" } else { "decline" });
            }
            "selfplay" => {
                let plies = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);
                self.self_play(plies).await?;
            }
            "d" => {
                print!("{}", self.game.board());
                println!("Fen: {} {}", self.game.encode(), self.game.current_player().to_fen_side());
                println!(
                    "Checkers: red {} black {}",
                    self.game.is_in_check(Color::Red),
                    self.game.is_in_check(Color::Black)
                );
            }
            "quit" => return Ok(false),
            other => debug!("ignoring unknown command {}", other),
        }
        Ok(true)
    }

    fn set_option(&mut self, parts: &[&str]) -> anyhow::Result<()> {
        let name = parts.iter().position(|&x| x == "name").and_then(|i| parts.get(i + 1));
        let value = parts.iter().position(|&x| x == "value").and_then(|i| parts.get(i + 1));
        match (name, value) {
            (Some(&"Depth"), Some(v)) => self.config.search_depth = v.parse()?,
            (Some(&"MoveTime"), Some(v)) => {
                let ms: u64 = v.parse()?;
                self.config.time_budget_ms = (ms > 0).then_some(ms);
            }
            _ => bail!("unsupported option: {}", parts.join(" ")),
        }
        Ok(())
    }

    /// Lets the engine play both sides from the current position through a session registry.
    async fn self_play(&mut self, plies: usize) -> anyhow::Result<()> {
        let registry = GameRegistry::new(self.config.clone());
        let id = registry.create(self.game.clone(), GameKind::AiVsAi).await;
        for _ in 0..plies {
            match registry.play_ai_turn(id).await? {
                Some(mv) => println!("info move {}", mv.to_uci_string()),
                None => break,
            }
        }
        let handle = registry.get(id).await?;
        let session = handle.lock().await;
        if let Some(outcome) = session.state.winner() {
            println!("info result {:?}", outcome);
        }
        self.game = session.state.clone();
        Ok(())
    }
}

/// Command-line flags: `--depth N`, `--movetime MS`, `--config FILE`.
fn config_from_args(args: &[String]) -> anyhow::Result<EngineConfig> {
    let mut config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).ok_or_else(|| anyhow!("--config needs a path"))?;
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            EngineConfig::from_json(&text)?
        }
        None => EngineConfig::default(),
    };
    if let Some(i) = args.iter().position(|a| a == "--depth") {
        let value = args.get(i + 1).ok_or_else(|| anyhow!("--depth needs a value"))?;
        config.search_depth = value.parse()?;
    }
    if let Some(i) = args.iter().position(|a| a == "--movetime") {
        let value = args.get(i + 1).ok_or_else(|| anyhow!("--movetime needs a value"))?;
        config.time_budget_ms = Some(value.parse()?);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = config_from_args(&args)?;
    info!("Starting with {:?}", config);

    let mut driver = Driver::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        debug!("Received: {}", line);
        match driver.handle(&line).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("info string error: {:#}", e),
        }
    }
    Ok(())
}
