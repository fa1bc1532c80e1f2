//! The search engine.
//!
//! Plain minimax with alpha-beta pruning over cloned game states, a root
//! driver that shuffles candidates, and a fallback selector that steers
//! away from repeated positions.

use crate::config::EngineConfig;
use crate::constants::{Color, SCORE_INFINITY};
use crate::error::{EngineError, EngineResult};
use crate::evaluate::evaluate;
use crate::game::GameState;
use crate::r#move::Move;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

pub struct Engine {
    pub config: EngineConfig,
    pub nodes_searched: u64,
    rng: StdRng,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            nodes_searched: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// An engine whose shuffles and random fallbacks are reproducible.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self {
            config,
            nodes_searched: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks a move for `color`, or `None` when it has no legal move.
    ///
    /// `force_break` asks for loop-breaking selection even if the current
    /// position has not been repeated yet.
    pub fn best_move(&mut self, state: &GameState, color: Color, force_break: bool) -> Option<Move> {
        self.nodes_searched = 0;
        let start_time = Instant::now();

        let mut moves = state.legal_moves(color);
        match moves.len() {
            0 => {
                debug!("{} has no legal move", color);
                return None;
            }
            1 => {
                debug!("{} forced move {}", color, moves[0].to_uci_string());
                return Some(moves[0]);
            }
            _ => {}
        }

        let current = state.encode();
        let chosen = if force_break || state.is_repetition(&current) {
            if state.is_perpetual(&current) {
                info!("Position seen {} times, likely perpetual", state.is_repeated(&current));
            }
            self.anti_repetition_move(state, color, moves, force_break)
        } else {
            moves.shuffle(&mut self.rng);
            self.search_candidates(state, color, &moves)
                .or_else(|| moves.choose(&mut self.rng).copied())
        };

        debug!(
            "{} search depth {} nodes {} time {}ms move {:?}",
            color,
            self.config.search_depth,
            self.nodes_searched,
            start_time.elapsed().as_millis(),
            chosen.map(|mv| mv.to_uci_string())
        );
        chosen
    }

    /// Scores each candidate with the opponent to reply, keeping the first
    /// strictly best one. `None` if nothing beats negative infinity.
    fn search_candidates(&mut self, state: &GameState, color: Color, moves: &[Move]) -> Option<Move> {
        let depth = self.config.search_depth.saturating_sub(1);
        let mut best_move = None;
        let mut best_eval = -SCORE_INFINITY;
        let mut alpha = -SCORE_INFINITY;
        let beta = SCORE_INFINITY;

        for &mv in moves {
            let Some(child) = play(state, mv) else {
                continue;
            };
            let score = self.minimax(&child, color, depth, alpha, beta, false);
            if score > best_eval {
                best_eval = score;
                best_move = Some(mv);
                alpha = alpha.max(score);
            }
        }
        best_move
    }

    fn anti_repetition_move(
        &mut self,
        state: &GameState,
        color: Color,
        mut moves: Vec<Move>,
        force_break: bool,
    ) -> Option<Move> {
        let fresh: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|&mv| {
                play(state, mv).is_some_and(|child| !state.is_repetition(&child.encode()))
            })
            .collect();

        if !fresh.is_empty() {
            debug!("{} of {} moves avoid a repetition", fresh.len(), moves.len());
            return self
                .search_candidates(state, color, &fresh)
                .or_else(|| fresh.choose(&mut self.rng).copied());
        }

        if force_break && moves.len() > 1 {
            // Every move repeats: take the one that shakes the evaluation most.
            let before = evaluate(state, color);
            let mut best_change_move = None;
            let mut max_change = -1;
            for &mv in &moves {
                let Some(child) = play(state, mv) else {
                    continue;
                };
                let change = (evaluate(&child, color) - before).abs();
                if change > max_change {
                    max_change = change;
                    best_change_move = Some(mv);
                }
            }
            if best_change_move.is_some() {
                return best_change_move;
            }
        }

        moves.shuffle(&mut self.rng);
        moves.first().copied()
    }

    /// Minimax with alpha-beta pruning, scored from `side`'s point of view.
    ///
    /// Maximizing plies enumerate `side`'s moves, minimizing plies the
    /// opponent's. A ply with no legal move scores as a loss for the side
    /// that is stuck.
    pub fn minimax(
        &mut self,
        state: &GameState,
        side: Color,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> i32 {
        self.nodes_searched += 1;
        if depth == 0 || state.is_game_over() {
            return evaluate(state, side);
        }

        if maximizing {
            let mut max_eval = -SCORE_INFINITY;
            for mv in state.legal_moves(side) {
                let Some(child) = play(state, mv) else {
                    continue;
                };
                let score = self.minimax(&child, side, depth - 1, alpha, beta, false);
                max_eval = max_eval.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            max_eval
        } else {
            let mut min_eval = SCORE_INFINITY;
            for mv in state.legal_moves(side.opponent()) {
                let Some(child) = play(state, mv) else {
                    continue;
                };
                let score = self.minimax(&child, side, depth - 1, alpha, beta, true);
                min_eval = min_eval.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            min_eval
        }
    }

    /// Decides whether `color` takes a draw offer in the current position.
    pub fn should_accept_draw(&mut self, state: &GameState, color: Color) -> bool {
        let score = evaluate(state, color);
        let margin = self.config.draw_accept_margin;
        if score < -margin {
            true
        } else if score > margin {
            false
        } else {
            let p = self.config.draw_accept_probability.clamp(0.0, 1.0);
            self.rng.gen_bool(p)
        }
    }
}

/// Clone-and-apply; the caller's state is never touched.
fn play(state: &GameState, mv: Move) -> Option<GameState> {
    let mut child = state.clone();
    child.apply_move(mv.from_sq(), mv.to_sq()).ok()?;
    Some(child)
}

/// Runs a search on the blocking thread pool and gives up after `budget`.
///
/// The search itself can't be interrupted; on timeout its result is
/// discarded when it eventually finishes.
pub async fn search_with_budget(
    state: GameState,
    color: Color,
    force_break: bool,
    config: EngineConfig,
    budget: Option<Duration>,
) -> EngineResult<Option<Move>> {
    let handle = tokio::task::spawn_blocking(move || {
        Engine::new(config).best_move(&state, color, force_break)
    });

    let joined = match budget {
        Some(limit) => tokio::time::timeout(limit, handle)
            .await
            .map_err(|_| EngineError::SearchTimedOut {
                budget_ms: limit.as_millis(),
            })?,
        None => handle.await,
    };
    joined.map_err(|_| EngineError::SearchAborted)
}
