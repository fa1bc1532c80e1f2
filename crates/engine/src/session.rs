//! Per-game sessions and the registry that owns them.
//!
//! Each game lives behind its own async mutex. Searches run on a clone of
//! the state without holding the lock; the result is applied only if the
//! game hasn't moved on in the meantime.

use crate::config::EngineConfig;
use crate::constants::Color;
use crate::engine::{search_with_budget, Engine};
use crate::error::{EngineError, EngineResult};
use crate::game::GameState;
use crate::r#move::{Move, Square};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub type GameId = u64;

/// Who controls each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    PlayerVsPlayer,
    PlayerVsAi { ai: Color },
    AiVsAi,
}

/// Everything the application layer tracks for one game.
#[derive(Debug)]
pub struct GameSession {
    pub state: GameState,
    pub kind: GameKind,
    pub paused: bool,
    /// Consecutive AI turns that landed on an already repeated position.
    pub repeat_streak: u32,
    pub config: EngineConfig,
}

impl GameSession {
    pub fn new(state: GameState, kind: GameKind, config: EngineConfig) -> Self {
        let state = state.with_history_capacity(config.position_history_capacity);
        Self {
            state,
            kind,
            paused: false,
            repeat_streak: 0,
            config,
        }
    }

    pub fn is_ai(&self, color: Color) -> bool {
        match self.kind {
            GameKind::PlayerVsPlayer => false,
            GameKind::PlayerVsAi { ai } => ai == color,
            GameKind::AiVsAi => true,
        }
    }

    /// Whether the side to move should be played by the engine right now.
    pub fn ai_to_move(&self) -> bool {
        !self.paused && !self.state.is_game_over() && self.is_ai(self.state.current_player())
    }

    pub fn force_break(&self) -> bool {
        self.repeat_streak >= self.config.force_break_after
    }

    /// Applies a move and updates the repetition streak for AI turns.
    fn record_ai_move(&mut self, mv: Move) -> EngineResult<()> {
        self.state.apply_move(mv.from_sq(), mv.to_sq())?;
        let encoding = self.state.encode();
        if self.state.is_repetition(&encoding) {
            self.repeat_streak += 1;
            debug!("Repeat streak now {}", self.repeat_streak);
        } else {
            self.repeat_streak = 0;
        }
        Ok(())
    }

    /// A human move. Must be the human side's turn.
    pub fn play_move(&mut self, from: Square, to: Square) -> EngineResult<()> {
        let mover = self.state.current_player();
        let owner = self.state.board().at(from).map(|p| p.color);
        if owner != Some(mover) || self.is_ai(mover) {
            return Err(EngineError::IllegalMove {
                mv: Move::new(from, to),
            });
        }
        self.state.apply_move(from, to)
    }

    /// Offers a draw on behalf of `color`. An AI opponent decides with the
    /// engine; a human opponent is assumed to have agreed.
    pub fn offer_draw(&mut self, color: Color) -> EngineResult<bool> {
        if self.state.is_game_over() {
            return Err(EngineError::GameAlreadyOver);
        }
        let opponent = color.opponent();
        let accepted = if self.is_ai(opponent) {
            Engine::new(self.config.clone()).should_accept_draw(&self.state, opponent)
        } else {
            true
        };
        if accepted {
            self.state.agree_draw()?;
        }
        info!("{} offered a draw, accepted: {}", color, accepted);
        Ok(accepted)
    }
}

/// All live games, one lock per game.
pub struct GameRegistry {
    sessions: RwLock<HashMap<GameId, Arc<Mutex<GameSession>>>>,
    next_id: AtomicU64,
    config: EngineConfig,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GameRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    pub async fn create(&self, state: GameState, kind: GameKind) -> GameId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = GameSession::new(state, kind, self.config.clone());
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!("Created game {} ({:?})", id, kind);
        id
    }

    pub async fn get(&self, id: GameId) -> EngineResult<Arc<Mutex<GameSession>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::UnknownGame { id })
    }

    pub async fn remove(&self, id: GameId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn ids(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self.sessions.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Plays one engine move if the side to move is engine-controlled.
    ///
    /// Returns `Ok(None)` when no move was made: not an AI turn, paused,
    /// no legal move, or the game changed while the engine was thinking.
    pub async fn play_ai_turn(&self, id: GameId) -> EngineResult<Option<Move>> {
        let handle = self.get(id).await?;
        let Some(turn) = AiTurn::prepare(&handle).await else {
            return Ok(None);
        };
        let Some(mv) = turn.search().await? else {
            info!("Game {}: {} has no legal move", id, turn.color);
            return Ok(None);
        };
        turn.finish(id, &handle, mv).await
    }
}

/// An engine turn in flight: what was searched and the history it was searched from.
struct AiTurn {
    state: GameState,
    color: Color,
    force_break: bool,
    config: EngineConfig,
}

impl AiTurn {
    async fn prepare(handle: &Mutex<GameSession>) -> Option<AiTurn> {
        let session = handle.lock().await;
        if !session.ai_to_move() {
            return None;
        }
        Some(AiTurn {
            state: session.state.clone(),
            color: session.state.current_player(),
            force_break: session.force_break(),
            config: session.config.clone(),
        })
    }

    async fn search(&self) -> EngineResult<Option<Move>> {
        let budget = self.config.time_budget_ms.map(Duration::from_millis);
        search_with_budget(
            self.state.clone(),
            self.color,
            self.force_break,
            self.config.clone(),
            budget,
        )
        .await
    }

    /// Applies `mv` unless the game moved on since the search started.
    async fn finish(
        self,
        id: GameId,
        handle: &Mutex<GameSession>,
        mv: Move,
    ) -> EngineResult<Option<Move>> {
        let mut session = handle.lock().await;
        let unchanged = session.state.move_history() == self.state.move_history()
            && session.state.encode() == self.state.encode()
            && session.state.current_player() == self.color;
        if !unchanged || !session.ai_to_move() {
            warn!("Game {}: discarding stale engine move {}", id, mv);
            return Ok(None);
        }
        session.record_ai_move(mv)?;
        if self.force_break {
            session.repeat_streak = 0;
        }
        debug!("Game {}: {} played {}", id, self.color, mv);
        Ok(Some(mv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::game::Outcome;

    fn quick_config() -> EngineConfig {
        EngineConfig::default().with_depth(1)
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = GameRegistry::new(quick_config());
        let a = registry.create(GameState::new(), GameKind::PlayerVsPlayer).await;
        let b = registry.create(GameState::new(), GameKind::AiVsAi).await;
        assert_ne!(a, b);
        assert_eq!(registry.ids().await, vec![a, b]);

        assert!(registry.remove(a).await);
        assert!(!registry.remove(a).await);
        assert!(matches!(
            registry.get(a).await,
            Err(EngineError::UnknownGame { .. })
        ));
    }

    #[tokio::test]
    async fn test_ai_turn_only_on_ai_side() {
        let registry = GameRegistry::new(quick_config());
        let id = registry
            .create(GameState::new(), GameKind::PlayerVsAi { ai: Color::Black })
            .await;

        // Red is human.
        assert_eq!(registry.play_ai_turn(id).await.unwrap(), None);

        let handle = registry.get(id).await.unwrap();
        handle.lock().await.play_move((9, 1), (7, 2)).unwrap();

        let mv = registry.play_ai_turn(id).await.unwrap().expect("black replies");
        let session = handle.lock().await;
        assert_eq!(session.state.move_history().len(), 2);
        assert_eq!(session.state.move_history()[1].mv, mv);
        assert_eq!(session.state.current_player(), Color::Red);
    }

    #[tokio::test]
    async fn test_human_cannot_move_for_ai() {
        let registry = GameRegistry::new(quick_config());
        let id = registry
            .create(GameState::new(), GameKind::PlayerVsAi { ai: Color::Red })
            .await;
        let handle = registry.get(id).await.unwrap();
        let mut session = handle.lock().await;
        assert!(session.play_move((9, 1), (7, 2)).is_err());
        assert!(session.state.move_history().is_empty());
    }

    #[tokio::test]
    async fn test_paused_game_does_not_move() {
        let registry = GameRegistry::new(quick_config());
        let id = registry.create(GameState::new(), GameKind::AiVsAi).await;
        let handle = registry.get(id).await.unwrap();
        handle.lock().await.paused = true;
        assert_eq!(registry.play_ai_turn(id).await.unwrap(), None);

        handle.lock().await.paused = false;
        assert!(registry.play_ai_turn(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ai_vs_ai_finishes_king_hunt() {
        let board = Board::decode("4k4/9/9/9/9/9/9/9/9/3KR4").unwrap();
        let registry = GameRegistry::new(EngineConfig::default().with_depth(2));
        let id = registry
            .create(GameState::from_board(board, Color::Red), GameKind::AiVsAi)
            .await;

        registry.play_ai_turn(id).await.unwrap();
        let handle = registry.get(id).await.unwrap();
        let session = handle.lock().await;
        assert!(session.state.is_game_over());
        assert_eq!(session.state.winner(), Some(Outcome::Winner(Color::Red)));
        drop(session);
        assert_eq!(registry.play_ai_turn(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_streak_triggers_force_break() {
        let registry = GameRegistry::new(quick_config());
        let id = registry.create(GameState::new(), GameKind::AiVsAi).await;
        let handle = registry.get(id).await.unwrap();
        {
            let mut session = handle.lock().await;
            session.repeat_streak = session.config.force_break_after;
            assert!(session.force_break());
        }
        assert!(registry.play_ai_turn(id).await.unwrap().is_some());
        assert_eq!(handle.lock().await.repeat_streak, 0);
    }

    #[tokio::test]
    async fn test_engine_move_discarded_after_undo_and_replay() {
        let registry = GameRegistry::new(EngineConfig::default().with_depth(3));
        let id = registry
            .create(GameState::new(), GameKind::PlayerVsAi { ai: Color::Black })
            .await;
        let handle = registry.get(id).await.unwrap();
        handle.lock().await.play_move((9, 1), (7, 2)).unwrap();

        let turn = AiTurn::prepare(&handle).await.expect("black to move");

        // The human takes the move back and plays another one of the same length.
        {
            let mut session = handle.lock().await;
            assert!(session.state.undo());
            session.play_move((9, 7), (7, 6)).unwrap();
        }
        let before = handle.lock().await.state.snapshot();

        let mv = turn.search().await.unwrap().expect("black has moves");
        assert_eq!(turn.finish(id, &handle, mv).await.unwrap(), None);

        let session = handle.lock().await;
        assert_eq!(session.state.snapshot(), before);
        assert_eq!(session.state.move_history().len(), 1);
        assert_eq!(session.state.current_player(), Color::Black);
    }

    #[tokio::test]
    async fn test_engine_move_applied_when_game_unchanged() {
        let registry = GameRegistry::new(quick_config());
        let id = registry
            .create(GameState::new(), GameKind::PlayerVsAi { ai: Color::Black })
            .await;
        let handle = registry.get(id).await.unwrap();
        handle.lock().await.play_move((9, 1), (7, 2)).unwrap();

        let turn = AiTurn::prepare(&handle).await.expect("black to move");
        let mv = turn.search().await.unwrap().expect("black has moves");
        assert_eq!(turn.finish(id, &handle, mv).await.unwrap(), Some(mv));
        assert_eq!(handle.lock().await.state.move_history().len(), 2);
    }

    #[tokio::test]
    async fn test_draw_offer_between_humans() {
        let registry = GameRegistry::new(quick_config());
        let id = registry.create(GameState::new(), GameKind::PlayerVsPlayer).await;
        let handle = registry.get(id).await.unwrap();
        let mut session = handle.lock().await;
        assert!(session.offer_draw(Color::Red).unwrap());
        assert_eq!(session.state.winner(), Some(Outcome::Draw));
        assert!(session.offer_draw(Color::Black).is_err());
    }

    #[tokio::test]
    async fn test_losing_ai_accepts_draw() {
        let board = Board::decode("3k5/9/9/9/9/9/9/9/9/RNR1K4").unwrap();
        let registry = GameRegistry::new(quick_config());
        let id = registry
            .create(
                GameState::from_board(board, Color::Red),
                GameKind::PlayerVsAi { ai: Color::Black },
            )
            .await;
        let handle = registry.get(id).await.unwrap();
        let mut session = handle.lock().await;
        // Black is two chariots and a horse down, past the acceptance margin.
        session.config.draw_accept_margin = 200;
        assert!(session.offer_draw(Color::Red).unwrap());
    }
}
