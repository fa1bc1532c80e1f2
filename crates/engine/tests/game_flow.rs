use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use xiangqi_engine::{
    apply_move, best_move, decode, encode, is_in_check, legal_moves, new_standard_game, undo,
    Color, Engine, EngineConfig, GameState, Outcome, PieceKind,
};

/// Plays random legal moves for the side to move until the game ends or `max_plies` is hit.
fn random_playout(seed: u64, max_plies: usize) -> GameState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = new_standard_game();
    for _ in 0..max_plies {
        if game.is_game_over() {
            break;
        }
        let moves = legal_moves(&game, game.current_player());
        let Some(mv) = moves.choose(&mut rng) else {
            break;
        };
        apply_move(&mut game, mv.from_sq(), mv.to_sq()).unwrap();
    }
    game
}

#[test]
fn test_apply_then_undo_restores_every_reachable_state() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = new_standard_game();
        for _ in 0..120 {
            if game.is_game_over() {
                break;
            }
            let before = game.snapshot();
            let moves = legal_moves(&game, game.current_player());
            let Some(mv) = moves.choose(&mut rng).copied() else {
                break;
            };

            apply_move(&mut game, mv.from_sq(), mv.to_sq()).unwrap();
            assert!(undo(&mut game));
            assert_eq!(game.snapshot(), before, "seed {} move {}", seed, mv);

            apply_move(&mut game, mv.from_sq(), mv.to_sq()).unwrap();
        }
    }
}

#[test]
fn test_undo_all_the_way_back() {
    let mut game = random_playout(3, 60);
    let plies = game.move_history().len();
    for _ in 0..plies {
        assert!(undo(&mut game));
    }
    assert!(!undo(&mut game));
    assert_eq!(game.board(), new_standard_game().board());
    assert_eq!(game.current_player(), Color::Red);
    assert!(game.position_history().is_empty());
}

#[test]
fn test_encoding_round_trips_on_random_positions() {
    for seed in 0..30 {
        let game = random_playout(seed, 80);
        let encoding = encode(&game);
        let board = decode(&encoding).unwrap();
        assert_eq!(&board, game.board());
        assert_eq!(board.encode(), encoding);
    }
}

#[test]
fn test_generated_moves_are_geometrically_sound() {
    for seed in 0..15 {
        let game = random_playout(seed, 50);
        for color in Color::ALL {
            for mv in legal_moves(&game, color) {
                let piece = game.board().at(mv.from_sq()).unwrap();
                assert_eq!(piece.color, color);
                assert_ne!(game.board().at(mv.to_sq()).map(|p| p.color), Some(color));

                let dr = mv.from_row.abs_diff(mv.to_row);
                let dc = mv.from_col.abs_diff(mv.to_col);
                let ok = match piece.kind {
                    PieceKind::King => (dr + dc == 1) || (dc == 0 && dr > 1),
                    PieceKind::Advisor => dr == 1 && dc == 1,
                    PieceKind::Elephant => dr == 2 && dc == 2,
                    PieceKind::Horse => (dr == 2 && dc == 1) || (dr == 1 && dc == 2),
                    PieceKind::Chariot | PieceKind::Cannon => (dr == 0) != (dc == 0),
                    PieceKind::Soldier => dr + dc == 1,
                };
                assert!(ok, "seed {} {:?} {}", seed, piece, mv);
            }
        }
    }
}

#[test]
fn test_check_detection_after_chariot_lift() {
    let mut game = GameState::from_board(decode("3k5/9/9/9/9/9/9/9/9/R3K4").unwrap(), Color::Red);
    assert!(!is_in_check(&game, Color::Black));
    apply_move(&mut game, (9, 0), (0, 0)).unwrap();
    assert!(is_in_check(&game, Color::Black));
    assert!(!is_in_check(&game, Color::Red));
}

#[test]
fn test_engine_plays_itself_without_breaking_rules() {
    let config = EngineConfig::default().with_depth(1);
    let mut red = Engine::with_seed(config.clone(), 11);
    let mut black = Engine::with_seed(config, 12);
    let mut game = new_standard_game();
    let mut streak = 0;

    for _ in 0..40 {
        if game.is_game_over() {
            break;
        }
        let color = game.current_player();
        let engine = match color {
            Color::Red => &mut red,
            Color::Black => &mut black,
        };
        let Some(mv) = engine.best_move(&game, color, streak >= 3) else {
            break;
        };
        assert!(game.is_legal(mv.from_sq(), mv.to_sq()));
        apply_move(&mut game, mv.from_sq(), mv.to_sq()).unwrap();
        streak = if game.is_repetition(&encode(&game)) { streak + 1 } else { 0 };
    }
    if let Some(Outcome::Winner(color)) = game.winner() {
        assert!(game.board().find_king(color).is_some());
        assert!(game.board().find_king(color.opponent()).is_none());
    }
}

#[test]
fn test_best_move_from_start_is_legal() {
    let game = new_standard_game();
    let mv = best_move(&game, Color::Red, false).unwrap();
    assert!(game.is_legal(mv.from_sq(), mv.to_sq()));
}
