#![allow(missing_docs)]

use rand::{prelude::*, rngs::ThreadRng};
use squarewars_core::{
    game::{Config, Point},
    state::{MatchState, Status},
};

fn random_vacant(state: &MatchState, rng: &mut ThreadRng) -> Option<Point> {
    let n = state.config().grid_size() as i16;
    let vacant: Vec<_> = (0..n)
        .flat_map(|x| (0..n).map(move |y| Point::new(x, y)))
        .filter(|&p| state.board().is_vacant(p))
        .collect();
    vacant.choose(rng).copied()
}

#[test]
fn undo_restores_previous_state() {
    let mut rng = rand::rng();

    for _ in 0..50 {
        let mut state = MatchState::new(Config::new(rng.random_range(2..8), u32::MAX).unwrap());
        while let Some(p) = random_vacant(&state, &mut rng) {
            let before = state.clone();
            state.place(p).unwrap();
            assert_eq!(state.history().len(), state.board().occupied_count());

            if rng.random_bool(0.3) {
                let ply = state.undo().unwrap();
                assert_eq!(ply.point, p);
                assert_eq!(state.board(), before.board());
                assert_eq!(state.scores(), before.scores());
                assert_eq!(state.turn(), before.turn());
                assert_eq!(state.history(), before.history());
                assert_eq!(state.found_squares(), before.found_squares());
                state.place(p).unwrap();
            }
        }
    }
}

#[test]
fn last_chance_lasts_one_ply() {
    let mut rng = rand::rng();

    for _ in 0..200 {
        let mut state = MatchState::new(Config::new(6, rng.random_range(1..20)).unwrap());
        let mut triggered_at = None;

        while let Some(p) = random_vacant(&state, &mut rng) {
            let placement = state.place(p).unwrap();
            let ply = state.history().len();
            match placement.status {
                Status::InProgress => assert!(triggered_at.is_none()),
                Status::LastChance => {
                    assert!(triggered_at.is_none());
                    assert!(state.scores()[placement.player] >= state.config().target_score());
                    triggered_at = Some(ply);
                }
                Status::Over(winner) => {
                    assert_eq!(triggered_at, Some(ply - 1));
                    assert_eq!(winner, state.scores().leader());
                    break;
                }
            }
        }
    }
}

#[test]
fn record_replays_to_same_state() {
    let mut rng = rand::rng();

    for _ in 0..100 {
        let mut state = MatchState::new(Config::new(rng.random_range(2..10), 30).unwrap());
        while let Some(p) = random_vacant(&state, &mut rng) {
            if state.place(p).unwrap().status.is_over() {
                break;
            }
        }

        let buf = state.encode_to_vec();
        let decoded = MatchState::decode(&mut &buf[..]).unwrap();
        assert_eq!(decoded, state);
    }
}
