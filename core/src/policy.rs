//! Action selection for artificial seats.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use rand::RngExt;
use rand::rngs::SmallRng;

use minefray_protocol::GuessKind;

use crate::*;

/// Probabilities closer than this are treated as an exact tie.
pub const CONFIDENCE_TOLERANCE: f64 = 1e-6;

/// Continuing probability of re-rolling a draw that repeats the previous one.
const REROLL_BIAS: f64 = 0.618;

/// Picks one action per artificial seat from the solver's probability map.
///
/// Candidates are the (cell, guess) pairs tied for the highest confidence;
/// when they cannot cover every seat, the next confidence tier is appended,
/// and so on until the board is exhausted. Seats then sample independently,
/// biased against repeating the immediately preceding draw.
pub fn choose_actions(
    board: &[CellState; CELL_COUNT],
    seats: usize,
    rng: &mut SmallRng,
) -> Vec<Action> {
    let probabilities = solver::mine_probabilities(board);
    let candidates = candidate_actions(&probabilities, seats);
    sample_actions(&candidates, seats, rng)
}

/// Confidence-tiered candidate pool, in cell order within each tier.
pub fn candidate_actions(
    probabilities: &BTreeMap<CellId, f64>,
    seats: usize,
) -> Vec<Action> {
    let mut candidates = Vec::new();
    let mut ceiling = f64::INFINITY;

    while candidates.len() < seats {
        let Some(best) = tier_confidence(probabilities, ceiling) else {
            break;
        };
        for (&cell, &p) in probabilities {
            for (confidence, kind) in [(p, GuessKind::Mine), (1.0 - p, GuessKind::Safe)] {
                if confidence < ceiling && confidence > best - CONFIDENCE_TOLERANCE {
                    candidates.push(Action { cell, kind });
                }
            }
        }
        ceiling = best - CONFIDENCE_TOLERANCE;
    }

    candidates
}

/// Highest confidence strictly below `ceiling`, if any cell still qualifies.
fn tier_confidence(probabilities: &BTreeMap<CellId, f64>, ceiling: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &p in probabilities.values() {
        for confidence in [p, 1.0 - p] {
            if confidence < ceiling && best.is_none_or(|current| confidence > current) {
                best = Some(confidence);
            }
        }
    }
    best
}

fn sample_actions(candidates: &[Action], seats: usize, rng: &mut SmallRng) -> Vec<Action> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let mut picks = Vec::with_capacity(seats);
    let mut last = usize::MAX;
    for _ in 0..seats {
        let mut draw = rng.random_range(0..candidates.len());
        while draw == last && rng.random::<f64>() <= REROLL_BIAS {
            draw = rng.random_range(0..candidates.len());
        }
        last = draw;
        picks.push(candidates[draw]);
    }
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn map(entries: &[(CellId, f64)]) -> BTreeMap<CellId, f64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn first_round_candidates_cover_the_whole_board_as_safe_guesses() {
        let board = Board::random(3);
        let probabilities = solver::mine_probabilities(&board.states());
        let candidates = candidate_actions(&probabilities, 2);

        assert_eq!(candidates.len(), CELL_COUNT);
        assert!(candidates.iter().all(|action| action.kind == GuessKind::Safe));
    }

    #[test]
    fn guess_direction_follows_the_stronger_side() {
        let probabilities = map(&[(0, 0.9), (1, 0.9), (2, 0.2)]);
        let candidates = candidate_actions(&probabilities, 2);

        assert_eq!(
            candidates,
            alloc::vec![
                Action { cell: 0, kind: GuessKind::Mine },
                Action { cell: 1, kind: GuessKind::Mine },
            ]
        );
    }

    #[test]
    fn near_ties_within_tolerance_land_in_the_same_tier() {
        let probabilities = map(&[(0, 0.9), (1, 0.9 + 1e-8), (2, 0.2)]);
        let candidates = candidate_actions(&probabilities, 1);

        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|action| action.kind == GuessKind::Mine));
    }

    #[test]
    fn lower_tiers_fill_in_when_seats_outnumber_the_best_tier() {
        let probabilities = map(&[(0, 0.9), (1, 0.7), (2, 0.6)]);

        let one_tier = candidate_actions(&probabilities, 1);
        assert_eq!(one_tier.len(), 1);

        let three_tiers = candidate_actions(&probabilities, 3);
        assert_eq!(
            three_tiers,
            alloc::vec![
                Action { cell: 0, kind: GuessKind::Mine },
                Action { cell: 1, kind: GuessKind::Mine },
                Action { cell: 2, kind: GuessKind::Mine },
            ]
        );
    }

    #[test]
    fn a_coin_flip_cell_contributes_both_directions() {
        let probabilities = map(&[(5, 0.5)]);
        let candidates = candidate_actions(&probabilities, 2);

        assert_eq!(candidates.len(), 2);
        assert!(candidates.contains(&Action { cell: 5, kind: GuessKind::Mine }));
        assert!(candidates.contains(&Action { cell: 5, kind: GuessKind::Safe }));
    }

    #[test]
    fn sampling_returns_one_action_per_seat() {
        let mut rng = SmallRng::seed_from_u64(42);
        let candidates = alloc::vec![
            Action { cell: 0, kind: GuessKind::Safe },
            Action { cell: 1, kind: GuessKind::Safe },
            Action { cell: 2, kind: GuessKind::Safe },
        ];
        let picks = sample_actions(&candidates, 5, &mut rng);
        assert_eq!(picks.len(), 5);
        assert!(picks.iter().all(|pick| candidates.contains(pick)));
    }

    #[test]
    fn a_single_candidate_still_terminates_the_reroll_loop() {
        let mut rng = SmallRng::seed_from_u64(9);
        let candidates = alloc::vec![Action { cell: 7, kind: GuessKind::Mine }];
        let picks = sample_actions(&candidates, 4, &mut rng);
        assert_eq!(picks.len(), 4);
        assert!(picks.iter().all(|pick| pick.cell == 7));
    }

    #[test]
    fn choose_actions_is_deterministic_for_a_seed() {
        let board = Board::random(17);
        let states = board.states();
        let first = choose_actions(&states, 3, &mut SmallRng::seed_from_u64(1));
        let second = choose_actions(&states, 3, &mut SmallRng::seed_from_u64(1));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
