use std::collections::HashSet;

use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::BanditError;
use crate::policy::EpsilonGreedy;

#[test]
fn test_greedy_picks_lowest_values_in_order() {
    let values = array![3.0, -1.0, 7.5, 0.25, 2.0];
    let actions = EpsilonGreedy::greedy_actions(values.view(), 3).unwrap();
    assert_eq!(actions, vec![1, 3, 4]);
}

#[test]
fn test_greedy_single_action_is_argmin() {
    let values = array![0.4, 0.3, 0.9];
    assert_eq!(EpsilonGreedy::greedy_actions(values.view(), 1).unwrap(), vec![1]);
}

#[test]
fn test_greedy_ties_prefer_lower_index() {
    let values = array![1.0, 0.5, 0.5, 2.0];
    assert_eq!(EpsilonGreedy::greedy_actions(values.view(), 2).unwrap(), vec![1, 2]);
}

#[test]
fn test_greedy_clamps_to_action_count() {
    let values = array![2.0, 1.0];
    assert_eq!(EpsilonGreedy::greedy_actions(values.view(), 5).unwrap(), vec![1, 0]);
}

#[test]
fn test_greedy_rejects_nan() {
    let values = array![1.0, f32::NAN];
    assert!(matches!(
        EpsilonGreedy::greedy_actions(values.view(), 1),
        Err(BanditError::NumericalError(_))
    ));
}

#[test]
fn test_zero_actions_requested_is_invalid() {
    let values = array![1.0, 2.0];
    assert!(matches!(
        EpsilonGreedy::greedy_actions(values.view(), 0),
        Err(BanditError::InvalidParameter { .. })
    ));
    let mut rng = StdRng::seed_from_u64(0);
    assert!(EpsilonGreedy::random_actions(4, 0, &mut rng).is_err());
}

#[test]
fn test_random_actions_are_distinct_and_in_range() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let actions = EpsilonGreedy::random_actions(6, 4, &mut rng).unwrap();
        assert_eq!(actions.len(), 4);
        let unique: HashSet<_> = actions.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(actions.iter().all(|&a| a < 6));
    }
}

#[test]
fn test_random_actions_cover_action_space() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut seen = HashSet::new();
    for _ in 0..500 {
        seen.extend(EpsilonGreedy::random_actions(5, 1, &mut rng).unwrap());
    }
    assert_eq!(seen.len(), 5);
}

#[test]
fn test_exploration_extremes() {
    let mut rng = StdRng::seed_from_u64(5);
    let never = EpsilonGreedy::new(0.0, 0.0, 0.1);
    let always = EpsilonGreedy::new(1.0, 0.0, 0.1);
    for _ in 0..10_000 {
        assert!(!never.should_explore(&mut rng));
        assert!(always.should_explore(&mut rng));
    }
}

#[test]
fn test_exploration_rate_is_roughly_epsilon() {
    let mut rng = StdRng::seed_from_u64(9);
    let policy = EpsilonGreedy::new(0.3, 0.0, 0.1);
    let trials = 20_000;
    let explored = (0..trials).filter(|_| policy.should_explore(&mut rng)).count();
    let rate = explored as f32 / trials as f32;
    assert!((rate - 0.3).abs() < 0.02, "rate {}", rate);
}

#[test]
fn test_decay_strictly_decreases_and_is_bounded() {
    let mut policy = EpsilonGreedy::new(1.0, 0.001, 0.15);
    let before = policy.epsilon;
    assert!(policy.decay());
    assert!(policy.epsilon < before);
    assert!((policy.epsilon - 0.85).abs() < 1e-6);
    assert!(policy.epsilon >= policy.epsilon_min * (1.0 - policy.epsilon_decay));
}

#[test]
fn test_decay_stops_at_floor() {
    let mut policy = EpsilonGreedy::new(0.0012, 0.001, 0.5);
    assert!(policy.decay());
    assert_eq!(policy.epsilon, 0.001);
    assert!(!policy.decay());
    assert_eq!(policy.epsilon, 0.001);
}

#[test]
fn test_decay_below_floor_is_noop() {
    let mut policy = EpsilonGreedy::new(0.0, 0.001, 0.15);
    assert!(!policy.decay());
    assert_eq!(policy.epsilon, 0.0);
}
