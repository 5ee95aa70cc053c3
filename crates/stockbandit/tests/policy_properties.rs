//! Behavioural properties shared by every arm-selection policy.
//!
//! Each test drives a policy through its public API only, the way a session
//! would, and checks an observable guarantee rather than internal layout.

use rand::SeedableRng;
use rand::rngs::StdRng;

use stockbandit::policy::{
    EpsilonGreedy, GaussianThompson, HierarchicalThompson, LinUcb, NeuralBandit, Policy, Ucb1,
    UpdateRule,
};

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

// ─── Epsilon-greedy ─────────────────────────────────────────────────────

#[test]
fn greedy_picks_highest_average_for_every_arm_count() {
    for k in 1..=8 {
        let mut policy = EpsilonGreedy::new(k, 0.0);
        let mut rng = seeded_rng();
        // Untouched: every average is 0, lowest index wins.
        assert_eq!(policy.select_arm(&mut rng), 0);

        let best = k - 1;
        for arm in 0..k {
            policy.update(arm, arm as f64 * 0.1);
        }
        for _ in 0..20 {
            assert_eq!(policy.select_arm(&mut rng), best, "k = {k}");
        }
    }
}

#[test]
fn greedy_ties_go_to_lowest_index() {
    let mut policy = EpsilonGreedy::new(4, 0.0);
    let mut rng = seeded_rng();
    policy.update(1, 3.0);
    policy.update(3, 3.0);
    assert_eq!(policy.select_arm(&mut rng), 1);
}

#[test]
fn full_exploration_is_uniform() {
    const ARMS: usize = 5;
    const TRIALS: usize = 20_000;
    // χ² critical value for 4 degrees of freedom at p = 0.001.
    const CRITICAL: f64 = 18.467;

    let mut policy = EpsilonGreedy::new(ARMS, 1.0);
    policy.update(2, 100.0);
    let mut rng = seeded_rng();
    let mut counts = [0usize; ARMS];
    for _ in 0..TRIALS {
        counts[policy.select_arm(&mut rng)] += 1;
    }

    let expected = TRIALS as f64 / ARMS as f64;
    let chi2: f64 = counts
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();
    assert!(chi2 < CRITICAL, "chi2 = {chi2:.2}, counts = {counts:?}");
}

// ─── UCB1 ───────────────────────────────────────────────────────────────

#[test]
fn ucb1_plays_each_arm_once_in_order() {
    for k in 1..=6 {
        let mut policy = Ucb1::new(k);
        for expected in 0..k {
            let arm = policy.select_arm();
            assert_eq!(arm, expected);
            // Rewards that would otherwise favour arm 0.
            policy.update(arm, if arm == 0 { 10.0 } else { -10.0 });
        }
        assert_eq!(policy.stats().total_plays(), k as u64);
    }
}

#[test]
fn ucb1_eventually_revisits_weak_arms() {
    let mut policy = Ucb1::new(2);
    for _ in 0..200 {
        let arm = policy.select_arm();
        policy.update(arm, if arm == 0 { 1.0 } else { 0.0 });
    }
    assert!(policy.stats().plays(1) > 1);
    assert!(policy.stats().plays(0) > policy.stats().plays(1));
}

// ─── Averages ───────────────────────────────────────────────────────────

#[test]
fn averages_are_exact_means() {
    let rewards = [0.3, -1.2, 4.75, 0.0, 2.5, -0.01];
    let mut greedy = EpsilonGreedy::new(3, 0.1);
    let mut ucb = Ucb1::new(3);
    let mut thompson = GaussianThompson::new(3);
    for r in rewards {
        greedy.update(1, r);
        ucb.update(1, r);
        thompson.update(1, r);
    }
    let mean = rewards.iter().sum::<f64>() / rewards.len() as f64;
    for stats in [greedy.stats(), ucb.stats(), thompson.stats()] {
        assert_eq!(stats.plays(1), rewards.len() as u64);
        assert!((stats.average(1) - mean).abs() < 1e-9);
        assert_eq!(stats.average(0), 0.0);
    }
}

// ─── Thompson ───────────────────────────────────────────────────────────

#[test]
fn thompson_concentrates_on_the_better_arm() {
    let mut policy = GaussianThompson::new(2);
    for _ in 0..50 {
        policy.update(0, 0.0);
        policy.update(1, 1.0);
    }
    let mut rng = seeded_rng();
    let picks = (0..500).filter(|_| policy.select_arm(&mut rng) == 1).count();
    assert!(picks > 450, "better arm picked {picks}/500");
}

// ─── LinUCB ─────────────────────────────────────────────────────────────

#[test]
fn linucb_single_update_example() {
    let mut policy = LinUcb::new(3, 2, 1.0);
    policy.update(1, &[1.0, 0.0], 5.0);

    let arm = policy.arm(1).unwrap();
    assert_eq!(arm.a, vec![vec![2.0, 0.0], vec![0.0, 1.0]]);
    assert_eq!(arm.b, vec![5.0, 0.0]);

    // Untouched arms keep the identity prior.
    assert_eq!(policy.arm(0).unwrap().a, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[test]
fn linucb_learns_which_arm_suits_a_context() {
    let mut policy = LinUcb::new(2, 2, 0.1);
    for _ in 0..30 {
        policy.update(0, &[1.0, 0.0], 1.0);
        policy.update(0, &[0.0, 1.0], -1.0);
        policy.update(1, &[1.0, 0.0], -1.0);
        policy.update(1, &[0.0, 1.0], 1.0);
    }
    assert_eq!(policy.select_arm(&[1.0, 0.0]), 0);
    assert_eq!(policy.select_arm(&[0.0, 1.0]), 1);
}

#[test]
fn linucb_handles_wide_contexts() {
    let mut policy = LinUcb::new(2, 4, 1.0);
    let context = [0.5, -0.2, 1.0, 0.3];
    for _ in 0..10 {
        policy.update(1, &context, 2.0);
    }
    assert_eq!(policy.select_arm(&context), 1);
}

// ─── Neural ─────────────────────────────────────────────────────────────

#[test]
fn neural_policy_selects_in_range_for_both_rules() {
    for rule in [UpdateRule::InputScaled, UpdateRule::Backprop] {
        let mut rng = seeded_rng();
        let mut policy = NeuralBandit::new(3, 2, &[8, 4], &mut rng).with_update_rule(rule);
        for i in 0..30 {
            let context = [i as f64 * 0.01, 0.5];
            let arm = policy.select_arm(&context, &mut rng);
            assert!(arm < 3);
            policy.update(arm, &context, 0.2);
            assert!(policy.predict(arm, &context).is_finite());
        }
    }
}

// ─── Hierarchical ───────────────────────────────────────────────────────

#[test]
fn hierarchical_update_moves_every_cluster() {
    for reward in [1.0, 0.0, 0.45] {
        let mut policy = HierarchicalThompson::new(4, 3);
        let before: Vec<_> = policy.clusters().iter().map(|c| c.params).collect();
        let mut rng = seeded_rng();
        policy.update(1, reward, &mut rng);
        for (c, (old, new)) in before.iter().zip(policy.clusters()).enumerate() {
            assert_ne!(*old, new.params, "cluster {c} untouched for reward {reward}");
            assert_eq!(new.params.alpha + new.params.beta, old.alpha + old.beta + 1.0);
        }
    }
}

// ─── End to end ─────────────────────────────────────────────────────────

#[test]
fn three_arm_scenario_prefers_arm_with_best_average() {
    let mut policy = EpsilonGreedy::new(3, 0.0);
    // Arm 0: 1, 0, 1 → 2/3. Arm 1: never played. Arm 2: 2, 2 → 2.
    for (arm, reward) in [(0, 1.0), (2, 2.0), (0, 0.0), (2, 2.0), (0, 1.0)] {
        policy.update(arm, reward);
    }
    assert_eq!(policy.stats().plays(1), 0);
    assert!((policy.stats().average(0) - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(policy.stats().average(2), 2.0);

    let mut rng = seeded_rng();
    assert_eq!(Policy::choose(&policy, &[], &mut rng), 2);
}
