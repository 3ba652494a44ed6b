//! Ball-loss countdowns and delayed respawns
//!
//! A lost ball either waits on its side's countdown (paddle frozen meanwhile)
//! or, for the scoring side's ball in the brick duels, comes back after a short
//! fixed delay. Losses on a side that is already counting down are merged
//! into the running countdown.

use serde::Serialize;

use super::state::{Paddle, Side};
use crate::consts::*;

/// Pending respawn for one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub side: Side,
    pub start_tick: u64,
    pub duration: u64,
    /// Ball slots waiting on this countdown, in loss order
    pub pending: Vec<usize>,
}

impl Countdown {
    pub fn remaining(&self, now: u64) -> u64 {
        self.duration
            .saturating_sub(now.saturating_sub(self.start_tick))
    }

    pub fn is_finished(&self, now: u64) -> bool {
        self.remaining(now) == 0
    }

    /// Digit the player sees: 3, 2, 1 over a fresh countdown, held at 3
    /// while a merged extension runs
    pub fn display_digit(&self, now: u64) -> u64 {
        self.remaining(now)
            .div_ceil(COUNTDOWN_DIGIT_TICKS)
            .min(COUNTDOWN_DIGITS)
    }
}

/// A ball coming back after a fixed delay, no countdown shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayedRespawn {
    pub ball: usize,
    pub side: Side,
    pub due: u64,
}

/// Outcome of registering a loss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Started {
    Created,
    Merged,
}

/// At most one countdown per side plus any delayed respawns
#[derive(Debug, Clone, Default)]
pub struct CountdownManager {
    countdowns: Vec<Countdown>,
    delayed: Vec<DelayedRespawn>,
}

impl CountdownManager {
    /// Register a lost ball for `side`, freezing its paddle
    pub fn start(&mut self, side: Side, ball: usize, now: u64, paddle: &mut Paddle) -> Started {
        if let Some(countdown) = self.countdowns.iter_mut().find(|c| c.side == side) {
            if !countdown.pending.contains(&ball) {
                countdown.pending.push(ball);
            }
            let remaining = countdown.remaining(now);
            countdown.duration += COUNTDOWN_EXTENSION_TICKS;
            paddle.frozen_until = paddle
                .frozen_until
                .max(now + remaining + COUNTDOWN_EXTENSION_TICKS);
            log::debug!(
                "Countdown merged for {} (balls {:?})",
                side.as_str(),
                countdown.pending
            );
            return Started::Merged;
        }

        self.countdowns.push(Countdown {
            side,
            start_tick: now,
            duration: COUNTDOWN_TICKS,
            pending: vec![ball],
        });
        paddle.frozen_until = now + FREEZE_TICKS;
        log::debug!("Countdown started for {} (ball {})", side.as_str(), ball);
        Started::Created
    }

    /// Bring `ball` back for `side` at tick `due`
    pub fn schedule(&mut self, side: Side, ball: usize, due: u64) {
        if !self.is_pending(ball) {
            self.delayed.push(DelayedRespawn { ball, side, due });
        }
    }

    /// Remove and return countdowns that have run out, left side first
    pub fn take_finished(&mut self, now: u64) -> Vec<Countdown> {
        let (mut finished, running): (Vec<_>, Vec<_>) = self
            .countdowns
            .drain(..)
            .partition(|c| c.is_finished(now));
        self.countdowns = running;
        finished.sort_by_key(|c| c.side.index());
        finished
    }

    /// Remove and return delayed respawns that are due
    pub fn take_due(&mut self, now: u64) -> Vec<DelayedRespawn> {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.delayed.drain(..).partition(|d| now >= d.due);
        self.delayed = waiting;
        due
    }

    pub fn countdowns_for(&self, side: Side) -> Vec<&Countdown> {
        self.countdowns.iter().filter(|c| c.side == side).collect()
    }

    pub fn get(&self, side: Side) -> Option<&Countdown> {
        self.countdowns.iter().find(|c| c.side == side)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Countdown> {
        self.countdowns.iter()
    }

    /// Whether a ball slot is waiting to respawn
    pub fn is_pending(&self, ball: usize) -> bool {
        self.countdowns.iter().any(|c| c.pending.contains(&ball))
            || self.delayed.iter().any(|d| d.ball == ball)
    }

    pub fn is_empty(&self) -> bool {
        self.countdowns.is_empty() && self.delayed.is_empty()
    }

    pub fn clear(&mut self) {
        self.countdowns.clear();
        self.delayed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_freezes_paddle() {
        let mut manager = CountdownManager::default();
        let mut paddle = Paddle::new(Side::Left);
        assert_eq!(manager.start(Side::Left, 0, 100, &mut paddle), Started::Created);
        assert_eq!(paddle.frozen_until, 100 + FREEZE_TICKS);
        assert!(manager.is_pending(0));
        assert_eq!(manager.get(Side::Left).map(|c| c.display_digit(100)), Some(3));
    }

    #[test]
    fn test_digit_counts_down_three_two_one() {
        let mut manager = CountdownManager::default();
        let mut paddle = Paddle::new(Side::Left);
        manager.start(Side::Left, 0, 0, &mut paddle);
        let Some(countdown) = manager.get(Side::Left) else {
            panic!("countdown missing");
        };

        let mut shown: Vec<u64> = (0..COUNTDOWN_TICKS)
            .map(|now| countdown.display_digit(now))
            .collect();
        shown.dedup();
        assert_eq!(shown, vec![3, 2, 1]);
        assert_eq!(countdown.display_digit(COUNTDOWN_TICKS), 0);
    }

    #[test]
    fn test_merged_countdown_holds_three() {
        let mut manager = CountdownManager::default();
        let mut paddle = Paddle::new(Side::Left);
        manager.start(Side::Left, 0, 0, &mut paddle);
        manager.start(Side::Left, 2, 10, &mut paddle);
        let digit = manager.get(Side::Left).map(|c| c.display_digit(10));
        assert_eq!(digit, Some(3));
    }

    #[test]
    fn test_second_loss_merges() {
        let mut manager = CountdownManager::default();
        let mut paddle = Paddle::new(Side::Right);
        manager.start(Side::Right, 1, 0, &mut paddle);
        assert_eq!(manager.start(Side::Right, 3, 30, &mut paddle), Started::Merged);

        let countdowns = manager.countdowns_for(Side::Right);
        assert_eq!(countdowns.len(), 1);
        assert_eq!(countdowns[0].pending, vec![1, 3]);
        assert_eq!(countdowns[0].duration, COUNTDOWN_TICKS + COUNTDOWN_EXTENSION_TICKS);
        assert_eq!(paddle.frozen_until, 30 + 30 + COUNTDOWN_EXTENSION_TICKS);

        assert!(manager.take_finished(100).is_empty());
        let finished = manager.take_finished(120);
        assert_eq!(finished.len(), 1);
        assert!(manager.countdowns_for(Side::Right).is_empty());
    }

    #[test]
    fn test_sides_count_down_independently() {
        let mut manager = CountdownManager::default();
        let mut left = Paddle::new(Side::Left);
        let mut right = Paddle::new(Side::Right);
        manager.start(Side::Right, 1, 0, &mut right);
        manager.start(Side::Left, 0, 0, &mut left);
        let finished = manager.take_finished(COUNTDOWN_TICKS);
        let sides: Vec<Side> = finished.iter().map(|c| c.side).collect();
        assert_eq!(sides, vec![Side::Left, Side::Right]);
    }

    #[test]
    fn test_delayed_respawn() {
        let mut manager = CountdownManager::default();
        manager.schedule(Side::Left, 0, 10);
        assert!(manager.is_pending(0));
        assert!(manager.take_due(9).is_empty());
        assert_eq!(manager.take_due(10).len(), 1);
        assert!(manager.is_empty());
    }

    proptest! {
        #[test]
        fn prop_at_most_one_countdown_per_side(
            losses in prop::collection::vec((any::<bool>(), 0usize..4, 0u64..90), 1..40)
        ) {
            let mut manager = CountdownManager::default();
            let mut paddles = [Paddle::new(Side::Left), Paddle::new(Side::Right)];
            let mut now = 0;
            for (left, ball, gap) in losses {
                now += gap;
                manager.take_finished(now);
                let side = if left { Side::Left } else { Side::Right };
                manager.start(side, ball, now, &mut paddles[side.index()]);
                for side in Side::BOTH {
                    prop_assert!(manager.countdowns_for(side).len() <= 1);
                }
                let countdown = manager.get(side).expect("just started");
                prop_assert!(paddles[side.index()].frozen_until >= now + countdown.remaining(now).min(FREEZE_TICKS));
            }
        }
    }
}
