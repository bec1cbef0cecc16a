//! Injury cooldown backed by a persisted heal timestamp.
//!
//! The store is the only source of truth: a stored timestamp means the rider
//! is injured, no timestamp means healthy. Nothing here expires an injury on
//! its own; whoever polls [`Injury::remaining_ms`] heals once it drops to zero.

use crate::clock::Clock;
use crate::storage::HealStore;
use anyhow::Result;
use std::fmt;

/// How long an injury lasts, in milliseconds (about 58 hours).
pub const HEAL_DURATION_MS: i64 = 209_196_864;

pub struct Injury<S, C> {
    store: S,
    clock: C,
}

impl<S: HealStore, C: Clock> Injury<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn is_injured(&self) -> bool {
        self.store.load().is_some()
    }

    /// Starts a full cooldown from now, replacing any earlier one.
    pub fn injure(&mut self) -> Result<()> {
        let heal_at = self.clock.now_ms() + HEAL_DURATION_MS;
        self.store.save(heal_at)?;
        log::info!("injured, heal at {heal_at}");
        Ok(())
    }

    pub fn heal(&mut self) -> Result<()> {
        self.store.clear()?;
        log::info!("healed");
        Ok(())
    }

    /// Milliseconds until healed. Negative once the heal time has passed,
    /// zero when not injured at all.
    pub fn remaining_ms(&self) -> i64 {
        match self.store.load() {
            Some(heal_at) => heal_at - self.clock.now_ms(),
            None => 0,
        }
    }

    pub fn heal_at_ms(&self) -> Option<i64> {
        self.store.load()
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.store
            .load()
            .map(|heal_at| Countdown::from_ms(heal_at - self.clock.now_ms()))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Remaining time split into whole hours, minutes and seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub fn from_ms(ms: i64) -> Self {
        let ms = ms.max(0);
        let hours = ms / 3_600_000;
        let minutes = ms / 60_000 - hours * 60;
        let seconds = ms / 1_000 - hours * 3_600 - minutes * 60;
        Self {
            hours,
            minutes,
            seconds,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}hr : {}min : {}sec",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;

    const T0: i64 = 1_700_000_000_000;

    fn injury(clock: &ManualClock) -> Injury<MemoryStore, &ManualClock> {
        Injury::new(MemoryStore::default(), clock)
    }

    #[test]
    fn injure_then_heal() {
        let clock = ManualClock::new(T0);
        let mut inj = injury(&clock);
        assert!(!inj.is_injured());
        inj.injure().unwrap();
        assert!(inj.is_injured());
        inj.heal().unwrap();
        assert!(!inj.is_injured());
    }

    #[test]
    fn remaining_counts_down_and_goes_negative() {
        let clock = ManualClock::new(T0);
        let mut inj = injury(&clock);
        inj.injure().unwrap();
        assert_eq!(inj.remaining_ms(), HEAL_DURATION_MS);

        clock.advance(1_000);
        assert_eq!(inj.remaining_ms(), HEAL_DURATION_MS - 1_000);

        clock.set(T0 + HEAL_DURATION_MS + 1);
        assert_eq!(inj.remaining_ms(), -1);
        // still injured until somebody heals
        assert!(inj.is_injured());
    }

    #[test]
    fn reinjuring_resets_not_adds() {
        let clock = ManualClock::new(T0);
        let mut inj = injury(&clock);
        inj.injure().unwrap();
        clock.advance(50_000);
        inj.injure().unwrap();
        assert_eq!(inj.heal_at_ms(), Some(T0 + 50_000 + HEAL_DURATION_MS));
        assert_eq!(inj.remaining_ms(), HEAL_DURATION_MS);
    }

    #[test]
    fn not_injured_has_no_countdown() {
        let clock = ManualClock::new(T0);
        let inj = injury(&clock);
        assert_eq!(inj.remaining_ms(), 0);
        assert_eq!(inj.countdown(), None);
    }

    #[test]
    fn countdown_splits_units() {
        let c = Countdown::from_ms(HEAL_DURATION_MS);
        // 209_196_864 ms = 58h 6m 36.864s
        assert_eq!(
            c,
            Countdown {
                hours: 58,
                minutes: 6,
                seconds: 36
            }
        );
        assert_eq!(c.to_string(), "58hr : 6min : 36sec");
        assert_eq!(Countdown::from_ms(59_999).to_string(), "0hr : 0min : 59sec");
        assert_eq!(Countdown::from_ms(-5).to_string(), "0hr : 0min : 0sec");
    }
}
