/// Most ticks handed out by a single [`Ticker::take_due`] call.
pub const MAX_CATCH_UP: u32 = 10;

/// A fixed-interval timer owned by whoever drives the game, scheduled in
/// epoch milliseconds from the game's clock. At most one schedule is armed;
/// arming again replaces the old one.
#[derive(Debug)]
pub struct Ticker {
    period_ms: i64,
    next_due: Option<i64>,
}

impl Ticker {
    pub fn new(period_ms: i64) -> Self {
        Self {
            period_ms,
            next_due: None,
        }
    }

    pub fn arm(&mut self, now_ms: i64) {
        self.cancel();
        self.next_due = Some(now_ms + self.period_ms);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Consumes and returns the number of ticks due by `now_ms`.
    pub fn take_due(&mut self, now_ms: i64) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };
        let mut n = 0;
        while due <= now_ms && n < MAX_CATCH_UP {
            due += self.period_ms;
            n += 1;
        }
        if due <= now_ms {
            // fell too far behind, drop the backlog
            due = now_ms + self.period_ms;
        }
        self.next_due = Some(due);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn disarmed_never_ticks() {
        let mut t = Ticker::new(20);
        assert_eq!(t.take_due(T0 + 1_000), 0);
    }

    #[test]
    fn counts_whole_periods() {
        let mut t = Ticker::new(20);
        t.arm(T0);
        assert_eq!(t.take_due(T0 + 19), 0);
        assert_eq!(t.take_due(T0 + 20), 1);
        assert_eq!(t.take_due(T0 + 79), 2);
        assert_eq!(t.take_due(T0 + 80), 1);
    }

    #[test]
    fn rearm_cancels_previous_schedule() {
        let mut t = Ticker::new(20);
        t.arm(T0);
        t.arm(T0 + 100);
        assert_eq!(t.take_due(T0 + 110), 0);
        assert_eq!(t.take_due(T0 + 120), 1);
        t.cancel();
        assert!(!t.is_armed());
        assert_eq!(t.take_due(T0 + 5_000), 0);
    }

    #[test]
    fn backlog_is_capped() {
        let mut t = Ticker::new(20);
        t.arm(T0);
        let late = T0 + 10_000;
        assert_eq!(t.take_due(late), MAX_CATCH_UP);
        assert_eq!(t.take_due(late), 0);
        assert_eq!(t.take_due(late + 20), 1);
    }

    #[test]
    fn clock_going_backwards_just_waits() {
        let mut t = Ticker::new(20);
        t.arm(T0);
        assert_eq!(t.take_due(T0 - 60_000), 0);
        assert_eq!(t.take_due(T0 + 20), 1);
    }
}
