//! The top-level state machine: start screen, riding, and the injured lockout.

use crate::clock::Clock;
use crate::injury::{Countdown, Injury};
use crate::physics::{self, Player, TICK_MS};
use crate::sound::Cues;
use crate::storage::HealStore;
use crate::ticker::Ticker;
use anyhow::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Start,
    Playing,
    Injured,
}

pub struct Game<S, C, A> {
    screen: Screen,
    player: Player,
    injury: Injury<S, C>,
    cues: A,
    ticker: Ticker,
    play_started_ms: i64,
    scroll_px: f64,
    countdown: Option<Countdown>,
}

impl<S: HealStore, C: Clock, A: Cues> Game<S, C, A> {
    /// Boots onto the start screen, or straight into the lockout if the
    /// stored injury has not healed yet.
    pub fn new(store: S, clock: C, cues: A) -> Self {
        let mut g = Game {
            screen: Screen::Start,
            player: Player::new(),
            injury: Injury::new(store, clock),
            cues,
            ticker: Ticker::new(TICK_MS as i64),
            play_started_ms: 0,
            scroll_px: 0.0,
            countdown: None,
        };
        if g.injury.is_injured() {
            g.enter_injured();
        }
        g
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn scroll_px(&self) -> f64 {
        self.scroll_px
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    pub fn injury(&self) -> &Injury<S, C> {
        &self.injury
    }

    pub fn cues(&self) -> &A {
        &self.cues
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Leaves the start screen. Returns false if not on the start screen or
    /// still injured.
    pub fn start(&mut self) -> bool {
        if self.screen != Screen::Start || self.injury.is_injured() {
            return false;
        }
        self.player.place_obstacle(false);
        self.play_started_ms = self.injury.clock().now_ms();
        self.scroll_px = 0.0;
        self.cues.music_start();
        self.switch(Screen::Playing);
        true
    }

    /// Jumps if riding and on the ground.
    pub fn jump(&mut self) -> bool {
        if self.screen != Screen::Playing || !self.player.jump() {
            return false;
        }
        self.cues.jump();
        true
    }

    /// Runs every tick the timer owes us by the clock's current time. Stops
    /// early when a tick changes screens, since that replaces the timer.
    pub fn pump(&mut self) -> Result<u32> {
        let due = self.ticker.take_due(self.injury.clock().now_ms());
        let mut ran = 0;
        for _ in 0..due {
            let before = self.screen;
            self.tick()?;
            ran += 1;
            if self.screen != before {
                break;
            }
        }
        Ok(ran)
    }

    pub fn tick(&mut self) -> Result<()> {
        match self.screen {
            Screen::Start => Ok(()),
            Screen::Playing => self.tick_playing(),
            Screen::Injured => self.tick_injured(),
        }
    }

    fn tick_playing(&mut self) -> Result<()> {
        let elapsed = self.injury.clock().now_ms() - self.play_started_ms;
        self.scroll_px = physics::scroll_offset(elapsed);

        let out = self.player.step();
        log::trace!(
            "step y={} speed={} obstacle_x={}",
            self.player.y,
            self.player.speed,
            self.player.obstacle_x
        );
        if out.scored {
            log::debug!("score {}", self.player.score);
        }
        if out.collided {
            self.injury.injure()?;
            self.cues.music_stop();
            self.cues.crash();
            self.enter_injured();
        }
        Ok(())
    }

    fn tick_injured(&mut self) -> Result<()> {
        let left = self.injury.remaining_ms();
        if left <= 0 {
            self.injury.heal()?;
            self.restart();
            return Ok(());
        }
        self.countdown = Some(Countdown::from_ms(left));
        Ok(())
    }

    fn enter_injured(&mut self) {
        self.countdown = self.injury.countdown();
        self.switch(Screen::Injured);
    }

    fn restart(&mut self) {
        self.ticker.cancel();
        self.player = Player::new();
        self.scroll_px = 0.0;
        self.countdown = None;
        log::info!("{:?} -> {:?}", self.screen, Screen::Start);
        self.screen = Screen::Start;
    }

    fn switch(&mut self, to: Screen) {
        log::info!("{:?} -> {:?}", self.screen, to);
        self.ticker.cancel();
        self.screen = to;
        self.ticker.arm(self.injury.clock().now_ms());
    }
}
