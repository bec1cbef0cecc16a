//! Fixed-step rider physics, obstacle motion and collision.
//!
//! Everything here is measured in playfield pixels and ticks. A tick is
//! [`TICK_MS`] long and the integration never looks at real elapsed time, so
//! the tick interval must stay constant.

/// Length of one simulation step.
pub const TICK_MS: u64 = 20;

/// Ground scroll speed in pixels per millisecond. Negative scrolls left.
pub const GROUND_SPEED: f64 = -0.5;

/// Obstacle displacement per tick.
pub const OBSTACLE_STEP: i32 = (GROUND_SPEED * TICK_MS as f64) as i32;

pub const WORLD_W: i32 = 320;
pub const WORLD_H: i32 = 180;

pub const PLAYER_X: i32 = 40;
pub const PLAYER_W: i32 = 48;
pub const PLAYER_H: i32 = 32;

pub const OBSTACLE_W: i32 = 24;
pub const OBSTACLE_H: i32 = 24;

/// Pixels shaved off the rider's right edge before a hit counts.
pub const HIT_FORGIVENESS: i32 = 30;

/// The rider and the single obstacle they are racing towards.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Height of the ground above the bottom of the playfield.
    pub ground_h: i32,
    /// Height above the ground.
    pub y: i32,
    /// Upward speed in px/tick.
    pub speed: i32,
    pub jump_speed: i32,
    pub airborne: bool,
    /// Acceleration in px/tick².
    pub gravity: i32,
    pub obstacle_x: i32,
    pub score: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            ground_h: 5,
            y: 0,
            speed: 0,
            jump_speed: 30,
            airborne: false,
            gravity: -1,
            obstacle_x: 0,
            score: 0,
        }
    }
}

/// What happened during one [`Player::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub scored: bool,
    pub collided: bool,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a jump. Returns false when already in the air.
    pub fn jump(&mut self) -> bool {
        if self.airborne {
            return false;
        }
        self.airborne = true;
        self.speed = self.jump_speed;
        true
    }

    /// Puts the obstacle just past the right edge of the playfield.
    pub fn place_obstacle(&mut self, inc_score: bool) {
        self.obstacle_x = 30 + WORLD_W + OBSTACLE_W;
        if inc_score {
            self.score += 1;
        }
    }

    pub fn step(&mut self) -> StepOutcome {
        let mut out = StepOutcome::default();

        if self.airborne {
            self.speed += self.gravity;
            self.y += self.speed;
        }
        if self.y < 0 {
            self.y = 0;
            self.speed = 0;
            self.airborne = false;
        }

        self.obstacle_x += OBSTACLE_STEP;
        if self.obstacle_x < -OBSTACLE_W {
            self.place_obstacle(true);
            out.scored = true;
        }

        out.collided = self.hits_obstacle();
        out
    }

    /// A rider low enough to touch the cone is hit from the moment it reaches
    /// them until it wraps, so a jump has to last until the wrap.
    pub fn hits_obstacle(&self) -> bool {
        let right = PLAYER_X + PLAYER_W;
        self.obstacle_x <= right - HIT_FORGIVENESS && self.y <= OBSTACLE_H
    }
}

/// Horizontal offset of the scrolling ground after `elapsed_ms` of play.
pub fn scroll_offset(elapsed_ms: i64) -> f64 {
    GROUND_SPEED * elapsed_ms as f64
}
