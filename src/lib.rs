//! A side-scrolling bike jumper for the terminal.
//!
//! Hop the cones for points. Clip one and the rider is injured: the game
//! stays locked on a countdown for 58 real hours, and the lockout is saved
//! to disk so restarting does not help.

pub mod app;
pub mod clock;
pub mod config;
pub mod game;
pub mod injury;
pub mod physics;
pub mod render;
pub mod sound;
pub mod storage;
pub mod ticker;

pub use game::{Game, Screen};
pub use injury::{Countdown, HEAL_DURATION_MS, Injury};
