use crate::clock::{Clock, SystemClock};
use crate::config::{self, Args};
use crate::game::{Game, Screen};
use crate::injury::{Countdown, Injury};
use crate::render::{self, PixelBuf};
use crate::sound::{Cues, Silent, Sound};
use crate::storage::{FileStore, HealStore};
use anyhow::Result;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute, terminal,
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Start,
    Jump,
    Quit,
}

pub fn action_for(screen: Screen, key: KeyCode, mods: KeyModifiers) -> Option<Action> {
    match key {
        KeyCode::Char('c') if mods.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => tap(screen),
        _ => None,
    }
}

/// A click or tap anywhere does whatever the main button would.
pub fn tap(screen: Screen) -> Option<Action> {
    match screen {
        Screen::Start => Some(Action::Start),
        Screen::Playing => Some(Action::Jump),
        Screen::Injured => None,
    }
}

pub fn status_line<S: HealStore, C: Clock>(injury: &Injury<S, C>) -> String {
    let Some(at) = injury.heal_at_ms() else {
        return "healthy, ready to ride".to_string();
    };
    let left = injury.remaining_ms();
    if left <= 0 {
        return "healed, ready to ride".to_string();
    }
    let when = chrono::DateTime::from_timestamp_millis(at)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| at.to_string());
    format!("injured, healed in {} (at {when})", Countdown::from_ms(left))
}

struct Term {
    out: Stdout,
}

impl Term {
    fn begin() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
            EnableMouseCapture,
        )?;
        Ok(Self { out })
    }

    fn end(&mut self) -> io::Result<()> {
        execute!(
            self.out,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        )?;
        terminal::disable_raw_mode()
    }
}

pub fn run(args: Args) -> Result<()> {
    let dir = args.data_dir()?;
    config::init_logging(&dir)?;
    let store = FileStore::new(&dir);
    log::info!("heal record at {}", store.path().display());

    if args.status {
        println!("{}", status_line(&Injury::new(store, SystemClock)));
        return Ok(());
    }

    let sound = if args.mute { None } else { Sound::open() };
    let cues: Box<dyn Cues> = match sound {
        Some(s) => Box::new(s),
        None => Box::new(Silent),
    };
    let mut game = Game::new(store, SystemClock, cues);

    let mut term = Term::begin()?;
    let result = play(&mut game, &mut term, args.fps);
    term.end()?;
    result
}

fn play<S: HealStore, C: Clock, A: Cues>(
    game: &mut Game<S, C, A>,
    term: &mut Term,
    fps: u32,
) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut buf = PixelBuf::new(cols as usize, rows as usize * 2);
    let frame_dur = Duration::from_secs_f64(1.0 / fps.clamp(10, 240) as f64);

    loop {
        let frame_start = Instant::now();

        while event::poll(Duration::ZERO)? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    action_for(game.screen(), key.code, key.modifiers)
                }
                Event::Mouse(m) if matches!(m.kind, MouseEventKind::Down(_)) => tap(game.screen()),
                Event::Resize(c, r) => {
                    buf.resize(c as usize, r as usize * 2);
                    None
                }
                _ => None,
            };
            match action {
                Some(Action::Quit) => return Ok(()),
                Some(Action::Start) => {
                    game.start();
                }
                Some(Action::Jump) => {
                    game.jump();
                }
                None => {}
            }
        }

        game.pump()?;

        let labels = render::paint(game, &mut buf);
        buf.render(&mut term.out, &labels)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::injury::HEAL_DURATION_MS;
    use crate::storage::MemoryStore;

    #[test]
    fn space_starts_then_jumps() {
        let none = KeyModifiers::NONE;
        assert_eq!(
            action_for(Screen::Start, KeyCode::Char(' '), none),
            Some(Action::Start)
        );
        assert_eq!(
            action_for(Screen::Playing, KeyCode::Up, none),
            Some(Action::Jump)
        );
        assert_eq!(action_for(Screen::Injured, KeyCode::Enter, none), None);
    }

    #[test]
    fn quit_keys() {
        for (k, m) in [
            (KeyCode::Char('q'), KeyModifiers::NONE),
            (KeyCode::Esc, KeyModifiers::NONE),
            (KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert_eq!(action_for(Screen::Injured, k, m), Some(Action::Quit));
        }
        assert_eq!(action_for(Screen::Playing, KeyCode::Char('c'), KeyModifiers::NONE), None);
    }

    #[test]
    fn status_reports_each_case() {
        let clock = ManualClock::new(0);
        let mut inj = Injury::new(MemoryStore::default(), &clock);
        assert_eq!(status_line(&inj), "healthy, ready to ride");

        inj.injure().unwrap();
        assert_eq!(
            status_line(&inj),
            "injured, healed in 58hr : 6min : 36sec (at 1970-01-03 10:06:36 UTC)"
        );

        clock.set(HEAL_DURATION_MS);
        assert_eq!(status_line(&inj), "healed, ready to ride");
    }
}
