use crate::clock::Clock;
use crate::game::{Game, Screen};
use crate::physics::{
    OBSTACLE_H, OBSTACLE_W, PLAYER_H, PLAYER_W, PLAYER_X, Player, WORLD_H, WORLD_W,
};
use crate::sound::Cues;
use crate::storage::HealStore;
use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};
use std::io::{self, Write};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    const fn dim(self) -> Rgb {
        Rgb(self.0 / 3, self.1 / 3, self.2 / 3)
    }

    fn term(self) -> CColor {
        CColor::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

const SKY_TOP: Rgb = Rgb(255, 170, 110);
const SKY_BOT: Rgb = Rgb(255, 226, 170);
const HILL_FAR: Rgb = Rgb(150, 120, 160);
const HILL_NEAR: Rgb = Rgb(110, 90, 130);
const CURB: Rgb = Rgb(175, 175, 170);
const SLAB: Rgb = Rgb(200, 198, 190);
const SEAM: Rgb = Rgb(140, 138, 132);
const CONE: Rgb = Rgb(255, 120, 20);
const CONE_STRIPE: Rgb = Rgb(250, 250, 250);
const TIRE: Rgb = Rgb(30, 30, 35);
const HUB: Rgb = Rgb(170, 170, 180);
const FRAME: Rgb = Rgb(210, 40, 50);
const RIDER: Rgb = Rgb(40, 90, 200);
const SKIN: Rgb = Rgb(240, 195, 150);
const HELMET: Rgb = Rgb(250, 220, 40);
const WHITE: Rgb = Rgb(255, 255, 255);
const PANEL: Rgb = Rgb(60, 20, 25);

/// Sidewalk band below the rider's ground offset.
const SIDEWALK_H: i32 = 20;
/// Distance between sidewalk seams.
const SLAB_W: f64 = 40.0;

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY_TOP; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, SKY_TOP);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, c: Rgb) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set(cx + dx, cy + dy, c);
                }
            }
        }
    }

    fn dim_all(&mut self) {
        for p in &mut self.px {
            *p = p.dim();
        }
    }

    /// Writes the buffer, then the text labels on top of it.
    pub fn render(&self, out: &mut impl Write, labels: &[Label]) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(out, style::SetBackgroundColor(top.term()))?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(out, style::SetForegroundColor(top.term()))?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(out, style::SetBackgroundColor(bot.term()))?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }

        for l in labels {
            let col = (self.w as u16).saturating_sub(l.text.chars().count() as u16) / 2;
            queue!(
                out,
                cursor::MoveTo(col, l.row),
                style::SetForegroundColor(l.fg.term()),
                style::SetBackgroundColor(PANEL.term()),
                style::Print(&l.text)
            )?;
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

/// A line of text centered on a terminal row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub row: u16,
    pub text: String,
    pub fg: Rgb,
}

// ── 3x5 bitmap digits ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

/// Draws one glyph with each bitmap cell `scale` pixels square.
fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, d: u8, scale: i32, fg: Rgb) {
    let glyph = &DIGITS[d as usize];
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32 * scale;
                let py = y + row as i32 * scale;
                buf.fill_rect(px, py, scale, scale, fg);
            }
        }
    }
}

fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, scale: i32, fg: Rgb) {
    let s = n.to_string();
    let advance = 4 * scale;
    let total_w = s.len() as i32 * advance - scale;
    let start_x = cx - total_w / 2;
    for (i, ch) in s.bytes().enumerate() {
        draw_digit(buf, start_x + i as i32 * advance, y, ch - b'0', scale, fg);
    }
}

/// Score digits grow with the terminal, one bitmap cell per 48 rows of pixels.
fn digit_scale(buf: &PixelBuf) -> i32 {
    (buf.height() as i32 / 48).max(1)
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// Maps playfield coordinates (origin bottom-left, y up) onto the buffer.
struct View {
    pw: f64,
    ph: f64,
}

impl View {
    fn of(buf: &PixelBuf) -> Self {
        View {
            pw: buf.width() as f64,
            ph: buf.height() as f64,
        }
    }

    fn x(&self, wx: f64) -> i32 {
        (wx * self.pw / WORLD_W as f64).round() as i32
    }

    fn y(&self, wy: f64) -> i32 {
        (self.ph - wy * self.ph / WORLD_H as f64).round() as i32
    }

    fn len_x(&self, w: f64) -> i32 {
        ((w * self.pw / WORLD_W as f64).round() as i32).max(1)
    }

    fn len_y(&self, h: f64) -> i32 {
        ((h * self.ph / WORLD_H as f64).round() as i32).max(1)
    }
}

/// Paints the current screen and returns the text to overlay on it.
pub fn paint<S: HealStore, C: Clock, A: Cues>(
    game: &Game<S, C, A>,
    buf: &mut PixelBuf,
) -> Vec<Label> {
    let v = View::of(buf);
    let player = game.player();
    draw_sky(buf);
    let ground = (SIDEWALK_H + player.ground_h) as f64;
    draw_hills(buf, &v, ground, game.scroll_px());
    draw_sidewalk(buf, &v, ground, game.scroll_px());

    let rows = (buf.height() / 2) as u16;
    let mid = rows / 2;
    match game.screen() {
        Screen::Start => {
            draw_bike(buf, &v, player);
            vec![
                Label {
                    row: mid.saturating_sub(2),
                    text: "  B I K E   S I M  ".into(),
                    fg: HELMET,
                },
                Label {
                    row: mid,
                    text: " SPACE to ride  ·  q to quit ".into(),
                    fg: WHITE,
                },
            ]
        }
        Screen::Playing => {
            draw_cone(buf, &v, player.obstacle_x);
            draw_bike(buf, &v, player);
            let cx = buf.width() as i32 / 2;
            let scale = digit_scale(buf);
            draw_number(buf, cx, 3, player.score, scale, WHITE);
            Vec::new()
        }
        Screen::Injured => {
            draw_bike(buf, &v, player);
            buf.dim_all();
            let countdown = game
                .countdown()
                .map(|c| c.to_string())
                .unwrap_or_default();
            vec![
                Label {
                    row: mid.saturating_sub(2),
                    text: "  YOU ARE INJURED  ".into(),
                    fg: CONE,
                },
                Label {
                    row: mid,
                    text: format!(" healed in {countdown} "),
                    fg: WHITE,
                },
                Label {
                    row: mid + 2,
                    text: " q to quit ".into(),
                    fg: SLAB,
                },
            ]
        }
    }
}

fn draw_sky(buf: &mut PixelBuf) {
    let h = buf.height();
    for y in 0..h {
        let t = (y * 256 / h.max(1)) as u16;
        let c = Rgb::lerp(SKY_TOP, SKY_BOT, t);
        for x in 0..buf.width() {
            buf.set(x as i32, y as i32, c);
        }
    }
}

fn draw_hills(buf: &mut PixelBuf, v: &View, ground: f64, scroll: f64) {
    let base = v.y(ground);
    let scale = v.ph / WORLD_H as f64;
    for (layer, speed, freq, c) in [(0, 0.1, 0.03, HILL_FAR), (1, 0.3, 0.05, HILL_NEAR)] {
        for x in 0..buf.width() as i32 {
            let wx = x as f64 * WORLD_W as f64 / v.pw - scroll * speed;
            let fx = wx * freq;
            let amp = if layer == 0 { 14.0 } else { 8.0 };
            let h = ((fx.sin() * 0.6 + (fx * 1.9).sin() * 0.4) * amp + amp * 1.5) * scale;
            for y in (base - h as i32)..base {
                buf.set(x, y, c);
            }
        }
    }
}

fn draw_sidewalk(buf: &mut PixelBuf, v: &View, ground: f64, scroll: f64) {
    let top = v.y(ground);
    let curb = v.len_y(3.0);
    let seam_w = WORLD_W as f64 / v.pw;
    for x in 0..buf.width() as i32 {
        let wx = x as f64 * WORLD_W as f64 / v.pw;
        let seam = (wx - scroll).rem_euclid(SLAB_W) < seam_w;
        for y in top..buf.height() as i32 {
            let c = if y < top + curb {
                CURB
            } else if seam {
                SEAM
            } else {
                SLAB
            };
            buf.set(x, y, c);
        }
    }
}

fn draw_cone(buf: &mut PixelBuf, v: &View, obstacle_x: i32) {
    let base = (SIDEWALK_H + Player::default().ground_h) as f64;
    let left = v.x(obstacle_x as f64);
    let w = v.len_x(OBSTACLE_W as f64);
    let h = v.len_y(OBSTACLE_H as f64);
    let bottom = v.y(base);
    for row in 0..h {
        // narrows towards the tip
        let inset = (w / 2) * row / h;
        let stripe = row > h / 3 && row < h / 2;
        buf.fill_rect(
            left + inset,
            bottom - 1 - row,
            (w - 2 * inset).max(1),
            1,
            if stripe { CONE_STRIPE } else { CONE },
        );
    }
    buf.fill_rect(left - 1, bottom - 1, w + 2, 1, CONE);
}

fn draw_bike(buf: &mut PixelBuf, v: &View, p: &Player) {
    let base = (SIDEWALK_H + p.ground_h + p.y) as f64;
    let x0 = v.x(PLAYER_X as f64);
    let w = v.len_x(PLAYER_W as f64);
    let h = v.len_y(PLAYER_H as f64);
    let bottom = v.y(base);

    let r = (h / 5).max(1);
    let wheel_y = bottom - r - 1;
    let back = x0 + r + 1;
    let front = x0 + w - r - 2;
    for cx in [back, front] {
        buf.fill_circle(cx, wheel_y, r, TIRE);
        buf.set(cx, wheel_y, HUB);
    }

    // frame and handlebars
    let frame_y = wheel_y - r / 2 - 1;
    buf.fill_rect(back, frame_y, front - back, 1.max(h / 16), FRAME);
    buf.fill_rect(front - 1, frame_y - r, 1.max(w / 24), r + 1, FRAME);

    // rider
    let torso_x = back + (front - back) / 3;
    let torso_h = h / 3;
    buf.fill_rect(torso_x, frame_y - torso_h, 2.max(w / 8), torso_h, RIDER);
    let head_r = (h / 10).max(1);
    let head_y = frame_y - torso_h - head_r;
    buf.fill_circle(torso_x + w / 16, head_y, head_r, SKIN);
    buf.fill_rect(
        torso_x + w / 16 - head_r,
        head_y - head_r,
        head_r * 2 + 1,
        head_r.max(1),
        HELMET,
    );
    // arm to the bars
    buf.fill_rect(torso_x, frame_y - torso_h + 1, front - torso_x, 1, RIDER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sound::Silent;
    use crate::storage::MemoryStore;

    #[test]
    fn set_ignores_out_of_bounds() {
        let mut b = PixelBuf::new(4, 4);
        b.set(-1, 0, WHITE);
        b.set(4, 0, WHITE);
        b.set(0, 4, WHITE);
        assert!((0..4).all(|y| (0..4).all(|x| b.get(x, y) == SKY_TOP)));
        b.set(3, 3, WHITE);
        assert_eq!(b.get(3, 3), WHITE);
    }

    #[test]
    fn view_maps_playfield_corners() {
        let b = PixelBuf::new(160, 90);
        let v = View::of(&b);
        assert_eq!(v.x(0.0), 0);
        assert_eq!(v.x(WORLD_W as f64), 160);
        assert_eq!(v.y(0.0), 90);
        assert_eq!(v.y(WORLD_H as f64), 0);
    }

    #[test]
    fn playing_draws_cone_at_obstacle() {
        let clock = ManualClock::new(0);
        let mut g = Game::new(MemoryStore::default(), &clock, Silent);
        g.start();
        for _ in 0..20 {
            g.tick().unwrap();
        }
        let mut b = PixelBuf::new(160, 90);
        let labels = paint(&g, &mut b);
        assert!(labels.is_empty());

        let v = View::of(&b);
        let x = v.x((g.player().obstacle_x + OBSTACLE_W / 2) as f64);
        let y = v.y((SIDEWALK_H + g.player().ground_h + 2) as f64);
        assert_eq!(b.get(x as usize, y as usize), CONE);
    }

    #[test]
    fn injured_screen_shows_countdown() {
        let clock = ManualClock::new(0);
        let mut store = MemoryStore::default();
        store.save(3_723_000).unwrap();
        let g = Game::new(store, &clock, Silent);
        let mut b = PixelBuf::new(80, 48);
        let labels = paint(&g, &mut b);
        assert!(labels.iter().any(|l| l.text.contains("1hr : 2min : 3sec")));
    }

    #[test]
    fn score_digits_scale_with_height() {
        assert_eq!(digit_scale(&PixelBuf::new(160, 90)), 1);
        let mut b = PixelBuf::new(40, 96);
        assert_eq!(digit_scale(&b), 2);

        draw_number(&mut b, 20, 0, 1, 2, WHITE);
        // "1" is 6px wide at scale 2, so it starts at x=17
        assert_eq!(b.get(19, 0), WHITE);
        assert_eq!(b.get(20, 1), WHITE);
        assert_eq!(b.get(17, 9), WHITE);
        assert_eq!(b.get(22, 9), WHITE);
        assert_eq!(b.get(17, 0), SKY_TOP);
        assert_eq!(b.get(21, 0), SKY_TOP);
        assert_eq!(b.get(23, 10), SKY_TOP);
    }

    #[test]
    fn render_writes_half_blocks() {
        let mut b = PixelBuf::new(2, 2);
        b.set(0, 0, WHITE);
        let mut out = Vec::new();
        b.render(&mut out, &[]).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains('\u{2580}'));
    }
}
