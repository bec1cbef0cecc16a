use fundsp::prelude::*;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};

const SAMPLE_RATE: u32 = 44_100;

/// Audio cues fired by the game. All of them are fire-and-forget.
pub trait Cues {
    fn jump(&mut self);
    fn crash(&mut self);
    fn music_start(&mut self);
    fn music_stop(&mut self);
}

impl<T: Cues + ?Sized> Cues for Box<T> {
    fn jump(&mut self) {
        (**self).jump()
    }
    fn crash(&mut self) {
        (**self).crash()
    }
    fn music_start(&mut self) {
        (**self).music_start()
    }
    fn music_stop(&mut self) {
        (**self).music_stop()
    }
}

pub struct Silent;

impl Cues for Silent {
    fn jump(&mut self) {}
    fn crash(&mut self) {}
    fn music_start(&mut self) {}
    fn music_stop(&mut self) {}
}

// ── Synthesis ───────────────────────────────────────────────────────────────

fn samples(ms: usize) -> usize {
    SAMPLE_RATE as usize * ms / 1000
}

/// Pulls `ms` worth of mono samples out of a running graph.
fn render(ms: usize, mut next: impl FnMut() -> f32) -> Vec<f32> {
    (0..samples(ms)).map(|_| next()).collect()
}

/// Square chirp sweeping 330Hz up to 880Hz, 150ms.
fn synth_jump() -> Vec<f32> {
    let freq = lfo(|t: f32| lerp(330.0, 880.0, clamp01(t * 6.0)));
    let gain = lfo(|t: f32| 0.12 * (1.0 - clamp01(t * 6.6)));
    let mut chirp = (freq >> square()) * gain;
    render(150, || chirp.get_mono() as f32)
}

/// Noise burst over a saw falling from 220Hz to 80Hz, 400ms.
fn synth_crash() -> Vec<f32> {
    let hiss = noise() * lfo(|t: f32| 0.2 * (1.0 - clamp01(t * 6.6)));
    let freq = lfo(|t: f32| lerp(220.0, 80.0, clamp01(t * 2.5)));
    let gain = lfo(|t: f32| 0.15 * (1.0 - clamp01(t * 2.5)));
    let mut thud = hiss + (freq >> saw()) * gain;
    render(400, || thud.get_mono() as f32)
}

/// One bar of a plucky riding tune. Looped while playing.
fn synth_theme() -> Vec<f32> {
    let notes = [
        262.0, 330.0, 392.0, 330.0, 294.0, 349.0, 440.0, 349.0, 262.0, 330.0, 392.0, 523.0,
        494.0, 392.0, 330.0, 294.0,
    ];
    let mut out = Vec::with_capacity(samples(150) * notes.len());
    for f in notes {
        let pluck = lfo(|t: f32| {
            let d = 1.0 - clamp01(t * 6.67);
            0.08 * d * d
        });
        let mut note = sine_hz::<f32>(f) * pluck;
        out.extend(render(150, || note.get_mono() as f32));
    }
    out
}

// ── Playback ────────────────────────────────────────────────────────────────

/// Cues synthesised up front and played through the default output device.
pub struct Sound {
    stream: OutputStream,
    music: Option<Sink>,
    jump: Vec<f32>,
    crash: Vec<f32>,
    theme: Vec<f32>,
}

impl Sound {
    /// Opens the default output device. `None` if there is no usable one.
    pub fn open() -> Option<Self> {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("no audio output, playing silently: {e}");
                return None;
            }
        };
        Some(Self {
            stream,
            music: None,
            jump: synth_jump(),
            crash: synth_crash(),
            theme: synth_theme(),
        })
    }

    fn play_once(&self, samples: &[f32]) {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples.to_vec()));
        sink.detach();
    }
}

impl Cues for Sound {
    fn jump(&mut self) {
        self.play_once(&self.jump);
    }

    fn crash(&mut self) {
        self.play_once(&self.crash);
    }

    fn music_start(&mut self) {
        if self.music.is_some() {
            return;
        }
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, self.theme.clone()).repeat_infinite());
        self.music = Some(sink);
    }

    fn music_stop(&mut self) {
        if let Some(sink) = self.music.take() {
            sink.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cues_have_expected_lengths() {
        assert_eq!(synth_jump().len(), samples(150));
        assert_eq!(synth_crash().len(), samples(400));
        assert_eq!(synth_theme().len(), samples(150) * 16);
    }

    #[test]
    fn cues_stay_in_range() {
        for s in synth_jump().into_iter().chain(synth_crash()).chain(synth_theme()) {
            assert!(s.is_finite() && s.abs() <= 1.0);
        }
    }

    #[test]
    fn envelopes_fade_to_silence() {
        let jump = synth_jump();
        assert!(jump.iter().any(|s| s.abs() > 0.01));
        assert!(jump[samples(149)..].iter().all(|s| s.abs() < 0.01));

        let crash = synth_crash();
        assert!(crash[samples(395)..].iter().all(|s| s.abs() < 0.01));
    }
}
