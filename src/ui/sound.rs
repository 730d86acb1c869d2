/// Sound engine: procedural chiptune effects via rodio.
///
/// Every effect is synthesized once at startup into an in-memory WAV buffer;
/// playback is fire-and-forget through a detached `Sink`. The game core only
/// emits `GameEvent`s; `play_event` maps them to effects.
///
/// Without the "sound" feature `SoundEngine` is a stub that plays nothing.

use crate::sim::event::{DeathCause, GameEvent};

const SAMPLE_RATE: u32 = 22050;

/// Which effect to play for an event, if any.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Hop,
    Home,
    Clear,
    Splat,
    Splash,
    GameOver,
    Pause,
}

pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::Hopped => Some(Sfx::Hop),
        GameEvent::HomeFilled { .. } => Some(Sfx::Home),
        GameEvent::LevelCleared { .. } => Some(Sfx::Clear),
        GameEvent::PlayerDied { cause: DeathCause::Drowned | DeathCause::SweptAway } => Some(Sfx::Splash),
        GameEvent::PlayerDied { .. } => Some(Sfx::Splat),
        GameEvent::GameOver => Some(Sfx::GameOver),
        GameEvent::Paused(_) => Some(Sfx::Pause),
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{make_wav, synth, Sfx};
    use crate::sim::event::GameEvent;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<(Sfx, Arc<Vec<u8>>)>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };
            let buffers = [Sfx::Hop, Sfx::Home, Sfx::Clear, Sfx::Splat, Sfx::Splash, Sfx::GameOver, Sfx::Pause]
                .into_iter()
                .map(|s| (s, Arc::new(make_wav(&synth(s)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some((_, buf)) = self.buffers.iter().find(|(s, _)| *s == sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_event(&self, event: &GameEvent) {
            if let Some(sfx) = super::sfx_for(event) {
                self.play(sfx);
            }
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
    pub fn play_event(&self, _event: &GameEvent) {}
}

// ════════════════════════════════════════════════════════════
//  Synthesis: mono f32 samples in [-1, 1]
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn synth(sfx: Sfx) -> Vec<f32> {
    match sfx {
        // short upward chirp
        Sfx::Hop => sweep(500.0, 900.0, 0.05, 0.2),
        // E6 → G6 → C7
        Sfx::Home => notes(&[1319.0, 1568.0, 2093.0], 0.06, 0.25),
        Sfx::Clear => {
            let mut s = notes(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3);
            s.extend(tone(1047.0, 0.25, 0.3));
            s
        }
        Sfx::Splat => noise_burst(0.18, 0.35),
        Sfx::Splash => {
            let mut s = sweep(900.0, 150.0, 0.2, 0.25);
            s.extend(noise_burst(0.12, 0.15));
            s
        }
        // A4 → F#4 → Eb4 → C4
        Sfx::GameOver => notes(&[440.0, 370.0, 311.0, 261.0], 0.16, 0.3),
        Sfx::Pause => tone(660.0, 0.04, 0.2),
    }
}

fn tone(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * duration) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - i as f32 / n as f32;
            // sine + 3rd harmonic for a square-ish retro timbre
            let w = (t * freq * std::f32::consts::TAU).sin() * 0.7
                + (t * freq * 3.0 * std::f32::consts::TAU).sin() * 0.3;
            w * env * volume
        })
        .collect()
}

fn notes(freqs: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
    freqs.iter().flat_map(|&f| tone(f, note_dur, volume)).collect()
}

/// Linear pitch glide with phase accumulation (no clicks).
fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * duration) as usize;
    let mut phase = 0.0f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / n as f32;
            phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
            (phase * std::f32::consts::TAU).sin() * (1.0 - t) * volume
        })
        .collect()
}

/// LCG white noise with a fast decay.
fn noise_burst(duration: f32, volume: f32) -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * duration) as usize;
    let mut state: u32 = 0x1234_5678;
    (0..n)
        .map(|i| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let noise = (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
            noise * (1.0 - i as f32 / n as f32).powi(2) * volume
        })
        .collect()
}

/// Wrap samples in a 16-bit mono PCM WAV container.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let block_align: u16 = bits_per_sample / 8;
    let byte_rate = SAMPLE_RATE * block_align as u32;
    let data_size = samples.len() as u32 * block_align as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}
