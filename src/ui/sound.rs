/// Sound engine: procedural chiptune effects via rodio.
///
/// Effects are synthesized into in-memory WAV buffers once at startup
/// and played fire-and-forget on detached sinks.
///
/// Build without the "sound" feature to get a silent stub with the
/// same API.

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_crash: Arc<Vec<u8>>,
        sfx_idle: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_confirm: Arc<Vec<u8>>,
        sfx_bump: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio output unavailable: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_crash: Arc::new(make_wav(&gen_crash())),
                sfx_idle: Arc::new(make_wav(&gen_idle())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
                sfx_confirm: Arc::new(make_wav(&gen_confirm())),
                sfx_bump: Arc::new(make_wav(&gen_blip(110.0, 0.05, 0.2))),
            })
        }

        fn play_buf(&self, buf: Vec<u8>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(buf)) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            self.play_buf(buf.as_ref().clone());
        }

        /// Countdown tick: higher pitch as time runs out.
        pub fn play_countdown(&self, remaining_secs: u64) {
            let step = 5u64.saturating_sub(remaining_secs.min(5)) as f32;
            self.play_buf(make_wav(&gen_blip(660.0 + step * 110.0, 0.06, 0.25)));
        }

        pub fn play_crash(&self) { self.play(&self.sfx_crash); }
        pub fn play_idle(&self) { self.play(&self.sfx_idle); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
        pub fn play_confirm(&self) { self.play(&self.sfx_confirm); }
        pub fn play_bump(&self) { self.play(&self.sfx_bump); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn samples(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Sequence of notes, each with a short decay.
    fn gen_notes(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &freq in notes {
            let n = samples(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// Collision: noise burst over a falling tone.
    fn gen_crash() -> Vec<f32> {
        let n = samples(0.35);
        let mut rng: u32 = 0x9e37_79b9;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 320.0 - p * 240.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - p).powf(1.5);
                ((t * freq * TAU).sin() * 0.4 + noise * 0.6) * env * 0.35
            })
            .collect()
    }

    /// Idle timeout: two low square-ish buzzes.
    fn gen_idle() -> Vec<f32> {
        let mut out = Vec::new();
        for _ in 0..2 {
            let n = samples(0.14);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let s = if (t * 150.0 * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                out.push(s * 0.18);
            }
            out.extend(std::iter::repeat(0.0).take(samples(0.06)));
        }
        out
    }

    /// Level complete: rising major arpeggio with a held top note.
    fn gen_clear() -> Vec<f32> {
        let mut out = gen_notes(&[523.0, 659.0, 784.0], 0.09, 0.3);
        out.extend(gen_blip(1047.0, 0.3, 0.3));
        out
    }

    /// Prompt accepted.
    fn gen_confirm() -> Vec<f32> {
        gen_notes(&[880.0, 1175.0], 0.05, 0.2)
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits: u16 = 16;
        let block_align: u16 = bits / 8;
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
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_countdown(&self, _remaining_secs: u64) {}
    pub fn play_crash(&self) {}
    pub fn play_idle(&self) {}
    pub fn play_clear(&self) {}
    pub fn play_confirm(&self) {}
    pub fn play_bump(&self) {}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Crash,
    Idle,
    Clear,
    Countdown(u64),
    Bump,
}

/// Turns step events into effect cues. Pushing into a wall bumps once
/// per push, not once per tick; the next real move re-arms it.
#[derive(Debug, Default)]
pub struct EventSfx {
    against_wall: bool,
}

impl EventSfx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&mut self, events: &[GameEvent]) -> Vec<Cue> {
        let mut out = Vec::new();
        for event in events {
            match event {
                GameEvent::Moved { .. } => self.against_wall = false,
                GameEvent::Blocked => {
                    if !self.against_wall {
                        self.against_wall = true;
                        out.push(Cue::Bump);
                    }
                }
                GameEvent::Collision { .. } => out.push(Cue::Crash),
                GameEvent::IdleTimeout => out.push(Cue::Idle),
                GameEvent::TimeUp => out.push(Cue::Clear),
                GameEvent::Countdown { remaining_secs } => out.push(Cue::Countdown(*remaining_secs)),
            }
        }
        out
    }

    /// Map step events to effects.
    pub fn play(&mut self, sound: Option<&SoundEngine>, events: &[GameEvent]) {
        let cues = self.cues(events);
        let Some(sfx) = sound else { return };
        for cue in cues {
            match cue {
                Cue::Crash => sfx.play_crash(),
                Cue::Idle => sfx.play_idle(),
                Cue::Clear => sfx.play_clear(),
                Cue::Countdown(secs) => sfx.play_countdown(secs),
                Cue::Bump => sfx.play_bump(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Pos;
    use crate::sim::world::Avatar;

    fn moved() -> GameEvent {
        GameEvent::Moved { light: Pos::new(2, 1), shadow: Pos::new(2, 8) }
    }

    #[test]
    fn wall_bump_plays_once_per_push() {
        let mut sfx = EventSfx::new();
        assert_eq!(sfx.cues(&[GameEvent::Blocked]), vec![Cue::Bump]);
        assert_eq!(sfx.cues(&[GameEvent::Blocked]), vec![]);
        assert_eq!(sfx.cues(&[moved()]), vec![]);
        assert_eq!(sfx.cues(&[GameEvent::Blocked]), vec![Cue::Bump]);
    }

    #[test]
    fn outcome_events_map_to_cues() {
        let mut sfx = EventSfx::new();
        let events = [
            GameEvent::Countdown { remaining_secs: 3 },
            GameEvent::Collision { avatar: Avatar::Shadow, at: Pos::new(0, 9) },
            GameEvent::IdleTimeout,
            GameEvent::TimeUp,
        ];
        assert_eq!(sfx.cues(&events), vec![Cue::Countdown(3), Cue::Crash, Cue::Idle, Cue::Clear]);
    }
}
