/// Audio engine: procedural sound cues for core game events.
///
/// An `AudioEngine` is created once with `init()` and owned by the game loop.
/// It listens to `GameEvent`s through `handle()`; it never reaches into the world.
/// All buffers are 16-bit PCM WAV generated in memory at init time and
/// played fire-and-forget through rodio.
///
/// Built without the "sound" feature, `init()` yields an engine with no
/// output device and every call is a no-op.

use tracing::{debug, info, warn};

use crate::sim::event::GameEvent;

const SAMPLE_RATE: u32 = 22050;

/// Which cue an event maps to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Step,
    Bump,
    Clear,
}

/// Cues for one batch of events. A completion swallows the step that reached the goal.
pub fn cues(events: &[GameEvent]) -> Vec<Sfx> {
    if events.iter().any(|e| matches!(e, GameEvent::LevelCompleted { .. })) {
        return vec![Sfx::Clear];
    }
    events
        .iter()
        .map(|e| match e {
            GameEvent::Moved { .. } => Sfx::Step,
            GameEvent::Blocked { .. } => Sfx::Bump,
            GameEvent::LevelCompleted { .. } => Sfx::Clear,
        })
        .collect()
}

pub struct AudioEngine {
    output: Option<output::Output>,
    suspended: bool,
}

impl AudioEngine {
    /// Open the default output device. A missing device leaves the engine silent.
    pub fn init() -> Self {
        let output = match output::Output::open() {
            Ok(out) => {
                info!("audio output ready");
                Some(out)
            }
            Err(reason) => {
                warn!(%reason, "audio disabled");
                None
            }
        };
        AudioEngine { output, suspended: false }
    }

    #[cfg(test)]
    fn silent() -> Self {
        AudioEngine { output: None, suspended: false }
    }

    pub fn suspend(&mut self) {
        if !self.suspended {
            debug!("audio suspended");
        }
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        if self.suspended {
            debug!("audio resumed");
        }
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn handle(&self, events: &[GameEvent]) {
        if self.suspended {
            return;
        }
        if let Some(out) = &self.output {
            for sfx in cues(events) {
                out.play(sfx);
            }
        }
    }
}

#[cfg(feature = "sound")]
mod output {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Sfx};

    pub struct Output {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        step: Arc<Vec<u8>>,
        bump: Arc<Vec<u8>>,
        clear: Arc<Vec<u8>>,
    }

    impl Output {
        pub fn open() -> Result<Self, String> {
            let (stream, handle) = OutputStream::try_default().map_err(|e| e.to_string())?;
            Ok(Output {
                _stream: stream,
                handle,
                step: Arc::new(synth::make_wav(&synth::gen_step())),
                bump: Arc::new(synth::make_wav(&synth::gen_bump())),
                clear: Arc::new(synth::make_wav(&synth::gen_clear())),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Step => &self.step,
                Sfx::Bump => &self.bump,
                Sfx::Clear => &self.clear,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }
}

#[cfg(not(feature = "sound"))]
mod output {
    use super::Sfx;

    pub struct Output;

    impl Output {
        pub fn open() -> Result<Self, String> {
            Err("built without the sound feature".into())
        }
        pub fn play(&self, _sfx: Sfx) {}
    }
}

// ════════════════════════════════════════════════════════════
//  Waveforms and WAV encoding
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    use super::SAMPLE_RATE;

    fn tone(freq: f32, duration: f32, volume: f32, decay: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - i as f32 / n as f32).powf(decay);
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Footstep: very short soft tick.
    pub fn gen_step() -> Vec<f32> {
        tone(880.0, 0.025, 0.12, 1.5)
    }

    /// Wall bump: low thud with a pitch drop.
    pub fn gen_bump() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.08) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 180.0 - t * 90.0;
                phase += freq * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - t).powf(0.7) * 0.3
            })
            .collect()
    }

    /// Goal reached: rising C major arpeggio with a held top note.
    pub fn gen_clear() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[523.0_f32, 659.0, 784.0] {
            samples.extend(tone(freq, 0.09, 0.28, 0.3));
        }
        samples.extend(tone(1047.0, 0.3, 0.3, 1.0));
        samples
    }

    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * channels as u32 * bits as u32 / 8;
        let block_align = channels * bits / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::domain::cell::Cell;

    #[test]
    fn completion_batch_plays_only_fanfare() {
        let events = vec![
            GameEvent::Moved { to: Cell::new(3, 3) },
            GameEvent::LevelCompleted { level: 1, visited: HashSet::new() },
        ];
        assert_eq!(cues(&events), vec![Sfx::Clear]);
        assert_eq!(cues(&[GameEvent::Blocked { at: Cell::new(0, 1) }]), vec![Sfx::Bump]);
        assert!(cues(&[]).is_empty());
    }

    #[test]
    fn suspend_and_resume() {
        let mut audio = AudioEngine::silent();
        assert!(!audio.is_suspended());
        audio.suspend();
        assert!(audio.is_suspended());
        audio.handle(&[GameEvent::Moved { to: Cell::new(1, 1) }]);
        audio.resume();
        assert!(!audio.is_suspended());
    }

    #[test]
    fn wav_header_matches_payload() {
        let samples = synth::gen_step();
        let wav = synth::make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
    }
}
