/// Audio cues: one short procedural waveform per `Cue`, played with rodio.
///
/// Every buffer is synthesised into an in-memory WAV at start-up. Playback
/// is non-blocking; the sinks of a cue are kept until they drain so the cue
/// can be cut short with `stop_cue`.
///
/// A short synthesised theme loops in the background while a game runs.
///
/// Without the `sound` feature the engine is a silent stub.

#[cfg(feature = "sound")]
mod inner {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use crate::sim::event::Cue;

    const SAMPLE_RATE: u32 = 22050;
    const MUSIC_VOLUME: f32 = 0.35;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Cue, Arc<Vec<u8>>>,
        playing: RefCell<HashMap<Cue, Vec<Sink>>>,
        theme: Arc<Vec<u8>>,
        music: RefCell<Option<Sink>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio output unavailable, continuing silently: {e}");
                    return None;
                }
            };
            let buffers = Cue::ALL
                .iter()
                .map(|&cue| (cue, Arc::new(make_wav(&render(&recipe(cue))))))
                .collect();
            log::debug!("synthesised {} audio cues", Cue::ALL.len());
            Some(SoundEngine {
                _stream: stream,
                handle,
                buffers,
                playing: RefCell::new(HashMap::new()),
                theme: Arc::new(make_wav(&render(&theme()))),
                music: RefCell::new(None),
            })
        }

        /// Fire `cue` at `gain` (0..=1).
        pub fn play_cue(&self, cue: Cue, gain: f32) {
            let Some(buf) = self.buffers.get(&cue) else { return };
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    log::debug!("no sink for {}: {e}", cue.name());
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.set_volume(gain.clamp(0.0, 1.0));
                    sink.append(src);
                }
                Err(e) => {
                    log::warn!("cue {} failed to decode: {e}", cue.name());
                    return;
                }
            }
            let mut playing = self.playing.borrow_mut();
            let sinks = playing.entry(cue).or_default();
            sinks.retain(|s| !s.empty());
            sinks.push(sink);
        }

        pub fn stop_cue(&self, cue: Cue) {
            if let Some(sinks) = self.playing.borrow_mut().remove(&cue) {
                for s in sinks {
                    s.stop();
                }
            }
        }

        /// Loop the theme until `stop_music`. Already playing: no-op.
        pub fn start_music(&self) {
            let mut music = self.music.borrow_mut();
            if music.as_ref().map_or(false, |s| !s.empty()) {
                return;
            }
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    log::debug!("no sink for music: {e}");
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(self.theme.as_ref().clone())) {
                Ok(src) => {
                    sink.set_volume(MUSIC_VOLUME);
                    sink.append(src.repeat_infinite());
                }
                Err(e) => {
                    log::warn!("theme failed to decode: {e}");
                    return;
                }
            }
            *music = Some(sink);
        }

        pub fn stop_music(&self) {
            if let Some(sink) = self.music.borrow_mut().take() {
                sink.stop();
            }
        }

        pub fn set_music_paused(&self, paused: bool) {
            if let Some(sink) = self.music.borrow().as_ref() {
                if paused {
                    sink.pause();
                } else {
                    sink.play();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        /// Sine plus a third harmonic, for the chiptune edge.
        Bright,
        Noise,
    }

    /// One note: a frequency sweep with a linear decay.
    #[derive(Clone, Copy)]
    struct Note {
        from: f32,
        to: f32,
        secs: f32,
        wave: Wave,
        volume: f32,
    }

    const fn note(from: f32, to: f32, secs: f32, wave: Wave, volume: f32) -> Note {
        Note { from, to, secs, wave, volume }
    }

    fn recipe(cue: Cue) -> Vec<Note> {
        use Wave::*;
        match cue {
            Cue::Jump => vec![note(300.0, 700.0, 0.12, Sine, 0.3)],
            Cue::Land => vec![note(180.0, 90.0, 0.06, Noise, 0.25)],
            Cue::PlatformGreen => vec![note(660.0, 660.0, 0.06, Bright, 0.25), note(990.0, 990.0, 0.09, Bright, 0.25)],
            Cue::PlatformYellow => vec![note(520.0, 440.0, 0.1, Bright, 0.2)],
            Cue::BallSpawn => vec![note(900.0, 1200.0, 0.05, Sine, 0.2), note(900.0, 1200.0, 0.05, Sine, 0.2)],
            Cue::BallCollect => vec![note(1047.0, 1047.0, 0.05, Bright, 0.3), note(1319.0, 1319.0, 0.05, Bright, 0.3), note(1568.0, 1568.0, 0.08, Bright, 0.3)],
            Cue::BallImplosion => vec![note(800.0, 120.0, 0.18, Noise, 0.3)],
            Cue::Death => vec![
                note(440.0, 440.0, 0.12, Sine, 0.3),
                note(370.0, 370.0, 0.12, Sine, 0.3),
                note(311.0, 311.0, 0.12, Sine, 0.3),
                note(261.0, 200.0, 0.25, Sine, 0.3),
            ],
            Cue::LevelComplete => vec![
                note(523.0, 523.0, 0.1, Bright, 0.3),
                note(659.0, 659.0, 0.1, Bright, 0.3),
                note(784.0, 784.0, 0.1, Bright, 0.3),
                note(1047.0, 1047.0, 0.3, Bright, 0.3),
            ],
            Cue::GameOver => vec![
                note(392.0, 392.0, 0.2, Sine, 0.3),
                note(330.0, 330.0, 0.2, Sine, 0.3),
                note(262.0, 130.0, 0.5, Sine, 0.3),
            ],
            Cue::Score => vec![note(1319.0, 1319.0, 0.04, Bright, 0.25), note(1760.0, 1760.0, 0.08, Bright, 0.25)],
        }
    }

    /// Eight bars of a bouncy bass line; a zero-volume note is a rest.
    fn theme() -> Vec<Note> {
        use Wave::*;
        const BAR: [(f32, f32); 8] = [
            (131.0, 0.3),
            (0.0, 0.0),
            (196.0, 0.25),
            (131.0, 0.3),
            (175.0, 0.3),
            (0.0, 0.0),
            (196.0, 0.25),
            (165.0, 0.25),
        ];
        let roots = [1.0, 1.0, 0.89, 0.89, 0.75, 0.75, 0.84, 1.0];
        roots
            .iter()
            .flat_map(|&k| {
                BAR.iter().map(move |&(f, v)| note(f * k, f * k, 0.16, Bright, v))
            })
            .collect()
    }

    fn render(notes: &[Note]) -> Vec<f32> {
        let mut noise: u32 = 0x2545_f491;
        let mut out = Vec::new();
        for &n in notes {
            let len = (SAMPLE_RATE as f32 * n.secs) as usize;
            let mut phase = 0.0_f32;
            for i in 0..len {
                let t = i as f32 / len as f32;
                let freq = n.from + (n.to - n.from) * t;
                phase = (phase + freq / SAMPLE_RATE as f32).fract();
                let s = match n.wave {
                    Wave::Sine => (phase * TAU).sin(),
                    Wave::Bright => (phase * TAU).sin() * 0.7 + (phase * 3.0 * TAU).sin() * 0.3,
                    Wave::Noise => {
                        noise = noise.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                        let white = (noise >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                        white * 0.6 + (phase * TAU).sin() * 0.4
                    }
                };
                out.push(s * (1.0 - t) * n.volume);
            }
        }
        out
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoding (16-bit mono PCM)
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_size = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            buf.extend_from_slice(&((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_cue(&self, _cue: crate::sim::event::Cue, _gain: f32) {}
    pub fn stop_cue(&self, _cue: crate::sim::event::Cue) {}
    pub fn start_music(&self) {}
    pub fn stop_music(&self) {}
    pub fn set_music_paused(&self, _paused: bool) {}
}

/// Louder the closer `at` is to `listener`; never below 0.35.
pub fn positional_gain(at: Option<glam::Vec2>, listener: Option<glam::Vec2>, reach: f32) -> f32 {
    const FLOOR: f32 = 0.35;
    match (at, listener) {
        (Some(a), Some(l)) if reach > 0.0 => (1.0 - a.distance(l) / reach).max(FLOOR),
        _ => 1.0,
    }
}
