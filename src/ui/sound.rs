/// Sound engine: procedural chiptune-style effects via rodio.
///
/// Every effect is synthesized once at startup into an in-memory WAV
/// buffer; playback detaches a Sink per shot, so effects overlap and
/// never block the game loop.
///
/// Built without the "sound" feature, the stub engine does nothing.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_diamond: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        sfx_picked: Arc<Vec<u8>>,
        sfx_fanfare: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_diamond: Arc::new(make_wav(&gen_diamond())),
                sfx_death: Arc::new(make_wav(&gen_death())),
                sfx_picked: Arc::new(make_wav(&gen_picked())),
                sfx_fanfare: Arc::new(make_wav(&gen_fanfare())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        /// Launch of any jump, long or high.
        pub fn play_jump(&self) {
            self.play(&self.sfx_jump);
        }

        /// Diamond collected.
        pub fn play_diamond(&self) {
            self.play(&self.sfx_diamond);
        }

        /// Skull shown after a death.
        pub fn play_death(&self) {
            self.play(&self.sfx_death);
        }

        /// Cave cleared, next one coming up.
        pub fn play_picked(&self) {
            self.play(&self.sfx_picked);
        }

        /// Victory jingle; the congratulations screen plays it thrice.
        pub fn play_fanfare(&self) {
            self.play(&self.sfx_fanfare);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators, all producing Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Square-ish voice: fundamental plus a third harmonic.
    fn voice(t: f32, freq: f32) -> f32 {
        (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3
    }

    /// Append one enveloped note.
    fn push_note(samples: &mut Vec<f32>, freq: f32, dur: f32, vol: f32) {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.6);
            samples.push(voice(t, freq) * env * vol);
        }
    }

    /// Jump: quick rising whoop.
    fn gen_jump() -> Vec<f32> {
        let duration = 0.12;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 280.0 + t * 400.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.4);
                voice(ti, freq) * env * 0.22
            })
            .collect()
    }

    /// Diamond pickup: three sparkly high notes, E6 G6 B6.
    fn gen_diamond() -> Vec<f32> {
        let mut samples = Vec::new();
        for freq in [1319.0, 1568.0, 1976.0] {
            push_note(&mut samples, freq, 0.045, 0.22);
        }
        samples
    }

    /// Death: long downward glide with a slow wobble.
    fn gen_death() -> Vec<f32> {
        let duration = 0.5;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 480.0 - t * 360.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let wobble = 0.75 + 0.25 * (ti * 18.0 * TAU).sin();
                let env = (1.0 - t).powf(0.7);
                voice(ti, freq) * wobble * env * 0.3
            })
            .collect()
    }

    /// Cave advance: short D major fanfare with a held top note.
    fn gen_picked() -> Vec<f32> {
        let mut samples = Vec::new();
        for freq in [587.0, 740.0, 880.0] {
            push_note(&mut samples, freq, 0.07, 0.28);
        }
        push_note(&mut samples, 1175.0, 0.22, 0.28);
        samples
    }

    /// Victory phrase, about a second long.
    fn gen_fanfare() -> Vec<f32> {
        let phrase: [(f32, f32); 6] = [
            (523.0, 0.12),
            (659.0, 0.12),
            (784.0, 0.12),
            (1047.0, 0.2),
            (784.0, 0.12),
            (1047.0, 0.35),
        ];
        let mut samples = Vec::new();
        for (freq, dur) in phrase {
            push_note(&mut samples, freq, dur, 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder, wrapping f32 samples into a playable buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_jump(&self) {}
    pub fn play_diamond(&self) {}
    pub fn play_death(&self) {}
    pub fn play_picked(&self) {}
    pub fn play_fanfare(&self) {}
}
