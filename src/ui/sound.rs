/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// One-shot effects are generated as in-memory WAV buffers at init time
/// and played fire-and-forget via detached Sinks. The rock-slide rumble
/// is different: it lives on a persistent paused Sink with an infinitely
/// repeating source, and the game unpauses it while rocks are moving.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::source::Source;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_collect: Arc<Vec<u8>>,
        sfx_unlock: Arc<Vec<u8>>,
        sfx_splat: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_won: Arc<Vec<u8>>,
        /// Persistent looping rumble, paused while no rock is moving.
        slide_sink: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let sfx_collect = Arc::new(make_wav(&gen_collect()));
            let sfx_unlock = Arc::new(make_wav(&gen_unlock()));
            let sfx_splat = Arc::new(make_wav(&gen_splat()));
            let sfx_clear = Arc::new(make_wav(&gen_clear()));
            let sfx_won = Arc::new(make_wav(&gen_won()));

            let slide_sink = Sink::try_new(&handle).ok().map(|sink| {
                let wav = make_wav(&gen_slide_cycle());
                if let Ok(src) = rodio::Decoder::new(Cursor::new(wav)) {
                    sink.append(src.repeat_infinite());
                }
                sink.pause();
                sink
            });

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_collect,
                sfx_unlock,
                sfx_splat,
                sfx_clear,
                sfx_won,
                slide_sink,
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_collect(&self) { self.play(&self.sfx_collect); }
        pub fn play_unlock(&self) { self.play(&self.sfx_unlock); }
        pub fn play_splat(&self) { self.play(&self.sfx_splat); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
        pub fn play_won(&self) { self.play(&self.sfx_won); }

        pub fn start_slide(&self) {
            if let Some(sink) = &self.slide_sink {
                sink.play();
            }
        }

        pub fn stop_slide(&self) {
            if let Some(sink) = &self.slide_sink {
                sink.pause();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Diamond pickup: quick ascending arpeggio C6→E6→G6
    fn gen_collect() -> Vec<f32> {
        let notes = [1047.0_f32, 1319.0, 1568.0]; // C6, E6, G6
        let note_dur = 0.045;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                // Square-ish wave (sine + 3rd harmonic) for retro feel
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Key in the lock: two bright chime notes
    fn gen_unlock() -> Vec<f32> {
        let pairs = [(784.0_f32, 0.08), (1047.0, 0.15)]; // G5, C6
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Crushed: a thud then a sad descending tone
    fn gen_splat() -> Vec<f32> {
        let mut samples = Vec::new();

        // Thud: low noise burst
        let thud_n = (SAMPLE_RATE as f32 * 0.08) as usize;
        let mut rng: u32 = 9871;
        for i in 0..thud_n {
            let t = i as f32 / thud_n as f32;
            rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
            let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let ti = i as f32 / SAMPLE_RATE as f32;
            let tone = (ti * 80.0 * 2.0 * std::f32::consts::PI).sin();
            samples.push((tone * 0.6 + noise * 0.4) * (1.0 - t) * 0.4);
        }

        let notes = [440.0_f32, 370.0, 311.0, 261.0]; // A4→F#4→Eb4→C4
        let note_dur = 0.12;
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                samples.push((t * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.3);
            }
        }
        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    /// Level clear: victory ascending fanfare
    fn gen_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5→E5→G5→C6
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        // Sustain the last note
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((t * last_freq * 2.0 * std::f32::consts::PI).sin() * env * 0.3);
        }
        samples
    }

    /// Game won: the clear fanfare extended one octave up
    fn gen_won() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0, 1319.0, 1568.0, 2093.0];
        let note_dur = 0.11;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        let n = (SAMPLE_RATE as f32 * 0.35) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((t * 2093.0 * 2.0 * std::f32::consts::PI).sin() * env * 0.3);
        }
        samples
    }

    /// One seamless cycle of rock-rumble noise, meant to repeat forever.
    /// Low-pass filtered LCG noise; the envelope is flat so the loop
    /// point is inaudible.
    fn gen_slide_cycle() -> Vec<f32> {
        let duration = 0.4;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 2026;
        let mut prev = 0.0_f32;
        (0..n)
            .map(|_| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                // One-pole low-pass keeps only the rumble
                prev = prev * 0.92 + noise * 0.08;
                prev * 0.9
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_collect(&self) {}
    pub fn play_unlock(&self) {}
    pub fn play_splat(&self) {}
    pub fn play_clear(&self) {}
    pub fn play_won(&self) {}
    pub fn start_slide(&self) {}
    pub fn stop_slide(&self) {}
}
