//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed. This is
//! the wasm implementation of [`EffectSink`]; the sim never sees any of it.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::fx::{EffectSink, SoundCue};

/// Web Audio cue player
pub struct WebAudioSink {
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for WebAudioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudioSink {
    pub fn new() -> Self {
        // May fail outside a secure context; the game plays on silently
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Short envelope: freq sweep from `f0` to `f1` over `dur` seconds
    fn blip(&self, ctx: &AudioContext, vol: f32, f0: f32, f1: f32, dur: f64, osc_type: OscillatorType) {
        let Some((osc, gain)) = self.create_osc(ctx, f0, osc_type) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + dur)
            .ok();
        osc.frequency().set_value_at_time(f0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(f1, t + dur)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + dur + 0.05).ok();
    }

    /// Ascending arpeggio of sine pings
    fn chime(&self, ctx: &AudioContext, vol: f32, freqs: &[f32]) {
        for (i, freq) in freqs.iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.2).ok();
            }
        }
    }
}

impl EffectSink for WebAudioSink {
    fn play(&mut self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend audio until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        let ctx = ctx.clone();

        match cue {
            // Thump with a falling pitch
            SoundCue::Hit => self.blip(&ctx, vol * 0.5, 150.0, 60.0, 0.1, OscillatorType::Sine),
            // Quick rising whoosh
            SoundCue::Jump => self.blip(&ctx, vol * 0.3, 200.0, 500.0, 0.12, OscillatorType::Triangle),
            // Snappy swing
            SoundCue::Attack => self.blip(&ctx, vol * 0.35, 400.0, 120.0, 0.08, OscillatorType::Square),
            // Sharp crack
            SoundCue::Shoot => self.blip(&ctx, vol * 0.4, 900.0, 200.0, 0.15, OscillatorType::Sawtooth),
            SoundCue::Powerup => self.chime(&ctx, vol, &[600.0, 800.0, 1000.0]),
            SoundCue::ShieldOn => self.blip(&ctx, vol * 0.3, 300.0, 600.0, 0.2, OscillatorType::Sine),
            // Crackling shatter
            SoundCue::Shatter => self.blip(&ctx, vol * 0.4, 3000.0, 150.0, 0.2, OscillatorType::Sawtooth),
            // Slow ominous descent
            SoundCue::CrystalDescends => {
                self.blip(&ctx, vol * 0.4, 500.0, 80.0, 1.2, OscillatorType::Sine)
            }
            SoundCue::Victory => self.chime(&ctx, vol, &[400.0, 500.0, 600.0, 800.0]),
        }
    }
}
