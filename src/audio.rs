//! Audio sink using the Web Audio API
//!
//! Procedurally generated cues, no asset files. Playback is fire-and-forget:
//! a failed node creation just drops that sound.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::sim::SoundCue;

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.6,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Play a cue
    pub fn play(&self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Browsers start contexts suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match cue {
            SoundCue::Fire => self.play_fire(ctx, vol),
            SoundCue::Break => self.play_break(ctx, vol),
            SoundCue::LevelUp => self.play_level_up(ctx, vol),
            SoundCue::GameOver => self.play_game_over(ctx, vol),
            SoundCue::PlayerHit => self.play_player_hit(ctx, vol),
            SoundCue::PowerupCollect => self.play_powerup(ctx, vol),
            SoundCue::UiClick => self.play_click(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator routed through a gain node
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

    /// One decaying tone sweeping `from` → `to` Hz, starting `delay` s from now
    fn sweep(
        &self,
        ctx: &AudioContext,
        osc_type: OscillatorType,
        (from, to): (f32, f32),
        level: f32,
        delay: f64,
        duration: f64,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
            return;
        };
        let t = ctx.current_time() + delay;

        gain.gain().set_value_at_time(0.0, ctx.current_time()).ok();
        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + duration)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        if (to - from).abs() > f32::EPSILON {
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + duration)
                .ok();
        }

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + duration + 0.02).ok();
    }

    /// Fire - short laser chirp
    fn play_fire(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Square, (1200.0, 300.0), vol * 0.12, 0.0, 0.08);
    }

    /// Asteroid break - rumble plus crack
    fn play_break(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Sawtooth, (120.0, 35.0), vol * 0.35, 0.0, 0.3);
        self.sweep(ctx, OscillatorType::Square, (1500.0, 400.0), vol * 0.1, 0.0, 0.08);
    }

    /// Player hit - descending buzz
    fn play_player_hit(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Sawtooth, (400.0, 60.0), vol * 0.4, 0.0, 0.45);
        self.sweep(ctx, OscillatorType::Sine, (80.0, 40.0), vol * 0.5, 0.0, 0.3);
    }

    /// Powerup - rising sparkle
    fn play_powerup(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [660.0, 880.0, 1320.0].into_iter().enumerate() {
            self.sweep(ctx, OscillatorType::Sine, (freq, freq), vol * 0.25, i as f64 * 0.06, 0.12);
        }
    }

    /// Level up - major arpeggio
    fn play_level_up(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [523.25, 659.25, 783.99, 1046.5].into_iter().enumerate() {
            self.sweep(ctx, OscillatorType::Triangle, (freq, freq), vol * 0.3, i as f64 * 0.1, 0.25);
        }
    }

    /// Game over - slow falling minor line
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [392.0, 311.13, 261.63, 196.0].into_iter().enumerate() {
            self.sweep(ctx, OscillatorType::Triangle, (freq, freq * 0.97), vol * 0.3, i as f64 * 0.25, 0.4);
        }
    }

    /// UI click - tiny tick
    fn play_click(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Sine, (900.0, 900.0), vol * 0.15, 0.0, 0.04);
    }
}
