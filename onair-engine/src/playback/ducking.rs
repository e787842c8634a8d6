//! Music ducking under narration
//!
//! While any narration is playing the station's music bus sits at the duck
//! target. When the last narration ends, a short guard delay runs before
//! the music ramps back to full level, so back-to-back narrations do not
//! cause the music to bob up and down between them.
//!
//! The controller is a plain state machine: it returns [`DuckCommand`]s and
//! the caller turns them into gain ramps and queued release actions.

use onair_common::config::DuckingConfig;
use onair_common::FadeCurve;

/// Gain ramp from one level to another over `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainEnvelope {
    pub from: f32,
    pub to: f32,
    pub start: f64,
    pub end: f64,
    pub curve: FadeCurve,
}

impl GainEnvelope {
    /// Flat envelope holding `value`
    pub fn constant(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            start: 0.0,
            end: 0.0,
            curve: FadeCurve::Linear,
        }
    }

    /// Gain at engine time `t`
    pub fn value_at(&self, t: f64) -> f32 {
        if t <= self.start {
            return self.from;
        }
        if t >= self.end || self.end <= self.start {
            return self.to;
        }
        let position = ((t - self.start) / (self.end - self.start)) as f32;
        self.curve.interpolate(self.from, self.to, position)
    }
}

/// Instruction produced by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuckCommand {
    /// Ramp the music bus from `from` to `target` starting at `at`
    Ramp {
        from: f32,
        target: f32,
        at: f64,
        duration: f64,
        curve: FadeCurve,
    },
    /// Queue a release for `generation` at `due`
    ArmRelease { generation: u64, due: f64 },
}

/// Ducking timings for one station
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuckingSettings {
    pub duck_target: f32,
    pub ramp_down_secs: f64,
    pub ramp_up_secs: f64,
    pub release_guard_secs: f64,
    pub curve: FadeCurve,
}

impl DuckingSettings {
    pub fn from_config(config: &DuckingConfig, duck_target: f32) -> Self {
        Self {
            duck_target,
            ramp_down_secs: config.ramp_down_secs,
            ramp_up_secs: config.ramp_up_secs,
            release_guard_secs: config.release_guard_ms as f64 / 1000.0,
            curve: config.curve,
        }
    }
}

/// Per-station ducking state
#[derive(Debug, Clone)]
pub struct DuckingController {
    settings: DuckingSettings,
    active: u32,
    pending_release: Option<u64>,
    next_generation: u64,
    envelope: GainEnvelope,
}

impl DuckingController {
    pub fn new(settings: DuckingSettings) -> Self {
        Self {
            settings,
            active: 0,
            pending_release: None,
            next_generation: 1,
            envelope: GainEnvelope::constant(1.0),
        }
    }

    /// A narration starts: cancel any pending release and duck
    pub fn duck_start(&mut self, now: f64) -> DuckCommand {
        self.active += 1;
        self.pending_release = None;
        self.ramp_to(self.settings.duck_target, self.settings.ramp_down_secs, now)
    }

    /// A narration ended: arm the guarded release once none remain
    pub fn duck_end(&mut self, now: f64) -> Option<DuckCommand> {
        self.active = self.active.saturating_sub(1);
        if self.active > 0 {
            return None;
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.pending_release = Some(generation);
        Some(DuckCommand::ArmRelease {
            generation,
            due: now + self.settings.release_guard_secs,
        })
    }

    /// The guard delay for `generation` elapsed
    ///
    /// Ignored if a newer narration cancelled or superseded it.
    pub fn release(&mut self, generation: u64, now: f64) -> Option<DuckCommand> {
        if self.pending_release != Some(generation) || self.active > 0 {
            return None;
        }
        self.pending_release = None;
        Some(self.ramp_to(1.0, self.settings.ramp_up_secs, now))
    }

    fn ramp_to(&mut self, target: f32, duration: f64, now: f64) -> DuckCommand {
        let from = self.envelope.value_at(now);
        self.envelope = GainEnvelope {
            from,
            to: target,
            start: now,
            end: now + duration,
            curve: self.settings.curve,
        };
        DuckCommand::Ramp {
            from,
            target,
            at: now,
            duration,
            curve: self.settings.curve,
        }
    }

    /// Music gain at engine time `t`
    pub fn gain_at(&self, t: f64) -> f32 {
        self.envelope.value_at(t)
    }

    pub fn active_narrations(&self) -> u32 {
        self.active
    }

    pub fn pending_release(&self) -> Option<u64> {
        self.pending_release
    }

    pub fn settings(&self) -> &DuckingSettings {
        &self.settings
    }
}
