//! Effect-sink collaborator interface
//!
//! The simulation announces moments worth hearing or flashing as named
//! cues. Sinks are fire-and-forget: they must never block, fail, or feed
//! anything back into the simulation.

/// Named audio/visual cues emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Hit,
    Jump,
    Attack,
    Shoot,
    Powerup,
    ShieldOn,
    /// Ice platform shattering
    Shatter,
    /// Bird crystal spawned and descending
    CrystalDescends,
    /// Round winner declared
    Victory,
}

/// Sink for simulation cues. Implementations live in the platform layer
/// (Web Audio on wasm); the sim only ever calls [`EffectSink::play`].
pub trait EffectSink {
    fn play(&mut self, cue: SoundCue);
}

/// Discards every cue. Used by tests and headless runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl EffectSink for NullSink {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Records cues in order, for asserting on emitted effects in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub cues: Vec<SoundCue>,
}

impl EffectSink for RecordingSink {
    fn play(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }
}
