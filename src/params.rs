/// Parameter store for the staged LQR controller
///
/// Holds the current gain pair per stage plus the smoothing/offset scalars,
/// along with a per-stage "sent" flag so the GUI can show which stages the
/// robot has already received since the last reset.

pub const STAGE_COUNT: usize = 3;

/// Slider limits. These bound the UI controls only; values are sent to the
/// robot unvalidated, exactly as the operator set them.
pub const K1_MIN: f32 = 0.1;
pub const K1_MAX: f32 = 30.0;
pub const K2_MIN: f32 = 0.01;
pub const K2_MAX: f32 = 5.0;
pub const SMOOTHING_MIN: f32 = 0.0;
pub const SMOOTHING_MAX: f32 = 1.0;
pub const OFFSET_MIN: f32 = -10.0;
pub const OFFSET_MAX: f32 = 10.0;

pub const DEFAULT_SMOOTHING: f32 = 0.5;
pub const DEFAULT_OFFSET: f32 = 0.0;

/// Default gains per stage: small (0-5°), medium (5-15°), large (15-30°) angles
pub const DEFAULT_STAGE_GAINS: [GainPair; STAGE_COUNT] = [
    GainPair { k1: 6.3, k2: 0.43 },
    GainPair { k1: 13.0, k2: 1.8 },
    GainPair { k1: 17.0, k2: 2.5 },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainPair {
    pub k1: f32,
    pub k2: f32,
}

/// One stage's slot: gains plus whether they have been transmitted at least
/// once since the last reset.
#[derive(Debug, Clone, Copy)]
pub struct StageSlot {
    pub gains: GainPair,
    pub sent: bool,
}

#[derive(Debug, Clone)]
pub struct ParamStore {
    pub stages: [StageSlot; STAGE_COUNT],
    pub smoothing: f32,
    pub offset: f32,
}

impl Default for ParamStore {
    fn default() -> Self {
        Self {
            stages: DEFAULT_STAGE_GAINS.map(|gains| StageSlot { gains, sent: false }),
            smoothing: DEFAULT_SMOOTHING,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl ParamStore {
    /// Gains for stage number n (1-based, n in 1..=3)
    pub fn stage_gains(&self, n: u8) -> GainPair {
        self.stages[(n - 1) as usize].gains
    }

    pub fn mark_sent(&mut self, n: u8) {
        self.stages[(n - 1) as usize].sent = true;
    }

    pub fn stage_sent(&self, n: u8) -> bool {
        self.stages[(n - 1) as usize].sent
    }

    /// Restore the hard-coded defaults and clear all sent flags. The transport
    /// and endpoint are not touched.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
