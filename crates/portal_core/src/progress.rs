use crate::RequestKind;

/// Tick cadence and clamp for one kind of synthetic progress bar.
///
/// Increments are drawn by whoever drives the ticks, uniformly from
/// `[0, max_step)`, and delivered to the core inside `Msg::ProgressTick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerProfile {
    pub period_ms: u64,
    pub max_step: f64,
    pub cap: f64,
}

impl TimerProfile {
    pub const UPLOAD: TimerProfile = TimerProfile {
        period_ms: 200,
        max_step: 15.0,
        cap: 90.0,
    };
    pub const ANALYZE: TimerProfile = TimerProfile {
        period_ms: 300,
        max_step: 20.0,
        cap: 95.0,
    };
    pub const DELETE: TimerProfile = TimerProfile {
        period_ms: 250,
        max_step: 25.0,
        cap: 95.0,
    };

    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Upload => Self::UPLOAD,
            RequestKind::Analyze => Self::ANALYZE,
            RequestKind::Delete => Self::DELETE,
        }
    }
}

/// Monotonic synthetic percentage, clamped at `cap`.
///
/// Never derived from transfer telemetry; reaching the cap means nothing
/// about the remote call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressIllusion {
    value: f64,
    cap: f64,
}

impl ProgressIllusion {
    pub fn new(cap: f64) -> Self {
        Self { value: 0.0, cap }
    }

    /// Applies one tick. Negative or non-finite increments count as zero so
    /// the value never decreases.
    pub fn advance(&mut self, increment: f64) -> f64 {
        let step = if increment.is_finite() && increment > 0.0 {
            increment
        } else {
            0.0
        };
        self.value = (self.value + step).min(self.cap);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn percent(&self) -> u32 {
        self.value.round() as u32
    }

    pub fn at_cap(&self) -> bool {
        self.value >= self.cap
    }
}

const ANALYSIS_STAGES: [&str; 4] = [
    "Preprocessing image...",
    "Detecting text regions...",
    "Recognizing characters...",
    "Processing results...",
];

/// Caption shown next to an analysis bar; moves on every time the bar passes
/// another 20%.
pub fn analysis_stage_caption(value: f64) -> &'static str {
    let passed = (1..ANALYSIS_STAGES.len())
        .take_while(|step| value > (*step as f64) * 20.0)
        .count();
    ANALYSIS_STAGES[passed]
}
