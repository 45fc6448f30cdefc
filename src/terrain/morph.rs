//! Prior-to-new height transition.

/// Animation progress for the height morph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphState {
    progress: f32,
    morph_time: f32,
}

impl MorphState {
    /// Start settled: nothing to animate until the first regeneration.
    pub fn new(morph_time: f32) -> Self {
        Self {
            progress: 1.0,
            morph_time,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn morph_time(&self) -> f32 {
        self.morph_time
    }

    pub fn is_settled(&self) -> bool {
        self.progress >= 1.0
    }

    /// Restart the transition from the prior heights.
    pub fn restart(&mut self) {
        self.progress = 0.0;
    }

    /// Advance by `delta_time` seconds, saturating at 1.
    /// A zero morph time snaps straight to the new heights.
    pub fn advance(&mut self, delta_time: f32) -> f32 {
        self.progress = if self.morph_time > 0.0 {
            (self.progress + delta_time.max(0.0) / self.morph_time).min(1.0)
        } else {
            1.0
        };
        self.progress
    }

    /// Height shown this frame for a vertex morphing from `prior` to `current`
    #[inline]
    pub fn interpolate(&self, prior: f32, current: f32) -> f32 {
        prior + (current - prior) * self.progress
    }
}
