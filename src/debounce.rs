/// Saturating up/down counter turning the noisy per-frame verdict into a
/// stable confirmation. A miss costs one frame of progress instead of a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmCounter {
    count: u32,
    threshold: u32,
}

impl ConfirmCounter {
    /// A threshold of 0 is treated as 1: confirmation always needs a frame.
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Next counter after observing `raw`. Pure; `self` is unchanged.
    pub fn step(self, raw: bool) -> Self {
        let count = if raw {
            (self.count + 1).min(self.threshold)
        } else {
            self.count.saturating_sub(1)
        };
        Self { count, ..self }
    }

    /// In-place form of `step`; returns the new confirmation.
    pub fn observe(&mut self, raw: bool) -> bool {
        *self = self.step(raw);
        self.confirmed()
    }

    pub fn confirmed(&self) -> bool {
        self.count >= self.threshold
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
