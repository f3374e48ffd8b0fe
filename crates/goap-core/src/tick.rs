/// Per-frame input handed to actions and passive updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Zero-based count of brain ticks so far.
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }
}
