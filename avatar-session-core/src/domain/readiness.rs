/// Tracks whether the stream finished its warmup.
///
/// With warmup requested the server streams ~2s of idle video first and
/// announces `stream/ready` on the data channel; streamed video stays hidden
/// until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReadiness {
    warmup: bool,
    ready: bool,
}

impl StreamReadiness {
    pub fn new(warmup: bool) -> Self {
        Self {
            warmup,
            ready: !warmup,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn warmup(&self) -> bool {
        self.warmup
    }

    /// Returns true only on the not-ready → ready transition
    pub fn mark_ready(&mut self) -> bool {
        let changed = !self.ready;
        self.ready = true;
        changed
    }

    pub fn reset(&mut self) {
        self.ready = !self.warmup;
    }
}

impl Default for StreamReadiness {
    fn default() -> Self {
        Self::new(true)
    }
}
