use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Idle,
    /// A render is owed at the next frame boundary.
    Scheduled,
}

/// Coalesces render requests: any number of `request()` calls between two
/// frames produce one render, and that render reads the state as it is at
/// the frame boundary.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    state: FrameState,
    requests: u64,
    frames: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks for a render. Returns whether this call armed the scheduler;
    /// `false` means one was already pending.
    pub fn request(&mut self) -> bool {
        self.requests += 1;
        match self.state {
            FrameState::Idle => {
                self.state = FrameState::Scheduled;
                true
            }
            FrameState::Scheduled => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == FrameState::Scheduled
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Called at a frame boundary. Returns `true` if a render is due and
    /// returns to `Idle` before the caller composites, so requests made while
    /// compositing arm the next frame.
    pub fn begin_frame(&mut self) -> bool {
        match self.state {
            FrameState::Idle => false,
            FrameState::Scheduled => {
                self.state = FrameState::Idle;
                self.frames += 1;
                true
            }
        }
    }

    pub fn request_count(&self) -> u64 {
        self.requests
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadePhase {
    Visible,
    Hidden { swap_at: Instant },
}

/// Hide, wait, swap, show. Used when the lighting state flips so the new
/// frame doesn't pop in.
#[derive(Debug, Clone)]
pub struct CrossFade {
    delay: Duration,
    phase: FadePhase,
}

impl CrossFade {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            phase: FadePhase::Visible,
        }
    }

    /// Hides the output and (re)starts the swap timer. Starting again while
    /// hidden drops the earlier deadline.
    pub fn start(&mut self, now: Instant) {
        self.phase = FadePhase::Hidden {
            swap_at: now + self.delay,
        };
    }

    /// Returns `true` exactly once, on the first poll at or after the
    /// deadline. The caller then renders and shows the output.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.phase {
            FadePhase::Hidden { swap_at } if now >= swap_at => {
                self.phase = FadePhase::Visible;
                true
            }
            _ => false,
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.phase, FadePhase::Hidden { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            FadePhase::Hidden { swap_at } => Some(swap_at),
            FadePhase::Visible => None,
        }
    }
}
