use std::collections::VecDeque;
use std::time::Instant;

const WINDOW: usize = 100;

/// Rolling frame-time average over the last 100 frames
pub struct FrameStats {
    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(WINDOW),
            last_frame_time: Instant::now(),
        }
    }

    /// Record a frame boundary now. Returns `(fps, average frame time in ms)`.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;
        self.record(frame_time)
    }

    fn record(&mut self, frame_time_ms: f32) -> (f32, f32) {
        self.frame_times.push_back(frame_time_ms);
        if self.frame_times.len() > WINDOW {
            self.frame_times.pop_front();
        }

        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = if avg_frame_time > 0.0 {
            1000.0 / avg_frame_time
        } else {
            0.0
        };
        (fps, avg_frame_time)
    }
}
