use std::time::Duration;

use web_time::Instant;

const WINDOW: Duration = Duration::from_millis(750);

/// Averages the frame time over fixed windows.
pub struct FrameTimer {
  window_start: Instant,
  frames: u32,
  last_average: Option<Duration>
}

impl FrameTimer {
  pub fn new() -> Self {
    Self::starting_at(Instant::now())
  }

  fn starting_at(now: Instant) -> Self {
    Self {
      window_start: now,
      frames: 0,
      last_average: None
    }
  }

  /// Returns the average frame time whenever a window completes.
  pub fn tick(&mut self) -> Option<Duration> {
    self.tick_at(Instant::now())
  }

  fn tick_at(&mut self, now: Instant) -> Option<Duration> {
    self.frames += 1;
    let elapsed = now.duration_since(self.window_start);
    if elapsed < WINDOW {
      return None;
    }
    let average = elapsed / self.frames;
    self.last_average = Some(average);
    self.window_start = now;
    self.frames = 0;
    Some(average)
  }

  pub fn average_frame_time(&self) -> Option<Duration> {
    self.last_average
  }

  pub fn fps(&self) -> Option<f32> {
    self.last_average
      .filter(|average| !average.is_zero())
      .map(|average| 1.0 / average.as_secs_f32())
  }
}

impl Default for FrameTimer {
  fn default() -> Self {
    Self::new()
  }
}
