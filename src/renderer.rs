//! The clock-driven half of the engine: keeps the render sink consistent
//! with `current_time`, decides what the passage of time means (end of
//! stream, looping), and throttles progress notification.

use std::time::{Duration, Instant};

use crate::{events::PlayerEvent, player::Player};

/// Suggested spacing for host tick timers.
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Minimum wall-clock spacing between `timeupdate` notifications while
/// playing continuously.
pub const TIMEUPDATE_INTERVAL: Duration = Duration::from_millis(100);

impl Player {
    /// Advances the playhead by the wall-clock time since the previous
    /// tick, scaled by the playback rate, then renders. Host timers call
    /// this roughly every [`TICK_INTERVAL`]; drift in the timer does not
    /// accumulate because elapsed time is measured tick-to-tick.
    ///
    /// Ignored while paused. While semipaused the clock keeps running but
    /// the playhead holds still (the scrub owns it).
    pub fn tick(&mut self) -> Vec<PlayerEvent> {
        self.tick_internal();
        self.take_events()
    }

    fn tick_internal(&mut self) {
        if self.state.paused {
            return;
        }
        let now = self.clock.now();
        let elapsed = match self.last_tick {
            Some(previous) => now.duration_since(previous).as_secs_f64(),
            None => 0.0,
        };
        self.last_tick = Some(now);

        if self.state.recording.is_none() || self.state.semipaused {
            return;
        }
        let target = self.state.current_time + elapsed * self.state.playback_rate;
        self.state.current_time = target.min(self.state.duration).max(0.0);
        self.render_at(now);
    }

    pub(crate) fn render_now(&mut self) {
        let now = self.clock.now();
        self.render_at(now);
    }

    /// Catches the sink up to `current_time`. Repeated calls at the same
    /// time are no-ops.
    pub(crate) fn render_at(&mut self, now: Instant) {
        let Some(recording) = self.state.recording.take() else {
            return;
        };

        // Is the most recently written chunk now in the future? There is
        // no undo for terminal output, so replay everything from a blank
        // screen. Intentionally linear: backward seeks pay full price.
        if self.state.next_chunk > 0 {
            let replayed_past = recording
                .chunks
                .get(self.state.next_chunk - 1)
                .is_some_and(|chunk| chunk.time_sec > self.state.current_time);
            if replayed_past {
                self.reset_terminal();
                self.state.next_chunk = 0;
            }
        }

        while let Some(chunk) = recording.chunks.get(self.state.next_chunk) {
            if chunk.time_sec > self.state.current_time {
                break;
            }
            self.sink.write(&chunk.payload);
            self.state.next_chunk += 1;
        }

        self.state.recording = Some(recording);

        // A scrub in progress suspends end-of-stream and loop handling.
        if self.state.semipaused {
            return;
        }

        let at_forward_end =
            self.state.playback_rate > 0.0 && self.state.current_time >= self.state.duration;
        let at_backward_end = self.state.playback_rate < 0.0 && self.state.current_time <= 0.0;

        if at_forward_end || at_backward_end {
            // Zero-length recordings have nowhere to loop to.
            if self.attrs.looping && self.state.duration > 0.0 {
                self.state.current_time = if self.state.playback_rate > 0.0 {
                    0.0
                } else {
                    self.state.duration
                };
                self.render_at(now);
            } else {
                self.emit(PlayerEvent::TimeUpdate);
                self.pause_internal();
                self.emit(PlayerEvent::Ended);
            }
            return;
        }

        let update_due = match self.last_timeupdate {
            Some(previous) => now.duration_since(previous) >= TIMEUPDATE_INTERVAL,
            None => true,
        };
        if update_due {
            self.last_timeupdate = Some(now);
            self.emit(PlayerEvent::TimeUpdate);
        }
    }
}
