use std::time::Instant;

/// Monotonic millisecond tick source. Values wrap around at `u32::MAX`.
pub trait TickSource {
    fn now_ms(&self) -> u32;
}

/// Tick source backed by [`Instant`], counting from its creation.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl TickSource for MonotonicClock {
    fn now_ms(&self) -> u32 {
        // Truncation gives the wrap-around at u32::MAX.
        self.origin.elapsed().as_millis() as u32
    }
}

/// Hand-driven tick source for tests and offline rendering.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now_ms: u32,
}

impl ManualClock {
    pub fn at(now_ms: u32) -> Self {
        Self { now_ms }
    }

    pub fn advance(&mut self, delta_ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(delta_ms);
    }
}

impl TickSource for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now_ms
    }
}

/// Milliseconds between two tick readings, tolerant of counter wrap-around.
pub fn ticks_since(now_ms: u32, earlier_ms: u32) -> u32 {
    now_ms.wrapping_sub(earlier_ms)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineState {
    /// Created but not started yet. Advances are ignored.
    Idle,
    Running,
}

/// Linear, infinitely repeating ramp from `0` to `range_end` over
/// `duration_ms`.
///
/// Progress is a pure function of the elapsed time modulo the duration, so
/// a long pause between two advances skips whole cycles instead of
/// replaying them.
#[derive(Debug, Clone)]
pub struct Timeline {
    duration_ms: u32,
    range_end: usize,
    elapsed_ms: u32,
    state: TimelineState,
}

impl Timeline {
    pub fn new(duration_ms: u32, range_end: usize) -> Self {
        Self {
            duration_ms,
            range_end,
            elapsed_ms: 0,
            state: TimelineState::Idle,
        }
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimelineState::Running
    }

    /// Starts the ramp from zero and returns the initial progress.
    pub fn start(&mut self) -> usize {
        self.state = TimelineState::Running;
        self.elapsed_ms = 0;
        self.progress()
    }

    /// Moves the timeline forward. Returns the new progress, or `None` when
    /// the timeline has not been started.
    pub fn advance(&mut self, delta_ms: u32) -> Option<usize> {
        if !self.is_running() {
            return None;
        }
        if self.duration_ms > 0 {
            let elapsed = u64::from(self.elapsed_ms) + u64::from(delta_ms);
            self.elapsed_ms = (elapsed % u64::from(self.duration_ms)) as u32;
        }
        Some(self.progress())
    }

    /// Current progress in `[0, range_end)`.
    pub fn progress(&self) -> usize {
        self.progress_at(u64::from(self.elapsed_ms))
    }

    /// Progress the timeline would report after `elapsed_ms` of running.
    pub fn progress_at(&self, elapsed_ms: u64) -> usize {
        if self.duration_ms == 0 {
            return 0;
        }
        let duration = u64::from(self.duration_ms);
        let within_cycle = elapsed_ms % duration;
        (within_cycle as u128 * self.range_end as u128 / u128::from(duration)) as usize
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const N: usize = 1256;

    #[test]
    fn idle_timeline_ignores_advances() {
        let mut timeline = Timeline::new(4000, N);
        assert_eq!(timeline.advance(1000), None);
        assert_eq!(timeline.elapsed_ms(), 0);
        assert_eq!(timeline.state(), TimelineState::Idle);
    }

    #[test]
    fn start_reports_zero_progress() {
        let mut timeline = Timeline::new(4000, N);
        assert_eq!(timeline.start(), 0);
        assert!(timeline.is_running());
    }

    #[test]
    fn progress_is_linear() {
        let mut timeline = Timeline::new(4000, N);
        timeline.start();

        assert_eq!(timeline.advance(1000), Some(N / 4));
        assert_eq!(timeline.advance(1000), Some(N / 2));
        assert_eq!(timeline.advance(1999), Some(3999 * N / 4000));
    }

    #[test]
    fn wraps_to_zero_at_duration() {
        let mut timeline = Timeline::new(4000, N);
        timeline.start();

        assert_eq!(timeline.advance(3999), Some(3999 * N / 4000));
        assert_eq!(timeline.advance(1), Some(0));
        assert_eq!(timeline.elapsed_ms(), 0);
        assert_eq!(timeline.progress_at(4000), 0);
    }

    #[test]
    fn large_deltas_skip_whole_cycles() {
        let mut timeline = Timeline::new(6000, N);
        timeline.start();

        assert_eq!(timeline.advance(6000 * 3 + 3000), Some(N / 2));
        let expected = timeline.progress_at(3000 + u64::from(u32::MAX));
        assert_eq!(timeline.advance(u32::MAX), Some(expected));
    }

    #[test]
    fn restart_resets_elapsed_time() {
        let mut timeline = Timeline::new(8000, N);
        timeline.start();
        timeline.advance(5000);
        assert_eq!(timeline.start(), 0);
        assert_eq!(timeline.elapsed_ms(), 0);
    }

    #[test]
    fn tick_deltas_survive_counter_wrap() {
        let mut clock = ManualClock::at(u32::MAX - 2);
        let before = clock.now_ms();
        clock.advance(5);
        assert_eq!(clock.now_ms(), 2);
        assert_eq!(ticks_since(clock.now_ms(), before), 5);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::start();
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(second >= first);
    }

    proptest! {
        #[test]
        fn progress_is_non_decreasing_within_a_cycle(
            duration in 1u32..20_000,
            a in 0u64..20_000,
            b in 0u64..20_000,
        ) {
            let timeline = Timeline::new(duration, N);
            let (a, b) = (a % u64::from(duration), b % u64::from(duration));
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

            prop_assert!(timeline.progress_at(lo) <= timeline.progress_at(hi));
            prop_assert!(timeline.progress_at(hi) < N);
        }

        #[test]
        fn stepped_advance_matches_pure_progress(
            duration in 1u32..10_000,
            steps in proptest::collection::vec(0u32..500, 1..64),
        ) {
            let mut timeline = Timeline::new(duration, N);
            timeline.start();
            let mut total = 0u64;
            for step in steps {
                total += u64::from(step);
                let progress = timeline.advance(step).unwrap();
                prop_assert_eq!(progress, timeline.progress_at(total));
            }
        }
    }
}
