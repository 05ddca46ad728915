use std::time::Duration;

/// Which of the two polls is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Persists position and percentage.
    Coarse,
    /// Refreshes the displayed elapsed time.
    Fine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    period: Duration,
    next_due: Duration,
}

impl Interval {
    fn starting_at(now: Duration, period: Duration) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }
}

/// Both polls, armed together. Times are offsets on the tracker's own clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    coarse: Interval,
    fine: Interval,
}

impl PollSchedule {
    /// Arm both polls; each first fires one full period after `now`.
    #[must_use]
    pub fn arm(now: Duration, coarse_period: Duration, fine_period: Duration) -> Self {
        Self {
            coarse: Interval::starting_at(now, coarse_period),
            fine: Interval::starting_at(now, fine_period),
        }
    }

    /// Earliest poll due at or before `now`, with its due time.
    ///
    /// The fine poll wins ties. The returned poll is rescheduled one period later.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Poll, Duration)> {
        let (poll, interval) = if self.fine.next_due <= self.coarse.next_due {
            (Poll::Fine, &mut self.fine)
        } else {
            (Poll::Coarse, &mut self.coarse)
        };
        if interval.next_due > now {
            return None;
        }
        let due = interval.next_due;
        interval.next_due += interval.period;
        Some((poll, due))
    }

    #[must_use]
    pub fn next_due(&self) -> Duration {
        self.fine.next_due.min(self.coarse.next_due)
    }
}
