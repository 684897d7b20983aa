use super::protocol::{TimeReply, TimeRequest};

/// Shift a local timestamp onto the server clock.
pub fn corrected_timestamp(local_ms: u64, offset_ms: i64) -> u64 {
    let corrected = local_ms as i128 - offset_ms as i128;
    corrected.clamp(0, u64::MAX as i128) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSample {
    pub offset_ms: i64,
    pub latency_ms: Option<u64>,
}

/// Tracks the offset between the local clock and the server clock.
///
/// The offset is whatever the most recent reply reported (`diff_receive`, local
/// minus server). Samples are never averaged. Only one request is outstanding at
/// a time; starting a new one forgets the previous one.
#[derive(Debug, Default)]
pub struct ClockSyncEstimator {
    offset_ms: i64,
    latency_ms: Option<u64>,
    outstanding: Option<u64>,
    samples: u64,
}

impl ClockSyncEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn outstanding(&self) -> Option<u64> {
        self.outstanding
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn begin_request(&mut self, now_ms: u64) -> TimeRequest {
        if let Some(sent) = self.outstanding.replace(now_ms) {
            log::trace!("Time request sent at {} went unanswered", sent);
        }
        TimeRequest { now: now_ms }
    }

    pub fn handle_reply(&mut self, reply: &TimeReply, now_ms: u64) -> TimeSample {
        self.offset_ms = reply.diff_receive;
        self.samples += 1;

        if self.outstanding == Some(reply.ts_received) {
            self.outstanding = None;
            self.latency_ms = Some(now_ms.saturating_sub(reply.ts_received));
        }

        log::debug!(
            "Clock offset {} ms, latency {:?} ms",
            self.offset_ms,
            self.latency_ms
        );

        TimeSample {
            offset_ms: self.offset_ms,
            latency_ms: self.latency_ms,
        }
    }

    /// Forget the in-flight request, e.g. because its transport went away.
    pub fn abandon_request(&mut self) {
        self.outstanding = None;
    }

    pub fn corrected(&self, now_ms: u64) -> u64 {
        corrected_timestamp(now_ms, self.offset_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(diff_receive: i64, ts_received: u64) -> TimeReply {
        TimeReply {
            diff_receive,
            ts: 0,
            ts_received,
        }
    }

    #[test]
    fn test_last_reply_wins() {
        let mut sync = ClockSyncEstimator::new();

        sync.handle_reply(&reply(50, 1000), 1010);
        assert_eq!(sync.offset_ms(), 50);

        sync.handle_reply(&reply(-300, 2000), 2010);
        assert_eq!(sync.offset_ms(), -300);
        assert_eq!(sync.samples(), 2);
    }

    #[test]
    fn test_latency_from_matching_reply() {
        let mut sync = ClockSyncEstimator::new();

        let request = sync.begin_request(1000);
        assert_eq!(request.now, 1000);
        assert_eq!(sync.outstanding(), Some(1000));

        let sample = sync.handle_reply(&reply(20, 1000), 1040);
        assert_eq!(sample.latency_ms, Some(40));
        assert_eq!(sync.outstanding(), None);
    }

    #[test]
    fn test_single_outstanding_request() {
        let mut sync = ClockSyncEstimator::new();

        sync.begin_request(1000);
        sync.begin_request(2000);
        assert_eq!(sync.outstanding(), Some(2000));

        // reply to the forgotten request still moves the offset
        let sample = sync.handle_reply(&reply(75, 1000), 2100);
        assert_eq!(sample.offset_ms, 75);
        assert_eq!(sample.latency_ms, None);
        assert_eq!(sync.outstanding(), Some(2000));
    }

    #[test]
    fn test_corrected_timestamp() {
        assert_eq!(corrected_timestamp(2000, 50), 1950);
        assert_eq!(corrected_timestamp(2000, -50), 2050);
        assert_eq!(corrected_timestamp(10, 50), 0);

        let mut sync = ClockSyncEstimator::new();
        sync.handle_reply(&reply(50, 1000), 1000);
        assert_eq!(sync.corrected(2000), 1950);
    }
}
