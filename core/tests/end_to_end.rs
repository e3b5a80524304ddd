//! Full path from an SNTP reply to the output lines, on host mocks

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use binclock_core::ntp::{NTP_PORT, NTP_UNIX_OFFSET, PACKET_LEN};
use binclock_core::{
    ClockConfig, Clock, ClockError, Display, FetchError, PeriodCounter, Scheduler, SntpSource,
    SyncStatus,
};
use embassy_futures::block_on;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{CivilDateTime, PeriodicAlarm, RealTimeClock, UdpError, UdpExchange};

/// RTC that powers up at 2000-01-01 00:00:00
struct MemoryRtc(CivilDateTime);

impl Default for MemoryRtc {
    fn default() -> Self {
        Self(CivilDateTime {
            year: 2000,
            month: 1,
            day: 1,
            weekday: 6,
            hour: 0,
            minute: 0,
            second: 0,
        })
    }
}

impl RealTimeClock for MemoryRtc {
    type Error = Infallible;

    fn set_datetime(&mut self, datetime: CivilDateTime) -> Result<(), Infallible> {
        self.0 = datetime;
        Ok(())
    }

    fn now(&mut self) -> Result<CivilDateTime, Infallible> {
        Ok(self.0)
    }
}

/// Replies from a queue; an empty queue times out
#[derive(Default)]
struct FakeServer {
    replies: VecDeque<Vec<u8>>,
    requests: Vec<(String, u16, Vec<u8>)>,
}

impl FakeServer {
    fn answering(ntp_secs: &[u32]) -> Self {
        Self {
            replies: ntp_secs.iter().map(|&s| reply(s)).collect(),
            requests: Vec::new(),
        }
    }
}

impl UdpExchange for FakeServer {
    async fn exchange(
        &mut self,
        host: &str,
        port: u16,
        request: &[u8],
        response: &mut [u8],
        _timeout_ms: u64,
    ) -> Result<usize, UdpError> {
        self.requests.push((host.into(), port, request.to_vec()));
        let reply = self.replies.pop_front().ok_or(UdpError::Timeout)?;
        response[..reply.len()].copy_from_slice(&reply);
        Ok(reply.len())
    }
}

fn reply(ntp_secs: u32) -> Vec<u8> {
    let mut packet = vec![0u8; PACKET_LEN];
    packet[0] = 0x1C;
    packet[1] = 2;
    packet[40..44].copy_from_slice(&ntp_secs.to_be_bytes());
    packet
}

struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Output line whose level the test can watch after handing it over
#[derive(Clone, Default)]
struct SharedLine(Rc<RefCell<bool>>);

impl ErrorType for SharedLine {
    type Error = Infallible;
}

impl OutputPin for SharedLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        *self.0.borrow_mut() = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        *self.0.borrow_mut() = true;
        Ok(())
    }
}

fn levels(lines: &[SharedLine]) -> String {
    lines
        .iter()
        .map(|l| if *l.0.borrow() { '1' } else { '0' })
        .collect()
}

#[derive(Default)]
struct CountingAlarm {
    interval: Option<u64>,
}

impl PeriodicAlarm for CountingAlarm {
    type Error = Infallible;

    fn start_periodic(&mut self, interval_micros: u64) -> Result<(), Infallible> {
        self.interval = Some(interval_micros);
        Ok(())
    }

    fn stop(&mut self) {
        self.interval = None;
    }
}

fn seed_from<R: RealTimeClock>(
    clock: &mut Clock<R>,
    lines: &[SharedLine; 8],
) -> PeriodCounter<SharedLine, 8> {
    let secs = clock.seconds_since_midnight().ok().unwrap_or_default();
    match PeriodCounter::seed(secs, Display::new(lines.clone())) {
        Ok(counter) => counter,
        Err(e) => match e {},
    }
}

#[test]
fn test_noon_sync_seed_and_tick() {
    let config = ClockConfig::default();
    let mut source = SntpSource::with_config(
        FakeServer::answering(&[(NTP_UNIX_OFFSET + 43_200) as u32]),
        config.sntp,
    );
    let offset = config.offset().ok().unwrap_or_default();
    let mut clock = Clock::new(MemoryRtc::default(), offset);

    let synced = block_on(clock.sync_with_retries(
        &mut source,
        config.ntp_host,
        &config.retry_policy(),
        &mut NoDelay,
    ));
    assert_eq!(synced.map(|t| t.secs()), Ok(43_200));
    assert_eq!(clock.status(), SyncStatus::Synchronized);
    assert_eq!(clock.seconds_since_midnight(), Ok(43_200));

    let lines: [SharedLine; 8] = Default::default();
    let mut counter = seed_from(&mut clock, &lines);
    assert_eq!(counter.state(), 128);
    assert_eq!(levels(&lines), "10000000");

    let scheduler = Scheduler::new();
    let mut alarm = CountingAlarm::default();
    assert!(scheduler
        .arm(&mut alarm, PeriodCounter::<SharedLine, 8>::MICROS_PER_PERIOD)
        .is_ok());
    assert_eq!(alarm.interval, Some(337_500_000));

    scheduler.on_alarm();
    assert!(scheduler.dispatch(|| {
        let _ = counter.tick();
    }));
    assert_eq!(counter.state(), 129);
    assert_eq!(levels(&lines), "10000001");

    // Nothing pending: the idle loop wakes without touching the lines
    assert!(!scheduler.dispatch(|| {
        let _ = counter.tick();
    }));
    assert_eq!(counter.state(), 129);
}

#[test]
fn test_request_on_the_wire() {
    let mut source = SntpSource::new(FakeServer::answering(&[(NTP_UNIX_OFFSET + 1) as u32]));
    let mut clock = Clock::new(MemoryRtc::default(), Default::default());
    let _ = block_on(clock.sync(&mut source, "time.example.org"));

    let requests = source.into_transport().requests;
    let (host, port, request) = &requests[0];
    assert_eq!(host, "time.example.org");
    assert_eq!(*port, NTP_PORT);
    assert_eq!(request.len(), PACKET_LEN);
    assert_eq!(request[0], 0x1B);
    assert!(request[1..].iter().all(|&b| b == 0));
}

#[test]
fn test_offset_shifts_the_seed() {
    let config = ClockConfig {
        utc_offset_hours: -5,
        ..ClockConfig::default()
    };
    // 2024-03-10 03:00:00 UTC is 22:00 the previous evening at UTC-5
    let utc = 1_710_039_600u64;
    let mut source = SntpSource::new(FakeServer::answering(&[(utc + NTP_UNIX_OFFSET) as u32]));
    let offset = config.offset().ok().unwrap_or_default();
    let mut clock = Clock::new(MemoryRtc::default(), offset);

    assert!(block_on(clock.sync(&mut source, config.ntp_host)).is_ok());
    let now = clock.now().ok();
    assert_eq!(now.map(|dt| (dt.month, dt.day, dt.hour)), Some((3, 9, 22)));

    let lines: [SharedLine; 8] = Default::default();
    let counter = seed_from(&mut clock, &lines);
    // 79200 s * 256 / 86400 = 234.67
    assert_eq!(counter.state(), 234);
    assert_eq!(levels(&lines), "11101010");
}

#[test]
fn test_degraded_start_counts_from_rtc() {
    let config = ClockConfig::default();
    let mut source = SntpSource::new(FakeServer::default());
    let mut clock = Clock::new(MemoryRtc::default(), Default::default());

    let result = block_on(clock.sync_with_retries(
        &mut source,
        config.ntp_host,
        &config.retry_policy(),
        &mut NoDelay,
    ));
    assert_eq!(
        result,
        Err(ClockError::SyncExhausted {
            attempts: 3,
            last: FetchError::NetworkTimeout
        })
    );
    assert_eq!(clock.status(), SyncStatus::Unsynchronized);

    // Display still comes up, from the RTC's power-on midnight
    let lines: [SharedLine; 8] = Default::default();
    let mut counter = seed_from(&mut clock, &lines);
    assert_eq!(counter.state(), 0);
    assert_eq!(levels(&lines), "00000000");
    let _ = counter.tick();
    assert_eq!(levels(&lines), "00000001");
}

#[test]
fn test_full_day_of_ticks_returns_to_seed() {
    let lines: [SharedLine; 8] = Default::default();
    let mut counter = match PeriodCounter::seed(43_200, Display::new(lines.clone())) {
        Ok(counter) => counter,
        Err(e) => match e {},
    };
    let scheduler = Scheduler::new();

    for _ in 0..256 {
        scheduler.on_alarm();
        scheduler.dispatch(|| {
            let _ = counter.tick();
        });
    }
    assert_eq!(counter.state(), 128);
    assert_eq!(levels(&lines), "10000000");
}
