use tokio::sync::broadcast;

/// Coarse periodic tick (nominally once a minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTick {
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEvent {
    On,
    Off,
}

/// Reported when the radio stack cannot tell the strength.
pub const UNKNOWN_GSM_ASU: i32 = 99;
pub const UNKNOWN_DBM: i32 = -1;

/// Signal-strength change as the telephony stack reports it.
/// Only `is_gsm` is trustworthy for telling technologies apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalStrength {
    pub is_gsm: bool,
    pub gsm_signal_strength: i32,
    pub cdma_dbm: i32,
    pub evdo_dbm: i32,
}

impl SignalStrength {
    pub fn gsm(asu: i32) -> Self {
        Self {
            is_gsm: true,
            gsm_signal_strength: asu,
            cdma_dbm: UNKNOWN_DBM,
            evdo_dbm: UNKNOWN_DBM,
        }
    }

    pub fn cdma(cdma_dbm: i32, evdo_dbm: i32) -> Self {
        Self {
            is_gsm: false,
            gsm_signal_strength: UNKNOWN_GSM_ASU,
            cdma_dbm,
            evdo_dbm,
        }
    }
}

/// GPS engine status codes.
pub const GPS_EVENT_STARTED: i32 = 1;
pub const GPS_EVENT_STOPPED: i32 = 2;
pub const GPS_EVENT_FIRST_FIX: i32 = 3;
pub const GPS_EVENT_SATELLITE_STATUS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsStatusEvent {
    pub code: i32,
}

/// The four system event streams. Listeners subscribe on activation and
/// only see events published after that point.
#[derive(Debug, Clone)]
pub struct EventSources {
    pub ticks: broadcast::Sender<TimeTick>,
    pub screen: broadcast::Sender<ScreenEvent>,
    pub signal: broadcast::Sender<SignalStrength>,
    pub gps: broadcast::Sender<GpsStatusEvent>,
}

const DEFAULT_CAPACITY: usize = 64;

impl Default for EventSources {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventSources {
    pub fn new(capacity: usize) -> Self {
        let (ticks, _) = broadcast::channel(capacity);
        let (screen, _) = broadcast::channel(capacity);
        let (signal, _) = broadcast::channel(capacity);
        let (gps, _) = broadcast::channel(capacity);
        Self { ticks, screen, signal, gps }
    }

    // Each publish returns how many listeners saw the event; 0 means nobody was subscribed.

    pub fn tick(&self, tick: TimeTick) -> usize {
        self.ticks.send(tick).unwrap_or(0)
    }

    pub fn screen(&self, event: ScreenEvent) -> usize {
        self.screen.send(event).unwrap_or(0)
    }

    pub fn signal(&self, strength: SignalStrength) -> usize {
        self.signal.send(strength).unwrap_or(0)
    }

    pub fn gps(&self, event: GpsStatusEvent) -> usize {
        self.gps.send(event).unwrap_or(0)
    }
}
