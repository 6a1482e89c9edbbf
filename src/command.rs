use crate::device::{GpsStatusEvent, ScreenEvent, SignalStrength};

/// One console line, parsed. Session commands go to the controller; the
/// device lines inject events into the sources for bench testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start { test_id: i64, profile_id: u32 },
    Stop { test_id: i64 },
    Status,
    Screen(ScreenEvent),
    Signal(SignalStrength),
    Gps(GpsStatusEvent),
    Quit,
}

impl Command {
    /// `None` for blank or unrecognised lines.
    pub fn parse(line: &str) -> Option<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let lower: Vec<String> = words.iter().map(|w| w.to_ascii_lowercase()).collect();
        let lower: Vec<&str> = lower.iter().map(String::as_str).collect();

        match lower.as_slice() {
            ["start", test_id, profile_id] => Some(Command::Start {
                test_id: test_id.parse().ok()?,
                profile_id: profile_id.parse().ok()?,
            }),
            ["stop", test_id] => Some(Command::Stop {
                test_id: test_id.parse().ok()?,
            }),
            ["status"] => Some(Command::Status),
            ["screen", "on"] => Some(Command::Screen(ScreenEvent::On)),
            ["screen", "off"] => Some(Command::Screen(ScreenEvent::Off)),
            ["signal", "gsm", asu] => Some(Command::Signal(SignalStrength::gsm(asu.parse().ok()?))),
            ["signal", "cdma", cdma, evdo] => Some(Command::Signal(SignalStrength::cdma(
                cdma.parse().ok()?,
                evdo.parse().ok()?,
            ))),
            ["gps", code] => Some(Command::Gps(GpsStatusEvent {
                code: code.parse().ok()?,
            })),
            ["quit"] | ["exit"] => Some(Command::Quit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_commands() {
        assert_eq!(
            Command::parse("start 12 2"),
            Some(Command::Start { test_id: 12, profile_id: 2 })
        );
        assert_eq!(Command::parse("  STOP 12 "), Some(Command::Stop { test_id: 12 }));
        assert_eq!(Command::parse("status"), Some(Command::Status));
        assert_eq!(Command::parse("quit"), Some(Command::Quit));
    }

    #[test]
    fn test_event_commands() {
        assert_eq!(Command::parse("screen off"), Some(Command::Screen(ScreenEvent::Off)));
        assert_eq!(
            Command::parse("signal gsm 14"),
            Some(Command::Signal(SignalStrength::gsm(14)))
        );
        assert_eq!(
            Command::parse("signal cdma -90 -1"),
            Some(Command::Signal(SignalStrength::cdma(-90, -1)))
        );
        assert_eq!(Command::parse("gps 1"), Some(Command::Gps(GpsStatusEvent { code: 1 })));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("start twelve 2"), None);
        assert_eq!(Command::parse("start 12"), None);
        assert_eq!(Command::parse("start 12 -1"), None);
        assert_eq!(Command::parse("dance"), None);
    }
}
