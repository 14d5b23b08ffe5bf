use crate::core::models::TransitionEvent;
use crate::core::notify::{NOTIFICATION_TITLE, NotificationSink, Sound, StatusText};
use std::io::{self, Write};

const BELL: &str = "\x07";

/// Renders transition events as status lines on a terminal
pub struct ConsoleSink<W: Write + Send> {
    out: W,
    sounds: bool,
    messages: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(sounds: bool, messages: bool) -> Self {
        Self::new(io::stdout(), sounds, messages)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, sounds: bool, messages: bool) -> Self {
        Self {
            out,
            sounds,
            messages,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, event: &TransitionEvent) -> io::Result<()> {
        let text = StatusText::for_event(event);
        let platform = event.platform();

        if self.sounds && text.sound.is_some() {
            write!(self.out, "{BELL}")?;
        }
        writeln!(self.out, "[{platform}] {}", text.status)?;
        if self.messages
            && let Some(popup) = &text.popup
        {
            writeln!(self.out, "[{platform}] {NOTIFICATION_TITLE}: {}", popup.text)?;
            log::debug!("{platform}: popup shown for {:?}", popup.duration);
        }
        if text.tooltip != text.status {
            writeln!(self.out, "[{platform}]   {}", text.tooltip)?;
        }
        if let Some(sound) = text.sound {
            log::debug!("{platform}: {} sound", sound_name(sound));
        }
        self.out.flush()
    }
}

impl<W: Write + Send> NotificationSink for ConsoleSink<W> {
    fn notify(&mut self, event: &TransitionEvent) {
        if let Err(e) = self.render(event) {
            log::warn!("Failed to write notification: {e}");
        }
    }
}

fn sound_name(sound: Sound) -> &'static str {
    match sound {
        Sound::Spawn => "spawn",
        Sound::Despawn => "despawn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::LocationCode;
    use crate::core::platform::Platform;
    use chrono::{Local, TimeZone};

    fn render(sink: ConsoleSink<Vec<u8>>, events: &[TransitionEvent]) -> String {
        let mut sink = sink;
        for event in events {
            sink.notify(event);
        }
        String::from_utf8(sink.into_inner()).unwrap()
    }

    fn spawn_event() -> TransitionEvent {
        TransitionEvent::Spawned {
            platform: Platform::Ps4,
            location: LocationCode(552),
            at: Some(Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_spawn_with_sounds_and_messages() {
        let output = render(ConsoleSink::new(Vec::new(), true, true), &[spawn_event()]);

        assert!(output.starts_with(BELL));
        assert!(output.contains("[PS4] Anomaly present at Rya\n"));
        assert!(output.contains("Sentient anomaly tracker: Anomaly present at Rya"));
        assert!(output.contains("Anomaly at Rya since 12:00:00"));
    }

    #[test]
    fn test_spawn_quiet_mode() {
        let output = render(ConsoleSink::new(Vec::new(), false, false), &[spawn_event()]);

        assert!(!output.contains(BELL));
        assert!(!output.contains(NOTIFICATION_TITLE));
        assert!(output.contains("[PS4] Anomaly present at Rya"));
    }

    #[test]
    fn test_connection_error_has_single_line() {
        let output = render(
            ConsoleSink::new(Vec::new(), true, true),
            &[TransitionEvent::ConnectionError {
                platform: Platform::Pc,
            }],
        );

        assert_eq!(output, "[PC] Connection error\n");
    }
}
