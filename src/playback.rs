//! Shared "currently playing" marker and the seam to whatever actually
//! produces sound.
//!
//! The marker is advisory. A source that starts playing publishes its id;
//! every other source that notices a different id is expected to stop. Nothing
//! enforces it: two sources that start in the same tick race and the last
//! write wins.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info};

#[derive(Default)]
struct MarkerState {
    current: Option<String>,
    subscribers: Vec<Sender<Option<String>>>,
}

/// Cloneable handle to the session-wide playback marker. Clones share the
/// same value.
#[derive(Clone, Default)]
pub struct PlaybackMarker {
    inner: Arc<Mutex<MarkerState>>,
}

impl PlaybackMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the source currently considered active.
    pub fn current(&self) -> Option<String> {
        self.lock().current.clone()
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.lock().current.as_deref() == Some(id)
    }

    /// Publish a new value and notify subscribers. `None` means nothing is
    /// active.
    pub fn set(&self, id: Option<String>) {
        let mut state = self.lock();
        if state.current == id {
            return;
        }
        debug!(previous = ?state.current, next = ?id, "playback marker changed");
        state.current = id.clone();
        state
            .subscribers
            .retain(|subscriber| subscriber.send(id.clone()).is_ok());
    }

    pub fn clear(&self) {
        self.set(None);
    }

    /// Receive every subsequent change of the marker. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> Receiver<Option<String>> {
        let (tx, rx) = unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    fn lock(&self) -> MutexGuard<'_, MarkerState> {
        // A poisoned marker still holds a usable Option<String>.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Something able to play an audio URL.
pub trait AudioSink {
    fn play(&mut self, url: &str) -> Result<()>;
    fn stop(&mut self);
}

/// Hands the URL to the operating system's default handler. There is no way
/// to stop an external player, so `stop` only forgets the URL.
#[derive(Default)]
pub struct SystemPlayer {
    playing: Option<String>,
}

impl SystemPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }
}

impl AudioSink for SystemPlayer {
    fn play(&mut self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("failed to open {url}"))?;
        info!(url, "handed audio to system player");
        self.playing = Some(url.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = None;
    }
}

/// One audio-producing widget's view of the marker.
pub struct PlaybackSession {
    marker: PlaybackMarker,
    source_id: Option<String>,
    changes: Receiver<Option<String>>,
}

impl PlaybackSession {
    pub fn new(marker: PlaybackMarker) -> Self {
        let changes = marker.subscribe();
        Self {
            marker,
            source_id: None,
            changes,
        }
    }

    /// Stop whatever the sink was doing, play `url` and claim the marker as
    /// `source_id`. The marker is left untouched when playback fails.
    pub fn start(&mut self, sink: &mut dyn AudioSink, source_id: String, url: &str) -> Result<()> {
        sink.stop();
        self.source_id = None;
        sink.play(url)?;
        self.marker.set(Some(source_id.clone()));
        self.source_id = Some(source_id);
        Ok(())
    }

    /// Stop the sink and release the marker if it still names this session.
    pub fn stop(&mut self, sink: &mut dyn AudioSink) {
        sink.stop();
        if let Some(id) = self.source_id.take() {
            if self.marker.is_current(&id) {
                self.marker.clear();
            }
        }
    }

    /// Id this session is playing, if any.
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn is_playing(&self, source_id: &str) -> bool {
        self.source_id.as_deref() == Some(source_id) && self.marker.is_current(source_id)
    }

    /// Drain pending marker changes and report whether another source took
    /// over, in which case a well-behaved widget pauses itself.
    pub fn should_pause(&self) -> bool {
        while self.changes.try_recv().is_ok() {}
        match (&self.source_id, self.marker.current()) {
            (Some(own), Some(current)) => *own != current,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Apply [`Self::should_pause`]: stop the sink and forget the source id.
    pub fn yield_if_superseded(&mut self, sink: &mut dyn AudioSink) -> bool {
        if self.should_pause() {
            sink.stop();
            self.source_id = None;
            true
        } else {
            false
        }
    }
}

/// A sink and the session that drives it. The detail view owns one per
/// widget that makes sound.
pub struct AudioChannel {
    sink: Box<dyn AudioSink>,
    session: PlaybackSession,
}

impl AudioChannel {
    pub fn new(sink: Box<dyn AudioSink>, marker: PlaybackMarker) -> Self {
        Self {
            sink,
            session: PlaybackSession::new(marker),
        }
    }

    pub fn start(&mut self, source_id: String, url: &str) -> Result<()> {
        self.session.start(self.sink.as_mut(), source_id, url)
    }

    pub fn stop(&mut self) {
        self.session.stop(self.sink.as_mut());
    }

    pub fn yield_if_superseded(&mut self) -> bool {
        self.session.yield_if_superseded(self.sink.as_mut())
    }

    pub fn source_id(&self) -> Option<&str> {
        self.session.source_id()
    }

    pub fn is_playing(&self, source_id: &str) -> bool {
        self.session.is_playing(source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        played: Vec<String>,
        stops: usize,
        fail: bool,
    }

    impl AudioSink for RecordingSink {
        fn play(&mut self, url: &str) -> Result<()> {
            if self.fail {
                anyhow::bail!("no audio device");
            }
            self.played.push(url.to_string());
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    #[test]
    fn clones_share_one_value() {
        let marker = PlaybackMarker::new();
        let other = marker.clone();
        marker.set(Some("a".into()));
        assert_eq!(other.current().as_deref(), Some("a"));
        other.clear();
        assert_eq!(marker.current(), None);
    }

    #[test]
    fn subscribers_see_changes_but_not_repeats() {
        let marker = PlaybackMarker::new();
        let rx = marker.subscribe();
        marker.set(Some("a".into()));
        marker.set(Some("a".into()));
        marker.set(None);
        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(seen, vec![Some("a".to_string()), None]);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let marker = PlaybackMarker::new();
        drop(marker.subscribe());
        marker.set(Some("a".into()));
        assert!(marker.inner.lock().unwrap().subscribers.is_empty());
    }

    #[test]
    fn second_session_supersedes_the_first() {
        let marker = PlaybackMarker::new();
        let mut surahs = PlaybackSession::new(marker.clone());
        let mut prayer = PlaybackSession::new(marker.clone());
        let mut sink = RecordingSink::default();

        surahs
            .start(&mut sink, "surah-1-2".into(), "https://x/002.mp3")
            .unwrap();
        assert!(surahs.is_playing("surah-1-2"));
        assert!(!surahs.should_pause());

        prayer
            .start(&mut sink, "prayer-p".into(), "https://x/doaa.mp3")
            .unwrap();
        assert!(surahs.should_pause());
        assert!(surahs.yield_if_superseded(&mut sink));
        assert_eq!(surahs.source_id(), None);
        assert_eq!(marker.current().as_deref(), Some("prayer-p"));
    }

    #[test]
    fn starting_a_radio_makes_the_surah_channel_yield() {
        let marker = PlaybackMarker::new();
        let mut surahs = AudioChannel::new(Box::new(RecordingSink::default()), marker.clone());
        let mut radio = AudioChannel::new(Box::new(RecordingSink::default()), marker.clone());

        surahs.start("surah-1-2".into(), "https://x/002.mp3").unwrap();
        radio.start("cairo".into(), "https://stream/cairo").unwrap();

        assert!(surahs.yield_if_superseded());
        assert_eq!(surahs.source_id(), None);
        assert!(!radio.yield_if_superseded());
        assert!(radio.is_playing("cairo"));

        radio.stop();
        assert_eq!(marker.current(), None);
    }

    #[test]
    fn stopping_only_clears_own_marker() {
        let marker = PlaybackMarker::new();
        let mut session = PlaybackSession::new(marker.clone());
        let mut sink = RecordingSink::default();

        session.start(&mut sink, "mine".into(), "u").unwrap();
        marker.set(Some("theirs".into()));
        session.stop(&mut sink);
        assert_eq!(marker.current().as_deref(), Some("theirs"));

        session.start(&mut sink, "mine".into(), "u").unwrap();
        session.stop(&mut sink);
        assert_eq!(marker.current(), None);
    }

    #[test]
    fn failed_play_leaves_marker_alone() {
        let marker = PlaybackMarker::new();
        marker.set(Some("other".into()));
        let mut session = PlaybackSession::new(marker.clone());
        let mut sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };

        assert!(session.start(&mut sink, "mine".into(), "u").is_err());
        assert_eq!(marker.current().as_deref(), Some("other"));
        assert_eq!(session.source_id(), None);
    }
}
