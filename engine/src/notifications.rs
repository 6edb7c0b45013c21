//! User-facing status, discovery announcements and sound cues.
//!
//! The engine never renders anything itself. The rendering collaborator
//! polls [`Status`] each frame and drains [`Cue`]s for the sound layer.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

pub const ANALYZING_TITLE: &str = "Analyzing...";
pub const ANALYZING_SUBTITLE: &str = "The universe is thinking";
pub const DISCOVERY_TITLE: &str = "New Discovery!";

/// How long a discovery announcement stays visible by default.
pub const DEFAULT_DISCOVERY_DURATION: Duration = Duration::from_secs(3);

/// Sound effects requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// An instance appeared on the surface.
    Pop,
    /// A merge produced a result.
    Success,
    /// A merge was rejected, or the surface was cleared.
    Fail,
}

/// Ordered queue of cues waiting for the sound collaborator.
///
/// Unlike status, cues are not deduplicated: two placements are two pops.
#[derive(Debug, Default)]
pub struct CueQueue {
    pending: Vec<Cue>,
}

impl CueQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cue: Cue) {
        self.pending.push(cue);
    }

    /// Take all pending cues in the order they were raised.
    pub fn take(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// A two-line banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub subtitle: String,
}

impl Notice {
    fn analyzing() -> Self {
        Self {
            title: ANALYZING_TITLE.to_string(),
            subtitle: ANALYZING_SUBTITLE.to_string(),
        }
    }
}

/// Snapshot of what the status area should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// At least one merge is waiting on the oracle.
    pub busy: bool,
    /// Number of merges waiting on the oracle.
    pub pending: usize,
    /// Banner to display, if any. A live discovery wins over "Analyzing...".
    pub notice: Option<Notice>,
}

impl Status {
    /// Short label for the busy indicator.
    #[must_use]
    pub fn label(&self) -> Option<&'static str> {
        self.busy.then_some(ANALYZING_TITLE)
    }
}

#[derive(Debug, Clone)]
struct Announcement {
    name: String,
    expires_at: Instant,
}

/// Tracks the transient discovery announcement.
#[derive(Debug)]
pub struct Announcer {
    duration: Duration,
    current: Option<Announcement>,
}

impl Announcer {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
        }
    }

    /// Announce a new kind, replacing any announcement already showing.
    pub fn announce(&mut self, name: impl Into<String>) {
        self.current = Some(Announcement {
            name: name.into(),
            expires_at: Instant::now() + self.duration,
        });
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Drop the announcement once its time is up.
    pub fn expire(&mut self, now: Instant) {
        if self
            .current
            .as_ref()
            .is_some_and(|current| now >= current.expires_at)
        {
            self.current = None;
        }
    }

    /// Name of the kind currently announced, if still live at `now`.
    #[must_use]
    pub fn active(&self, now: Instant) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|current| now < current.expires_at)
            .map(|current| current.name.as_str())
    }

    #[must_use]
    pub fn status(&self, pending: usize, now: Instant) -> Status {
        let notice = match self.active(now) {
            Some(name) => Some(Notice {
                title: DISCOVERY_TITLE.to_string(),
                subtitle: name.to_string(),
            }),
            None if pending > 0 => Some(Notice::analyzing()),
            None => None,
        };
        Status {
            busy: pending > 0,
            pending,
            notice,
        }
    }
}

/// Colors of the most recent merge results, newest last.
#[derive(Debug, Clone)]
pub struct ColorTrail {
    colors: VecDeque<String>,
}

impl ColorTrail {
    pub const CAPACITY: usize = 5;

    #[must_use]
    pub fn seeded() -> Self {
        Self {
            colors: VecDeque::from(["#ef4444".to_string(), "#3b82f6".to_string()]),
        }
    }

    pub fn push(&mut self, color: impl Into<String>) {
        self.colors.push_back(color.into());
        while self.colors.len() > Self::CAPACITY {
            self.colors.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.colors.iter().map(String::as_str)
    }
}

impl Default for ColorTrail {
    fn default() -> Self {
        Self::seeded()
    }
}
