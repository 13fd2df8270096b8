use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, Ordering},
};
use parking_lot::{Mutex, MutexGuard};
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId,
    MessageId as DiscordMessageId
};
use super::track::Track;

/// How many queued tracks `queue_list` shows before summarising the rest.
pub const QUEUE_PAGE: usize = 10;

/// Handle to the last "now playing" message posted for a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NowPlayingMessage {
    pub channel_id: DiscordChannelId,
    pub message_id: DiscordMessageId,
}

/// Mutable per guild playback record.
#[derive(Debug)]
pub struct GuildPlayerState {
    pub queue: VecDeque<Track>,
    /// Track the sink is playing or paused on.
    pub current_track: Option<Track>,
    /// Track removed from `current_track` by a skip, kept only as an autoplay seed.
    pub last_track: Option<Track>,
    pub looping: bool,
    pub autoplay: bool,
    pub radio_cursor: usize,
    pub text_channel: Option<DiscordChannelId>,
    pub now_playing: Option<NowPlayingMessage>,
    /// Bumped by every `reset`, an advance that saw an older value has been overtaken.
    pub session: u64,
}

impl Default for GuildPlayerState {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            current_track: None,
            last_track: None,
            looping: false,
            autoplay: true,
            radio_cursor: 0,
            text_channel: None,
            now_playing: None,
            session: 0,
        }
    }
}

impl GuildPlayerState {
    /// Empties the session. Autoplay and the radio cursor survive, loop is forced off.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.current_track = None;
        self.last_track = None;
        self.looping = false;
        self.session = self.session.wrapping_add(1);
    }

    /// Seed used to look up a related track once everything else ran dry.
    pub fn autoplay_seed(&self) -> Option<Track> {
        if !self.autoplay {
            return None;
        }

        self.current_track.clone().or_else(|| self.last_track.clone())
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            head: self.queue.iter().take(QUEUE_PAGE).cloned().collect(),
            overflow: self.queue.len().saturating_sub(QUEUE_PAGE),
        }
    }
}

/// First page of the queue plus how many entries did not fit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueSnapshot {
    pub head: Vec<Track>,
    pub overflow: usize,
}

impl QueueSnapshot {
    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
    }
}

/// Conceptual state of a guild's player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    TransitioningNext,
}

/// One entry of the engine's player map.
pub struct GuildPlayer {
    guild: DiscordGuildId,
    state: Mutex<GuildPlayerState>,
    in_flight: AtomicBool,
}

impl GuildPlayer {
    pub fn new(guild: DiscordGuildId) -> Self {
        Self {
            guild,
            state: Mutex::new(GuildPlayerState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn guild_id(&self) -> DiscordGuildId {
        self.guild
    }

    /// Locks the state. The guard must be dropped before any `.await`.
    pub fn state(&self) -> MutexGuard<'_, GuildPlayerState> {
        self.state.lock()
    }

    pub fn is_advancing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims the advance slot, `None` if another advance already holds it.
    pub fn try_begin_advance(&self) -> Option<AdvanceGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AdvanceGuard { flag: &self.in_flight })
    }
}

/// Releases the advance slot when dropped, whichever way the advance exits.
pub struct AdvanceGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for AdvanceGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
