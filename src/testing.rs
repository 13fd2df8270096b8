//! In-memory collaborators for engine and presence tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId,
    MessageId as DiscordMessageId
};
use tokio::sync::Semaphore;
use crate::{
    engine::PlaybackEngine,
    error::{MusicError, MusicResult},
    model::{player::NowPlayingMessage, track::Track},
    notify::{NowPlayingCard, Reporter},
    presence::VoiceRoster,
    radio::RadioStore,
    resolver::Resolver,
    sink::{AudioSink, FinishNotifier, SinkStatus},
};

pub const GUILD: DiscordGuildId = DiscordGuildId::new(1);
pub const VOICE: DiscordChannelId = DiscordChannelId::new(10);
pub const TEXT: DiscordChannelId = DiscordChannelId::new(20);
pub const DEFAULT_TEXT: DiscordChannelId = DiscordChannelId::new(21);

pub fn track(name: &str) -> Track {
    let slug = name.to_lowercase().replace(' ', "-");

    Track::new(
        name,
        format!("https://www.youtube.com/watch?v={}", slug),
        format!("https://stream.test/{}", slug),
    )
}

/// Same media as `track` with a newly issued stream url.
pub fn fresh(track: Track) -> Track {
    let stream_url = format!("{}?fresh", track.stream_url);
    Track { stream_url, ..track }
}

/// Polls `check` until it holds, panicking after a couple of seconds.
pub async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    panic!("condition never became true");
}

/// Lets spawned completion handling run out for `GUILD`.
pub async fn settle(harness: &Harness) {
    tokio::time::sleep(Duration::from_millis(20)).await;
    eventually(|| !harness.engine.player(GUILD).is_advancing()).await;
}

#[derive(Default)]
pub struct FakeResolver {
    tracks: Mutex<HashMap<String, Track>>,
    related: Mutex<HashMap<String, Track>>,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeResolver {
    pub fn add(&self, query: &str, track: Track) {
        self.tracks.lock().insert(query.to_string(), track);
    }

    pub fn relate(&self, page_url: &str, track: Track) {
        self.related.lock().insert(page_url.to_string(), track);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every `resolve` wait for a permit on the returned semaphore.
    pub fn gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve(&self, query: &str) -> MusicResult<Track> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }

        self.tracks
            .lock()
            .get(query)
            .cloned()
            .ok_or_else(|| MusicError::Resolution(query.to_string()))
    }

    async fn resolve_related(&self, page_url: &str) -> Option<Track> {
        self.related.lock().get(page_url).cloned()
    }
}

#[derive(Default)]
struct SinkSlot {
    status: Option<SinkStatus>,
    channel: Option<DiscordChannelId>,
    notifier: Option<FinishNotifier>,
    started: Vec<String>,
    finished: usize,
    connects: Vec<DiscordChannelId>,
}

#[derive(Default)]
pub struct FakeSink {
    slots: Mutex<HashMap<DiscordGuildId, SinkSlot>>,
    fail_next_play: AtomicBool,
    fail_next_stop: AtomicBool,
}

impl FakeSink {
    pub fn started(&self, guild_id: DiscordGuildId) -> Vec<String> {
        self.slots.lock().get(&guild_id).map(|s| s.started.clone()).unwrap_or_default()
    }

    /// How many tracks fired their completion.
    pub fn finished(&self, guild_id: DiscordGuildId) -> usize {
        self.slots.lock().get(&guild_id).map(|s| s.finished).unwrap_or_default()
    }

    pub fn connects(&self, guild_id: DiscordGuildId) -> Vec<DiscordChannelId> {
        self.slots.lock().get(&guild_id).map(|s| s.connects.clone()).unwrap_or_default()
    }

    pub fn fail_next_play(&self) {
        self.fail_next_play.store(true, Ordering::SeqCst);
    }

    /// The next `stop` errors and leaves the track playing.
    pub fn fail_next_stop(&self) {
        self.fail_next_stop.store(true, Ordering::SeqCst);
    }

    /// Ends the current track as if it played to the end.
    pub fn finish(&self, guild_id: DiscordGuildId) {
        self.end(guild_id, SinkStatus::Idle, None);
    }

    pub fn fail_current(&self, guild_id: DiscordGuildId, why: &str) {
        self.end(guild_id, SinkStatus::Idle, Some(why.to_string()));
    }

    fn end(&self, guild_id: DiscordGuildId, status: SinkStatus, error: Option<String>) {
        let notifier = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(guild_id).or_default();

            slot.status = Some(status);
            let notifier = slot.notifier.take();
            if notifier.is_some() {
                slot.finished += 1;
            }
            notifier
        };

        if let Some(notifier) = notifier {
            notifier.finished(error);
        }
    }
}

#[async_trait]
impl AudioSink for FakeSink {
    async fn status(&self, guild_id: DiscordGuildId) -> SinkStatus {
        self.slots
            .lock()
            .get(&guild_id)
            .and_then(|s| s.status)
            .unwrap_or(SinkStatus::Disconnected)
    }

    async fn current_channel(&self, guild_id: DiscordGuildId) -> Option<DiscordChannelId> {
        self.slots.lock().get(&guild_id).and_then(|s| s.channel)
    }

    async fn connect(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) -> MusicResult<()> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(guild_id).or_default();

        slot.connects.push(channel_id);
        slot.channel = Some(channel_id);
        if matches!(slot.status, None | Some(SinkStatus::Disconnected)) {
            slot.status = Some(SinkStatus::Idle);
        }

        Ok(())
    }

    async fn play(&self, guild_id: DiscordGuildId, track: &Track, notifier: FinishNotifier) -> MusicResult<()> {
        if self.fail_next_play.swap(false, Ordering::SeqCst) {
            return Err(MusicError::Sink("stream refused".to_string()));
        }

        let mut slots = self.slots.lock();
        let slot = slots.entry(guild_id).or_default();

        if matches!(slot.status, None | Some(SinkStatus::Disconnected)) {
            return Err(MusicError::NotConnected);
        }

        slot.status = Some(SinkStatus::Playing);
        slot.started.push(track.stream_url.clone());
        slot.notifier = Some(notifier);

        Ok(())
    }

    async fn pause(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        if let Some(slot) = self.slots.lock().get_mut(&guild_id) {
            slot.status = Some(SinkStatus::Paused);
        }
        Ok(())
    }

    async fn resume(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        if let Some(slot) = self.slots.lock().get_mut(&guild_id) {
            slot.status = Some(SinkStatus::Playing);
        }
        Ok(())
    }

    async fn stop(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        if self.fail_next_stop.swap(false, Ordering::SeqCst) {
            return Err(MusicError::Sink("driver busy".to_string()));
        }

        self.end(guild_id, SinkStatus::Idle, None);
        Ok(())
    }

    async fn disconnect(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        self.end(guild_id, SinkStatus::Disconnected, None);

        if let Some(slot) = self.slots.lock().get_mut(&guild_id) {
            slot.channel = None;
        }
        Ok(())
    }
}

pub struct FakeReporter {
    posted: Mutex<Vec<String>>,
    retired: Mutex<Vec<NowPlayingMessage>>,
    cleared: Mutex<Vec<NowPlayingMessage>>,
    fail: AtomicBool,
    next_id: AtomicU64,
}

impl Default for FakeReporter {
    fn default() -> Self {
        Self {
            posted: Mutex::new(Vec::new()),
            retired: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }
}

impl FakeReporter {
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Titles of every card posted so far.
    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().clone()
    }

    pub fn retired(&self) -> Vec<NowPlayingMessage> {
        self.retired.lock().clone()
    }

    pub fn cleared(&self) -> Vec<NowPlayingMessage> {
        self.cleared.lock().clone()
    }
}

#[async_trait]
impl Reporter for FakeReporter {
    async fn now_playing(&self, _guild_id: DiscordGuildId, channel_id: DiscordChannelId, card: NowPlayingCard<'_>) -> MusicResult<NowPlayingMessage> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MusicError::Discord(serenity::Error::Other("missing access")));
        }

        self.posted.lock().push(card.track.title.clone());

        Ok(NowPlayingMessage {
            channel_id,
            message_id: DiscordMessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
        })
    }

    async fn retire(&self, message: NowPlayingMessage) -> MusicResult<()> {
        self.retired.lock().push(message);
        Ok(())
    }

    async fn clear_controls(&self, message: NowPlayingMessage) -> MusicResult<()> {
        self.cleared.lock().push(message);
        Ok(())
    }

    async fn default_channel(&self, _guild_id: DiscordGuildId) -> Option<DiscordChannelId> {
        Some(DEFAULT_TEXT)
    }
}

#[derive(Default)]
pub struct MemoryRadio {
    lists: Mutex<HashMap<DiscordGuildId, Vec<String>>>,
}

impl MemoryRadio {
    pub fn add(&self, guild_id: DiscordGuildId, query: &str) {
        self.lists.lock().entry(guild_id).or_default().push(query.to_string());
    }
}

#[async_trait]
impl RadioStore for MemoryRadio {
    async fn append(&self, guild_id: DiscordGuildId, query: &str) -> MusicResult<i64> {
        let mut lists = self.lists.lock();
        let list = lists.entry(guild_id).or_default();

        list.push(query.to_string());
        Ok(list.len() as i64 - 1)
    }

    async fn list(&self, guild_id: DiscordGuildId) -> MusicResult<Vec<String>> {
        Ok(self.lists.lock().get(&guild_id).cloned().unwrap_or_default())
    }

    async fn clear(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        self.lists.lock().remove(&guild_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRoster {
    humans: Mutex<HashMap<(DiscordGuildId, DiscordChannelId), usize>>,
}

impl FakeRoster {
    pub fn set(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId, humans: usize) {
        self.humans.lock().insert((guild_id, channel_id), humans);
    }
}

impl VoiceRoster for FakeRoster {
    fn human_count(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) -> usize {
        self.humans.lock().get(&(guild_id, channel_id)).copied().unwrap_or_default()
    }
}

/// An engine wired to fakes, with handles on every fake.
pub struct Harness {
    pub engine: Arc<PlaybackEngine>,
    pub sink: Arc<FakeSink>,
    pub resolver: Arc<FakeResolver>,
    pub reporter: Arc<FakeReporter>,
    pub radio: Arc<MemoryRadio>,
}

impl Harness {
    pub fn new() -> Self {
        let sink = Arc::new(FakeSink::default());
        let resolver = Arc::new(FakeResolver::default());
        let reporter = Arc::new(FakeReporter::default());
        let radio = Arc::new(MemoryRadio::default());

        let mut builder = PlaybackEngine::builder(sink.clone(), radio.clone(), reporter.clone());
        builder.set_resolver(resolver.clone());

        Self {
            engine: builder.build(),
            sink,
            resolver,
            reporter,
            radio,
        }
    }

    pub async fn connect(&self) {
        self.engine.join(GUILD, VOICE).await.unwrap();
    }
}
