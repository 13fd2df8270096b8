use std::sync::Arc;
use dashmap::{DashMap, DashSet};
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use crate::{
    builder::EngineBuilder,
    error::MusicResult,
    events,
    model::{
        player::{GuildPlayer, PlaybackState, QueueSnapshot},
        track::Track,
    },
    notify::{ControlsState, NowPlayingCard, Reporter},
    radio::{self, RadioStore},
    resolver::Resolver,
    sink::{AudioSink, FinishNotifier, SinkStatus},
    types::EventSender,
};

/// A track accepted into a guild's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    pub track: Track,
    /// 1-based position in the queue at the time it was added.
    pub position: usize,
}

/// How an advance attempt ended.
enum Advance {
    Done,
    /// The session was reset underneath it, nothing it resolved may be used.
    Overtaken,
}

/// Per guild playback state machine.
///
/// Guild state is created lazily on first access and lives for the whole process.
pub struct PlaybackEngine {
    players: DashMap<DiscordGuildId, Arc<GuildPlayer>>,
    always_on: DashSet<DiscordGuildId>,
    resolver: Arc<dyn Resolver>,
    radio: Arc<dyn RadioStore>,
    sink: Arc<dyn AudioSink>,
    reporter: Arc<dyn Reporter>,
    events: EventSender,
    radio_batch: usize,
}

impl PlaybackEngine {
    pub fn builder(sink: Arc<dyn AudioSink>, radio: Arc<dyn RadioStore>, reporter: Arc<dyn Reporter>) -> EngineBuilder {
        EngineBuilder::new(sink, radio, reporter)
    }

    pub(crate) fn new(builder: EngineBuilder) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let engine = Arc::new(Self {
            players: DashMap::new(),
            always_on: DashSet::new(),
            resolver: builder.resolver,
            radio: builder.radio,
            sink: builder.sink,
            reporter: builder.reporter,
            events: tx,
            radio_batch: builder.radio_batch,
        });

        events::listen(Arc::downgrade(&engine), rx);

        engine
    }

    /// Returns the guild's player, creating an empty one on first use.
    pub fn player(&self, guild_id: DiscordGuildId) -> Arc<GuildPlayer> {
        self.players
            .entry(guild_id)
            .or_insert_with(|| Arc::new(GuildPlayer::new(guild_id)))
            .value()
            .clone()
    }

    /// Decides what plays next and starts it.
    ///
    /// Only one advance runs per guild at a time, a call made while another is
    /// in flight returns immediately. Does nothing unless the sink is connected and idle.
    pub async fn advance(&self, guild_id: DiscordGuildId) {
        let player = self.player(guild_id);

        let _guard = match player.try_begin_advance() {
            Some(guard) => guard,
            None => {
                debug!("Advance already running on guild {}", guild_id);
                return;
            }
        };

        loop {
            let status = self.sink.status(guild_id).await;
            if status != SinkStatus::Idle {
                debug!("Not advancing guild {}, sink is {:?}", guild_id, status);
                return;
            }

            match self.advance_inner(&player).await {
                Ok(Advance::Done) => return,
                Ok(Advance::Overtaken) => debug!("Guild {} was reset mid advance, starting over", guild_id),
                Err(why) => {
                    warn!("Failed to start the next track on guild {}: {}", guild_id, why);
                    return;
                }
            }
        }
    }

    async fn advance_inner(&self, player: &GuildPlayer) -> MusicResult<Advance> {
        let guild_id = player.guild_id();

        let (session, queue_empty, seed) = {
            let mut state = player.state();

            if state.looping {
                if let Some(track) = state.current_track.clone() {
                    state.queue.push_front(track);
                }
            }

            (state.session, state.queue.is_empty(), state.autoplay_seed())
        };

        if queue_empty {
            let added = match self.fill_from_radio(player, session).await {
                Some(added) => added,
                None => return Ok(Advance::Overtaken),
            };

            if added == 0 && player.state().queue.is_empty() {
                if let Some(seed) = seed {
                    match self.resolver.resolve_related(&seed.page_url).await {
                        Some(related) => {
                            let mut state = player.state();
                            if state.session != session {
                                return Ok(Advance::Overtaken);
                            }

                            info!("Autoplay picked {} on guild {}", related.title, guild_id);
                            state.queue.push_back(related);
                        },
                        None => debug!("Autoplay found nothing related to {} on guild {}", seed.page_url, guild_id),
                    }
                }
            }
        }

        let (next, replay) = {
            let mut state = player.state();
            if state.session != session {
                return Ok(Advance::Overtaken);
            }

            let next = match state.queue.pop_front() {
                Some(next) => next,
                None => {
                    // The finished track only lives on as an autoplay seed.
                    if let Some(finished) = state.current_track.take() {
                        state.last_track = Some(finished);
                    }

                    debug!("Nothing left to play on guild {}", guild_id);
                    return Ok(Advance::Done);
                }
            };

            let replay = state.current_track.as_ref() == Some(&next);
            (next, replay)
        };

        // A replayed track already spent its stream url.
        let track = if replay {
            match self.resolver.resolve(&next.page_url).await {
                Ok(fresh) => fresh,
                Err(why) => {
                    debug!("Could not refresh {} on guild {}, reusing its stream: {}", next.page_url, guild_id, why);
                    next
                }
            }
        } else {
            next
        };

        {
            let mut state = player.state();
            if state.session != session {
                return Ok(Advance::Overtaken);
            }

            state.current_track = Some(track.clone());
            state.last_track = None;
        }

        let notifier = FinishNotifier::new(guild_id, self.events.clone());

        if let Err(why) = self.sink.play(guild_id, &track, notifier).await {
            player.state().current_track = None;
            return Err(why);
        }

        info!("Now playing {} on guild {}", track.title, guild_id);

        self.announce(player, &track).await;

        Ok(Advance::Done)
    }

    /// Pulls up to `radio_batch` radio queries into the queue, returning how many resolved.
    /// `None` once `session` is no longer the guild's current one.
    async fn fill_from_radio(&self, player: &GuildPlayer, session: u64) -> Option<usize> {
        let guild_id = player.guild_id();

        let list = match self.radio.list(guild_id).await {
            Ok(list) => list,
            Err(why) => {
                warn!("Failed loading radio list for guild {}: {}", guild_id, why);
                return Some(0);
            }
        };

        let mut added = 0;

        for _ in 0..self.radio_batch {
            let query = match radio::rotate(&mut player.state().radio_cursor, &list) {
                Some(query) => query,
                None => break,
            };

            match self.resolver.resolve(&query).await {
                Ok(track) => {
                    let mut state = player.state();
                    if state.session != session {
                        return None;
                    }

                    state.queue.push_back(track);
                    added += 1;
                },
                Err(why) => debug!("Skipping radio entry `{}` on guild {}: {}", query, guild_id, why),
            }
        }

        Some(added)
    }

    /// Replaces the previous "now playing" card. Failures only get logged.
    async fn announce(&self, player: &GuildPlayer, track: &Track) {
        let guild_id = player.guild_id();

        let (channel, previous, looping, autoplay) = {
            let mut state = player.state();
            (state.text_channel, state.now_playing.take(), state.looping, state.autoplay)
        };

        if let Some(previous) = previous {
            if let Err(why) = self.reporter.retire(previous).await {
                debug!("Failed deleting old now playing message on guild {}: {}", guild_id, why);
            }
        }

        let channel = match channel {
            Some(channel) => channel,
            None => return,
        };

        let card = NowPlayingCard {
            track,
            looping,
            autoplay,
        };

        match self.reporter.now_playing(guild_id, channel, card).await {
            Ok(message) => player.state().now_playing = Some(message),
            Err(why) => warn!("Failed sending now playing message on guild {}: {}", guild_id, why),
        }
    }

    pub(crate) async fn track_finished(&self, guild_id: DiscordGuildId, error: Option<String>) {
        if let Some(why) = error {
            warn!("Playback error on guild {}, moving on: {}", guild_id, why);
        }

        self.advance(guild_id).await;
    }

    /// Defaults the status channel if none is bound yet, then advances an idle sink.
    pub async fn start_if_idle(&self, guild_id: DiscordGuildId) {
        if self.sink.status(guild_id).await != SinkStatus::Idle {
            return;
        }

        let player = self.player(guild_id);
        if player.is_advancing() {
            return;
        }

        let unbound = player.state().text_channel.is_none();
        if unbound {
            if let Some(channel) = self.reporter.default_channel(guild_id).await {
                player.state().text_channel.get_or_insert(channel);
            }
        }

        self.advance(guild_id).await;
    }

    pub async fn join(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) -> MusicResult<()> {
        self.sink.connect(guild_id, channel_id).await
    }

    /// Leaves voice, keeping the queue and toggles.
    ///
    /// Whatever was playing is dropped to `last_track` and only seeds autoplay later on.
    pub async fn disconnect(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        let player = self.player(guild_id);
        self.set_aside_current(&player);

        let result = self.sink.disconnect(guild_id).await;
        if result.is_err() {
            self.restore_current(&player);
        }

        result
    }

    pub async fn voice_channel(&self, guild_id: DiscordGuildId) -> Option<DiscordChannelId> {
        self.sink.current_channel(guild_id).await
    }

    pub async fn sink_status(&self, guild_id: DiscordGuildId) -> SinkStatus {
        self.sink.status(guild_id).await
    }

    pub fn bind_text_channel(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) {
        self.player(guild_id).state().text_channel = Some(channel_id);
    }

    /// Appends to the queue tail. Follow with `advance` if the sink sits idle.
    pub fn enqueue(&self, guild_id: DiscordGuildId, track: Track) -> PlayOutcome {
        let player = self.player(guild_id);
        let mut state = player.state();

        state.queue.push_back(track.clone());

        PlayOutcome {
            track,
            position: state.queue.len(),
        }
    }

    /// Resolves `query`, queues it and starts playback if the sink is idle.
    pub async fn play(&self, guild_id: DiscordGuildId, query: &str) -> MusicResult<PlayOutcome> {
        let track = self.resolver.resolve(query).await?;

        let enqueued = self.enqueue(guild_id, track);

        if self.sink.status(guild_id).await == SinkStatus::Idle {
            self.advance(guild_id).await;
        }

        Ok(enqueued)
    }

    /// Pauses a playing sink, `false` when nothing was playing.
    pub async fn pause(&self, guild_id: DiscordGuildId) -> MusicResult<bool> {
        if self.sink.status(guild_id).await != SinkStatus::Playing {
            return Ok(false);
        }

        self.sink.pause(guild_id).await?;
        Ok(true)
    }

    /// Resumes a paused sink, `false` when nothing was paused.
    pub async fn resume(&self, guild_id: DiscordGuildId) -> MusicResult<bool> {
        if self.sink.status(guild_id).await != SinkStatus::Paused {
            return Ok(false);
        }

        self.sink.resume(guild_id).await?;
        Ok(true)
    }

    /// Skips the current track. It never comes back through loop.
    pub async fn skip(&self, guild_id: DiscordGuildId) -> MusicResult<bool> {
        if !self.sink.status(guild_id).await.is_active() {
            return Ok(false);
        }

        // Cleared before the sink stops so the completion can't requeue it.
        let player = self.player(guild_id);
        self.set_aside_current(&player);

        if let Err(why) = self.sink.stop(guild_id).await {
            self.restore_current(&player);
            return Err(why);
        }

        Ok(true)
    }

    fn set_aside_current(&self, player: &GuildPlayer) {
        let mut state = player.state();

        if let Some(current) = state.current_track.take() {
            state.last_track = Some(current);
        }
    }

    /// The sink refused to let go, so the set aside track is still the one playing.
    fn restore_current(&self, player: &GuildPlayer) {
        let mut state = player.state();

        if state.current_track.is_none() {
            state.current_track = state.last_track.take();
        }
    }

    /// Ends the listening session: empties the queue, turns loop off and leaves voice.
    pub async fn stop(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        let message = {
            let player = self.player(guild_id);
            let mut state = player.state();
            state.reset();
            state.now_playing.take()
        };

        let result = self.sink.disconnect(guild_id).await;

        if let Some(message) = message {
            if let Err(why) = self.reporter.clear_controls(message).await {
                debug!("Failed clearing controls on guild {}: {}", guild_id, why);
            }
        }

        result
    }

    /// Empties the queue, returning how many tracks were dropped.
    pub fn clear(&self, guild_id: DiscordGuildId) -> usize {
        let player = self.player(guild_id);
        let mut state = player.state();

        let dropped = state.queue.len();
        state.queue.clear();
        dropped
    }

    pub fn toggle_loop(&self, guild_id: DiscordGuildId) -> bool {
        let player = self.player(guild_id);
        let mut state = player.state();

        state.looping = !state.looping;
        state.looping
    }

    pub fn toggle_autoplay(&self, guild_id: DiscordGuildId) -> bool {
        let player = self.player(guild_id);
        let mut state = player.state();

        state.autoplay = !state.autoplay;
        state.autoplay
    }

    /// Always-on guilds keep playing when their voice channel empties. Not persisted.
    pub fn set_always_on(&self, guild_id: DiscordGuildId, on: bool) {
        if on {
            self.always_on.insert(guild_id);
        } else {
            self.always_on.remove(&guild_id);
        }
    }

    pub fn is_always_on(&self, guild_id: DiscordGuildId) -> bool {
        self.always_on.contains(&guild_id)
    }

    pub fn queue_list(&self, guild_id: DiscordGuildId) -> QueueSnapshot {
        self.player(guild_id).state().snapshot()
    }

    pub async fn playback_state(&self, guild_id: DiscordGuildId) -> PlaybackState {
        if self.player(guild_id).is_advancing() {
            return PlaybackState::TransitioningNext;
        }

        match self.sink.status(guild_id).await {
            SinkStatus::Playing => PlaybackState::Playing,
            SinkStatus::Paused => PlaybackState::Paused,
            SinkStatus::Idle | SinkStatus::Disconnected => PlaybackState::Idle,
        }
    }

    pub async fn controls_state(&self, guild_id: DiscordGuildId) -> ControlsState {
        let paused = self.sink.status(guild_id).await == SinkStatus::Paused;

        let player = self.player(guild_id);
        let state = player.state();

        ControlsState {
            paused,
            looping: state.looping,
            autoplay: state.autoplay,
        }
    }

    pub async fn radio_add(&self, guild_id: DiscordGuildId, query: &str) -> MusicResult<i64> {
        let index = self.radio.append(guild_id, query).await?;

        info!("Radio entry {} added on guild {}", index, guild_id);
        Ok(index)
    }

    pub async fn radio_list(&self, guild_id: DiscordGuildId) -> MusicResult<Vec<String>> {
        self.radio.list(guild_id).await
    }

    /// Wipes the radio list and rewinds the guild's cursor.
    pub async fn radio_clear(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        self.radio.clear(guild_id).await?;

        self.player(guild_id).state().radio_cursor = 0;
        Ok(())
    }

    /// Next radio query in round robin order, advancing the cursor.
    pub async fn radio_next(&self, guild_id: DiscordGuildId) -> MusicResult<Option<String>> {
        let list = self.radio.list(guild_id).await?;

        let player = self.player(guild_id);
        let mut state = player.state();

        Ok(radio::rotate(&mut state.radio_cursor, &list))
    }
}

impl typemap_rev::TypeMapKey for PlaybackEngine {
    type Value = Arc<PlaybackEngine>;
}
