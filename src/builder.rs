use std::sync::Arc;
use crate::{
    engine::PlaybackEngine,
    notify::Reporter,
    radio::{RadioStore, RADIO_BATCH},
    resolver::{Resolver, YtDlpResolver},
    sink::AudioSink,
};

pub struct EngineBuilder {
    pub(crate) sink: Arc<dyn AudioSink>,
    pub(crate) radio: Arc<dyn RadioStore>,
    pub(crate) reporter: Arc<dyn Reporter>,
    pub(crate) resolver: Arc<dyn Resolver>,
    pub(crate) radio_batch: usize,
}

impl EngineBuilder {
    pub fn new(sink: Arc<dyn AudioSink>, radio: Arc<dyn RadioStore>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            sink,
            radio,
            reporter,
            resolver: Arc::new(YtDlpResolver::default()),
            radio_batch: RADIO_BATCH,
        }
    }

    pub fn set_resolver(&mut self, resolver: Arc<dyn Resolver>) -> &mut Self {
        self.resolver = resolver;
        self
    }

    /// How many radio queries one refill pulls, at least one.
    pub fn set_radio_batch(&mut self, batch: usize) -> &mut Self {
        self.radio_batch = batch.max(1);
        self
    }

    /// Builds the engine and spawns its event loop, so it needs a running tokio runtime.
    pub fn build(self) -> Arc<PlaybackEngine> {
        PlaybackEngine::new(self)
    }
}
