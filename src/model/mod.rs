pub mod events;
pub mod player;
pub mod track;

pub use events::PlayerEvent;
pub use player::{GuildPlayer, GuildPlayerState, NowPlayingMessage, PlaybackState, QueueSnapshot};
pub use track::Track;
