use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use crate::model::events::PlayerEvent;

pub type EventSender = UnboundedSender<PlayerEvent>;
pub type EventReceiver = UnboundedReceiver<PlayerEvent>;
