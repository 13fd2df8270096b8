use async_trait::async_trait;
use serenity::model::id::GuildId as DiscordGuildId;
use crate::error::MusicResult;

/// How many radio entries a single refill pulls.
pub const RADIO_BATCH: usize = 3;

/// Persisted, ordered fallback queries per guild.
#[async_trait]
pub trait RadioStore: Send + Sync + 'static {
    /// Appends a query and returns its index.
    async fn append(&self, guild_id: DiscordGuildId, query: &str) -> MusicResult<i64>;

    /// Queries ordered by index ascending.
    async fn list(&self, guild_id: DiscordGuildId) -> MusicResult<Vec<String>>;

    /// Removes every entry of the guild. The caller resets the guild's cursor.
    async fn clear(&self, guild_id: DiscordGuildId) -> MusicResult<()>;
}

/// Picks `list[cursor % len]` and moves the cursor forward.
pub fn rotate(cursor: &mut usize, list: &[String]) -> Option<String> {
    if list.is_empty() {
        return None;
    }

    let query = list[*cursor % list.len()].clone();
    *cursor = cursor.wrapping_add(1);

    Some(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rotation_visits_every_entry_once_then_wraps() {
        let radio = list(&["lofi hip hop", "jazz piano", "city pop"]);
        let mut cursor = 0;

        let picked = (0..radio.len())
            .map(|_| rotate(&mut cursor, &radio).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(picked, radio);
        assert_eq!(rotate(&mut cursor, &radio).as_deref(), Some("lofi hip hop"));
        assert_eq!(cursor, 4);
    }

    #[test]
    fn rotation_on_empty_list_keeps_cursor() {
        let mut cursor = 5;

        assert!(rotate(&mut cursor, &[]).is_none());
        assert_eq!(cursor, 5);
    }

    #[test]
    fn cursor_wraps_against_current_length() {
        let mut cursor = 4;

        assert_eq!(rotate(&mut cursor, &list(&["a", "b"])).as_deref(), Some("a"));
        assert_eq!(rotate(&mut cursor, &list(&["a", "b", "c"])).as_deref(), Some("c"));
    }
}
