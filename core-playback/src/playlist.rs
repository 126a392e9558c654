//! # Playlists
//!
//! A playlist is an ordered set of on-page media items sharing a group name.
//! Items are UI components owned elsewhere, so the playlist keeps [`Weak`]
//! references, compares them by pointer identity and drops the dead ones.
//!
//! The "currently playing" position is never stored by the player. It is
//! recomputed from the items' `is_loaded` flags before every step.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// A playable item on the page.
pub trait PlaylistItem: Send + Sync {
    /// Whether this item's media is the one loaded in the player.
    fn is_loaded(&self) -> bool;

    /// Start this item's own load flow, which ends with it registering a
    /// backend with the player.
    fn activate(&self);

    /// Another item took over the player.
    fn release(&self);
}

#[derive(Default)]
struct Entries {
    items: Vec<Weak<dyn PlaylistItem>>,
    cursor: usize,
}

impl Entries {
    fn prune(&mut self) {
        self.items.retain(|item| item.strong_count() > 0);
        if self.cursor >= self.items.len() {
            self.cursor = 0;
        }
    }

    fn position(&self, item: &Arc<dyn PlaylistItem>) -> Option<usize> {
        let target = Arc::downgrade(item);
        self.items.iter().position(|entry| Weak::ptr_eq(entry, &target))
    }
}

pub struct Playlist {
    name: String,
    entries: Mutex<Entries>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append `item` unless this very item is already listed.
    pub fn add(&self, item: &Arc<dyn PlaylistItem>) {
        let mut entries = self.entries.lock();
        entries.prune();
        if entries.position(item).is_none() {
            entries.items.push(Arc::downgrade(item));
        }
    }

    pub fn remove(&self, item: &Arc<dyn PlaylistItem>) {
        let mut entries = self.entries.lock();
        if let Some(index) = entries.position(item) {
            entries.items.remove(index);
        }
        entries.prune();
    }

    pub fn contains(&self, item: &Arc<dyn PlaylistItem>) -> bool {
        self.entries.lock().position(item).is_some()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        entries.prune();
        entries.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cursor(&self) -> usize {
        self.entries.lock().cursor
    }

    pub fn get(&self, index: usize) -> Option<Arc<dyn PlaylistItem>> {
        self.entries.lock().items.get(index)?.upgrade()
    }

    fn live_items(&self) -> Vec<Arc<dyn PlaylistItem>> {
        let mut entries = self.entries.lock();
        entries.prune();
        entries.items.iter().filter_map(Weak::upgrade).collect()
    }

    /// Point the cursor at the first loaded item, or at 0 when none is.
    pub fn set_cursor_to_playing(&self) -> usize {
        // Items are queried without the lock held.
        let items = self.live_items();
        let cursor = items.iter().position(|item| item.is_loaded()).unwrap_or(0);
        self.entries.lock().cursor = cursor;
        cursor
    }

    /// Index after the cursor, wrapping to 0. An empty playlist yields 0.
    pub fn next_index(&self) -> usize {
        let entries = self.entries.lock();
        let len = entries.items.len();
        if len == 0 {
            return 0;
        }
        (entries.cursor + 1) % len
    }

    /// Index before the cursor, wrapping to the last item. An empty playlist
    /// yields 0.
    pub fn previous_index(&self) -> usize {
        let entries = self.entries.lock();
        match entries.items.len() {
            0 => 0,
            len if entries.cursor == 0 => len - 1,
            _ => entries.cursor - 1,
        }
    }

    pub fn playing(&self) -> Option<Arc<dyn PlaylistItem>> {
        let cursor = self.set_cursor_to_playing();
        self.get(cursor)
    }

    pub fn next(&self) -> Option<Arc<dyn PlaylistItem>> {
        self.set_cursor_to_playing();
        self.get(self.next_index())
    }

    pub fn previous(&self) -> Option<Arc<dyn PlaylistItem>> {
        self.set_cursor_to_playing();
        self.get(self.previous_index())
    }
}

impl std::fmt::Debug for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("Playlist")
            .field("name", &self.name)
            .field("items", &entries.items.len())
            .field("cursor", &entries.cursor)
            .finish()
    }
}

/// Named playlists, created on first use and kept for the process lifetime.
#[derive(Debug, Default)]
pub struct PlaylistController {
    playlists: Mutex<Vec<Arc<Playlist>>>,
}

impl PlaylistController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The playlist called `name`, created if missing.
    pub fn get(&self, name: &str) -> Arc<Playlist> {
        match self.find(name) {
            Some(playlist) => playlist,
            None => self.add_and_get(name),
        }
    }

    pub fn find(&self, name: &str) -> Option<Arc<Playlist>> {
        self.playlists
            .lock()
            .iter()
            .find(|playlist| playlist.name() == name)
            .cloned()
    }

    pub fn add(&self, name: &str) {
        self.add_and_get(name);
    }

    pub fn add_and_get(&self, name: &str) -> Arc<Playlist> {
        let mut playlists = self.playlists.lock();
        if let Some(existing) = playlists.iter().find(|playlist| playlist.name() == name) {
            return Arc::clone(existing);
        }
        let playlist = Arc::new(Playlist::new(name));
        playlists.push(Arc::clone(&playlist));
        playlist
    }

    pub fn last(&self) -> Option<Arc<Playlist>> {
        self.playlists.lock().last().cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.playlists.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Item {
        loaded: AtomicBool,
    }

    impl PlaylistItem for Item {
        fn is_loaded(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }

        fn activate(&self) {
            self.loaded.store(true, Ordering::SeqCst);
        }

        fn release(&self) {
            self.loaded.store(false, Ordering::SeqCst);
        }
    }

    fn items(n: usize) -> Vec<Arc<dyn PlaylistItem>> {
        (0..n)
            .map(|_| Arc::new(Item::default()) as Arc<dyn PlaylistItem>)
            .collect()
    }

    #[test]
    fn test_identity_membership() {
        let playlist = Playlist::new("home");
        let list = items(2);

        playlist.add(&list[0]);
        playlist.add(&list[0]);
        playlist.add(&list[1]);

        assert_eq!(playlist.len(), 2);
        playlist.remove(&list[0]);
        assert!(!playlist.contains(&list[0]));
        assert!(playlist.contains(&list[1]));
    }

    #[test]
    fn test_wraparound() {
        let playlist = Playlist::new("home");
        assert_eq!(playlist.next_index(), 0);
        assert_eq!(playlist.previous_index(), 0);

        let list = items(3);
        list.iter().for_each(|item| playlist.add(item));

        assert_eq!(playlist.previous_index(), 2);
        list[2].activate();
        assert_eq!(playlist.set_cursor_to_playing(), 2);
        assert_eq!(playlist.next_index(), 0);
        assert_eq!(playlist.previous_index(), 1);
    }

    #[test]
    fn test_first_loaded_wins() {
        let playlist = Playlist::new("home");
        let list = items(3);
        list.iter().for_each(|item| playlist.add(item));
        list[1].activate();
        list[2].activate();

        assert!(Arc::ptr_eq(&playlist.playing().unwrap(), &list[1]));
        assert!(Arc::ptr_eq(&playlist.next().unwrap(), &list[2]));
        assert!(Arc::ptr_eq(&playlist.previous().unwrap(), &list[0]));
    }

    #[test]
    fn test_dropped_items_are_pruned() {
        let playlist = Playlist::new("home");
        let mut list = items(2);
        list.iter().for_each(|item| playlist.add(item));

        list.remove(0);
        assert_eq!(playlist.len(), 1);
        assert!(Arc::ptr_eq(&playlist.get(0).unwrap(), &list[0]));
    }

    #[test]
    fn test_controller_get_or_create() {
        let controller = PlaylistController::new();
        let a = controller.get("events");
        let b = controller.get("events");
        controller.add("media");
        controller.add("media");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(controller.len(), 2);
        assert_eq!(controller.last().unwrap().name(), "media");
        assert!(controller.exists("events"));
        assert!(!controller.exists("news"));
    }
}
