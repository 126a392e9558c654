//! # Music Player Controller
//!
//! Owns the single registered [`MediaBackend`] and the reactive
//! [`PlaybackState`].
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──register──> Loading ──ready/play──> Playing <──> Paused
//!                       │                       │
//!                       └─timeout─> Failed      └──end──> Ended ──> next item
//! ```
//!
//! `reset` returns to `Idle` from anywhere. Each registration opens a new
//! [`SessionId`]; signals carrying an older session are dropped, so a torn
//! down backend can never drive the state.
//!
//! ## Timers
//!
//! Backends with [`TickSource::Polled`] get an interval timer while playing.
//! It is cancelled on pause, end, reset, failure and re-registration. The
//! load timeout is cancelled as soon as the backend loads or plays.
//!
//! ## Re-entrancy
//!
//! Backend and playlist-item calls are made with no controller lock held, so
//! SDKs may report signals synchronously from inside a command.

use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use bridge_traits::notification::{Notification, NotificationSink};
use bridge_traits::time::Clock;
use bridge_traits::timer::{TimerId, TimerScheduler};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::state::{StateCell, StateReceiver};
use core_runtime::CoreConfig;

use crate::backend::{BackendSignal, MediaBackend, TickSource};
use crate::error::{PlaybackError, Result};
use crate::kind::MediaKind;
use crate::playlist::{Playlist, PlaylistController, PlaylistItem};
use crate::state::{PlaybackPhase, PlaybackState};

pub const LOAD_FAILED_MESSAGE: &str = "Unable to load media";

/// Identifies one backend registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A backend to install, with what the player shows for it.
pub struct PlaybackRequest {
    pub backend: Arc<dyn MediaBackend>,
    pub song_name: String,
    pub artist_name: String,
    /// Playlist that `next`/`previous` step through.
    pub playlist: Option<String>,
    /// The on-page item that owns this media.
    pub item: Option<Weak<dyn PlaylistItem>>,
}

impl PlaybackRequest {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            song_name: String::new(),
            artist_name: String::new(),
            playlist: None,
            item: None,
        }
    }

    /// Song and artist names from a denormalized medium record.
    pub fn for_medium(backend: Arc<dyn MediaBackend>, medium: &Value) -> Self {
        let song = &medium["song"];
        Self::new(backend)
            .song(song["name"].as_str().unwrap_or_default())
            .artist(song["artist"]["name"].as_str().unwrap_or_default())
    }

    pub fn song(mut self, name: impl Into<String>) -> Self {
        self.song_name = name.into();
        self
    }

    pub fn artist(mut self, name: impl Into<String>) -> Self {
        self.artist_name = name.into();
        self
    }

    pub fn in_playlist(mut self, name: impl Into<String>) -> Self {
        self.playlist = Some(name.into());
        self
    }

    pub fn owned_by(mut self, item: &Arc<dyn PlaylistItem>) -> Self {
        self.item = Some(Arc::downgrade(item));
        self
    }
}

/// Collaborators the player needs.
#[derive(Clone)]
pub struct PlayerDeps {
    pub timers: Arc<dyn TimerScheduler>,
    pub notifications: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn Clock>,
    pub events: EventBus,
    pub poll_interval: Duration,
    /// `None` waits for the backend forever.
    pub load_timeout: Option<Duration>,
}

impl PlayerDeps {
    pub fn from_config(config: &CoreConfig, events: EventBus) -> Self {
        Self {
            timers: config.timers.clone(),
            notifications: config.notifications.clone(),
            clock: config.clock.clone(),
            events,
            poll_interval: config.poll_interval,
            load_timeout: config.load_timeout,
        }
    }
}

struct ActiveBackend {
    session: SessionId,
    backend: Arc<dyn MediaBackend>,
    item: Option<Weak<dyn PlaylistItem>>,
    poll_timer: Option<TimerId>,
    load_timer: Option<TimerId>,
}

pub struct MusicPlayerController {
    this: Weak<Self>,
    state: Arc<StateCell<PlaybackState>>,
    active: Mutex<Option<ActiveBackend>>,
    last_session: AtomicU64,
    playlists: Arc<PlaylistController>,
    deps: PlayerDeps,
}

impl MusicPlayerController {
    pub fn new(deps: PlayerDeps, playlists: Arc<PlaylistController>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            state: Arc::new(StateCell::new(PlaybackState::default())),
            active: Mutex::new(None),
            last_session: AtomicU64::new(0),
            playlists,
            deps,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    pub fn subscribe(&self) -> StateReceiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn state_cell(&self) -> Arc<StateCell<PlaybackState>> {
        Arc::clone(&self.state)
    }

    pub fn playlists(&self) -> &Arc<PlaylistController> {
        &self.playlists
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active.lock().as_ref().map(|active| active.session)
    }

    pub fn is_paused(&self) -> bool {
        self.state.with(|state| state.paused)
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Install a backend, tearing down the previous one first.
    #[instrument(skip(self, request), fields(kind = %request.backend.kind()))]
    pub fn register(&self, request: PlaybackRequest) -> Result<SessionId> {
        let kind = request.backend.kind();
        if kind == MediaKind::None {
            return Err(PlaybackError::NoneBackend);
        }

        let session = SessionId(self.last_session.fetch_add(1, Ordering::SeqCst) + 1);

        let previous = self.active.lock().take();
        if let Some(previous) = previous {
            let same_item = match (&previous.item, &request.item) {
                (Some(old), Some(new)) => Weak::ptr_eq(old, new),
                _ => false,
            };
            let old_session = previous.session;
            self.teardown(previous, !same_item);
            self.emit(PlaybackEvent::Reset {
                session: old_session.0,
            });
        }

        let load_timer = self.deps.load_timeout.map(|timeout| {
            let this = self.this.clone();
            self.deps.timers.start_timeout(
                timeout,
                Arc::new(move || {
                    if let Some(controller) = this.upgrade() {
                        controller.on_load_timeout(session);
                    }
                }),
            )
        });

        *self.active.lock() = Some(ActiveBackend {
            session,
            backend: request.backend,
            item: request.item,
            poll_timer: None,
            load_timer,
        });

        let song_name = request.song_name.clone();
        self.state.update(|state| {
            state.media_type = kind;
            state.phase = PlaybackPhase::Loading;
            state.paused = true;
            state.playable = false;
            state.current_time = 0.0;
            state.duration = 0.0;
            state.buffer_percent = 0.0;
            state.song_name = request.song_name;
            state.artist_name = request.artist_name;
            if let Some(playlist) = request.playlist {
                state.playlist_name = playlist;
            }
        });

        info!(%session, %kind, "Media backend registered");
        self.emit(PlaybackEvent::BackendRegistered {
            session: session.0,
            kind: kind.name().to_string(),
            song_name,
        });
        Ok(session)
    }

    /// Drop the active backend and return to idle.
    #[instrument(skip(self))]
    pub fn reset(&self) {
        let previous = self.active.lock().take();
        if let Some(previous) = previous {
            let session = previous.session;
            self.teardown(previous, true);
            self.emit(PlaybackEvent::Reset { session: session.0 });
        }

        self.state.update(|state| {
            state.media_type = MediaKind::None;
            state.phase = PlaybackPhase::Idle;
            state.paused = true;
            state.playable = false;
        });
    }

    fn teardown(&self, previous: ActiveBackend, release_item: bool) {
        for timer in [previous.poll_timer, previous.load_timer].into_iter().flatten() {
            self.deps.timers.cancel(timer);
        }
        previous.backend.teardown();
        if release_item {
            if let Some(item) = previous.item.as_ref().and_then(Weak::upgrade) {
                item.release();
            }
        }
        debug!(session = %previous.session, "Media backend torn down");
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Resume the active backend if it is paused.
    ///
    /// Does nothing while the backend is still loading; it starts on its own
    /// once ready.
    #[instrument(skip(self))]
    pub fn play(&self) -> Result<()> {
        let Some((session, backend)) = self.current() else {
            debug!("Play requested with no backend registered");
            return Ok(());
        };
        let (paused, playable) = self.state.with(|state| (state.paused, state.playable));
        if !paused {
            return Ok(());
        }
        if !playable {
            debug!(%session, "Play requested before the backend is ready");
            return Ok(());
        }

        backend.play()?;
        self.on_play(session);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn pause(&self) -> Result<()> {
        let Some((session, backend)) = self.current() else {
            return Ok(());
        };

        backend.pause()?;
        self.on_pause(session);
        Ok(())
    }

    pub fn toggle(&self) -> Result<()> {
        if self.is_paused() {
            self.play()
        } else {
            self.pause()
        }
    }

    /// Activate the next item of the current playlist. Returns `false` when
    /// there is nothing to step to.
    pub fn next(&self) -> bool {
        self.step(|playlist| playlist.next())
    }

    pub fn previous(&self) -> bool {
        self.step(|playlist| playlist.previous())
    }

    fn step(
        &self,
        pick: impl FnOnce(&Playlist) -> Option<Arc<dyn PlaylistItem>>,
    ) -> bool {
        let name = self.state.with(|state| state.playlist_name.clone());
        let Some(playlist) = self.playlists.find(&name) else {
            debug!(playlist = %name, "No playlist to step through");
            return false;
        };
        match pick(playlist.as_ref()) {
            Some(item) => {
                item.activate();
                true
            }
            None => false,
        }
    }

    /// Seek to `fraction` of the duration.
    #[instrument(skip(self))]
    pub fn seek(&self, fraction: f64) -> Result<()> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(PlaybackError::InvalidSeekFraction(fraction));
        }
        let Some((_, backend)) = self.current() else {
            return Ok(());
        };

        let position = fraction * self.state.with(|state| state.duration);
        backend.seek(position)?;
        self.state.update(|state| state.current_time = position);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn volume_change(&self, volume: f64) -> Result<()> {
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }

        self.state.update(|state| state.volume = volume);
        if let Some((_, backend)) = self.current() {
            backend.set_volume(volume)?;
        }
        self.emit(PlaybackEvent::VolumeChanged { volume });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Backend signals
    // ------------------------------------------------------------------

    /// Route a translated SDK callback to its handler.
    pub fn dispatch(&self, session: SessionId, signal: BackendSignal) -> Result<()> {
        match signal {
            BackendSignal::Ready => return self.on_ready(session),
            BackendSignal::Load => self.on_load(session),
            BackendSignal::Tick => self.on_tick(session),
            BackendSignal::Play => self.on_play(session),
            BackendSignal::Pause => self.on_pause(session),
            BackendSignal::End => self.on_end(session),
        }
        Ok(())
    }

    /// The SDK handle is usable: apply the volume, load, then start.
    pub fn on_ready(&self, session: SessionId) -> Result<()> {
        let Some(backend) = self.backend_for(session) else {
            return Ok(());
        };

        backend.set_volume(self.state.with(|state| state.volume))?;
        self.state.update(|state| state.playable = true);
        self.on_load(session);

        if !backend.autoplays_on_ready() {
            backend.play()?;
        }
        self.on_play(session);
        Ok(())
    }

    pub fn on_load(&self, session: SessionId) {
        let Some(backend) = self.backend_for(session) else {
            return;
        };

        let report = backend.report_load();
        self.cancel_load_timer(session);
        self.state.update(|state| state.duration = report.duration);
        self.emit(PlaybackEvent::Loaded {
            session: session.0,
            duration_secs: report.duration,
        });
    }

    pub fn on_tick(&self, session: SessionId) {
        let Some(backend) = self.backend_for(session) else {
            return;
        };

        let report = backend.report_tick();
        self.state.update(|state| {
            state.current_time = report.current_time;
            if let Some(buffer) = report.buffer_percent {
                state.buffer_percent = buffer;
            }
            if let Some(duration) = report.duration {
                state.duration = duration;
            }
        });
    }

    /// The backend confirms playback started.
    pub fn on_play(&self, session: SessionId) {
        let Some(backend) = self.backend_for(session) else {
            return;
        };

        self.cancel_load_timer(session);
        let started = self.state.update(|state| {
            let was_playing = state.phase == PlaybackPhase::Playing;
            state.phase = PlaybackPhase::Playing;
            state.paused = false;
            state.playable = true;
            !was_playing
        });

        if backend.tick_source() == TickSource::Polled {
            self.start_polling(session);
        }
        if started {
            self.emit(PlaybackEvent::Started { session: session.0 });
        }
    }

    pub fn on_pause(&self, session: SessionId) {
        if self.backend_for(session).is_none() {
            return;
        }

        self.stop_polling(session);
        let position = self.state.update(|state| {
            state.phase = PlaybackPhase::Paused;
            state.paused = true;
            state.current_time
        });
        self.emit(PlaybackEvent::Paused {
            session: session.0,
            position_secs: position,
        });
    }

    /// Record the end of the media, then move on to the next playlist item.
    pub fn on_end(&self, session: SessionId) {
        let Some(backend) = self.backend_for(session) else {
            return;
        };

        let position = backend.report_end();
        self.stop_polling(session);
        self.state.update(|state| {
            state.current_time = position;
            state.phase = PlaybackPhase::Ended;
            state.paused = true;
        });
        self.emit(PlaybackEvent::Ended { session: session.0 });

        self.next();
    }

    fn on_load_timeout(&self, session: SessionId) {
        let failed = {
            let mut active = self.active.lock();
            match active.take() {
                Some(mut current) if current.session == session => {
                    current.load_timer = None;
                    Some(current)
                }
                other => {
                    *active = other;
                    None
                }
            }
        };
        let Some(failed) = failed else {
            return;
        };

        warn!(%session, "Media backend did not load in time");
        self.teardown(failed, true);
        self.state.update(|state| {
            state.phase = PlaybackPhase::Failed;
            state.media_type = MediaKind::None;
            state.paused = true;
            state.playable = false;
        });
        self.deps.notifications.record(
            Notification::new(LOAD_FAILED_MESSAGE)
                .error()
                .recorded_at(self.deps.clock.now()),
        );
        self.emit(PlaybackEvent::Failed {
            session: session.0,
            message: LOAD_FAILED_MESSAGE.to_string(),
        });
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn current(&self) -> Option<(SessionId, Arc<dyn MediaBackend>)> {
        self.active
            .lock()
            .as_ref()
            .map(|active| (active.session, Arc::clone(&active.backend)))
    }

    fn backend_for(&self, session: SessionId) -> Option<Arc<dyn MediaBackend>> {
        match self.current() {
            Some((current, backend)) if current == session => Some(backend),
            _ => {
                debug!(%session, "Ignoring signal from a stale session");
                None
            }
        }
    }

    fn start_polling(&self, session: SessionId) {
        let mut active = self.active.lock();
        let Some(current) = active.as_mut().filter(|a| a.session == session) else {
            return;
        };
        if current.poll_timer.is_some() {
            return;
        }

        let this = self.this.clone();
        current.poll_timer = Some(self.deps.timers.start_interval(
            self.deps.poll_interval,
            Arc::new(move || {
                if let Some(controller) = this.upgrade() {
                    controller.on_tick(session);
                }
            }),
        ));
    }

    fn stop_polling(&self, session: SessionId) {
        let timer = self
            .active
            .lock()
            .as_mut()
            .filter(|a| a.session == session)
            .and_then(|a| a.poll_timer.take());
        if let Some(timer) = timer {
            self.deps.timers.cancel(timer);
        }
    }

    fn cancel_load_timer(&self, session: SessionId) {
        let timer = self
            .active
            .lock()
            .as_mut()
            .filter(|a| a.session == session)
            .and_then(|a| a.load_timer.take());
        if let Some(timer) = timer {
            self.deps.timers.cancel(timer);
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        self.deps.events.emit(CoreEvent::Playback(event)).ok();
    }
}

impl fmt::Debug for MusicPlayerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MusicPlayerController")
            .field("active_session", &self.active_session())
            .field("state", &self.state.get())
            .finish()
    }
}
