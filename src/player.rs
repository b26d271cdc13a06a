use std::time::Instant;

use crate::{
    attrs::{MediaAttributes, Preload},
    clock::Clock,
    error::{TtyreelError, TtyreelResult},
    events::{MediaErrorCode, PlayerEvent},
    poster::Poster,
    recording::Recording,
    sink::RenderSink,
    transport::{FetchResponse, Transport},
};

/// Network activity of the current resource, mirroring the media
/// element's `networkState` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NetworkState {
    /// No load has been attempted since construction or emptying.
    Empty,
    /// A resource is installed and the network is quiet.
    Idle,
    /// Resource selection or the deferred fetch is in progress.
    Loading,
    /// Selection ran and found nothing usable (absent a new `load()`).
    NoSource,
}

/// How much of the resource is usable, mirroring `readyState`.
///
/// This engine loads recordings whole, so after a successful fetch it
/// jumps from `Metadata` straight to `EnoughData`; the intermediate
/// states exist for hosts that report them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ReadyState {
    Nothing,
    Metadata,
    CurrentData,
    FutureData,
    EnoughData,
}

/// Answer to a "can this engine play that content type" probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanPlayType {
    No,
    Maybe,
    Probably,
}

/// The single mutable source of truth for playback.
///
/// Kept separate from the collaborators so transitions read as plain
/// data updates; every public `Player` operation returns the
/// [`PlayerEvent`]s the transition emitted.
#[derive(Clone, Debug)]
pub(crate) struct PlayerState {
    pub(crate) network_state: NetworkState,
    pub(crate) ready_state: ReadyState,
    pub(crate) paused: bool,
    /// Scrub guard: suppresses end-of-stream and loop handling without
    /// touching `paused`.
    pub(crate) semipaused: bool,
    pub(crate) error: Option<MediaErrorCode>,
    pub(crate) current_time: f64,
    /// NaN until metadata is installed.
    pub(crate) duration: f64,
    pub(crate) playback_rate: f64,
    pub(crate) default_playback_rate: f64,
    /// Cursor into the chunk list: everything before it has been written
    /// to the sink. The only piece of render progress state.
    pub(crate) next_chunk: usize,
    pub(crate) recording: Option<Recording>,
    pub(crate) current_src: String,
}

impl PlayerState {
    fn new() -> Self {
        Self {
            network_state: NetworkState::Empty,
            ready_state: ReadyState::Nothing,
            paused: true,
            semipaused: false,
            error: None,
            current_time: 0.0,
            duration: f64::NAN,
            playback_rate: 1.0,
            default_playback_rate: 1.0,
            next_chunk: 0,
            recording: None,
            current_src: String::new(),
        }
    }
}

/// Opaque handle tying a fetch completion to the load that issued it.
/// Completions carrying a stale token (their load was cancelled by a
/// newer one) are discarded without touching state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchToken(u64);

#[derive(Clone, Debug)]
struct PendingFetch {
    generation: u64,
    url: String,
}

/// The playback engine: owns the state machine and drives the render
/// sink from a host-provided clock.
///
/// All operations are synchronous within the caller's turn except the
/// resource fetch, which `load()` only schedules; the host runs it via
/// [`Player::pump`] (sync transports) or [`Player::take_pending_fetch`] /
/// [`Player::complete_fetch`] (async transports).
pub struct Player {
    pub(crate) state: PlayerState,
    pub(crate) attrs: MediaAttributes,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) sink: Box<dyn RenderSink>,
    pub(crate) clock: Box<dyn Clock>,

    pending_fetch: Option<PendingFetch>,
    fetch_generation: u64,
    /// A `play()` arrived before data; start playback once it lands.
    pending_play: bool,
    /// A time-offset poster arrived before data; render it once it lands.
    pending_poster: bool,
    show_poster: bool,
    overlay_visible: bool,
    active_poster: Option<Poster>,
    default_start_position: f64,
    /// Write a human-readable explanation to the sink when entering the
    /// error state.
    explain_errors: bool,

    pub(crate) title: String,
    pub(crate) last_timeupdate: Option<Instant>,
    pub(crate) last_tick: Option<Instant>,
    pub(crate) events: Vec<PlayerEvent>,
}

impl Player {
    pub fn new(
        attrs: MediaAttributes,
        transport: Box<dyn Transport>,
        sink: Box<dyn RenderSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let title = attrs.window_title.clone();
        Self {
            state: PlayerState::new(),
            attrs,
            transport,
            sink,
            clock,
            pending_fetch: None,
            fetch_generation: 0,
            pending_play: false,
            pending_poster: false,
            show_poster: false,
            overlay_visible: false,
            active_poster: None,
            default_start_position: 0.0,
            explain_errors: true,
            title,
            last_timeupdate: None,
            last_tick: None,
            events: Vec::new(),
        }
    }

    /// Applies the host's preload/autoplay policy, the way a just-attached
    /// element would: any preload other than `none` starts a load, and
    /// autoplay starts playback.
    pub fn initialize(&mut self) -> Vec<PlayerEvent> {
        if self.attrs.preload != Preload::None {
            self.media_load_algorithm();
        }
        if self.attrs.autoplay {
            self.play_internal();
        }
        self.take_events()
    }

    pub fn network_state(&self) -> NetworkState {
        self.state.network_state
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.ready_state
    }

    pub fn paused(&self) -> bool {
        self.state.paused
    }

    pub fn semipaused(&self) -> bool {
        self.state.semipaused
    }

    pub fn error(&self) -> Option<MediaErrorCode> {
        self.state.error
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    /// NaN before metadata is available.
    pub fn duration(&self) -> f64 {
        self.state.duration
    }

    pub fn playback_rate(&self) -> f64 {
        self.state.playback_rate
    }

    pub fn default_playback_rate(&self) -> f64 {
        self.state.default_playback_rate
    }

    pub fn current_src(&self) -> &str {
        &self.state.current_src
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.state.recording.as_ref()
    }

    pub fn attrs(&self) -> &MediaAttributes {
        &self.attrs
    }

    /// Whether the seek-target overlay should currently be shown.
    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// True when playback ran off the end for the current direction and
    /// stopped there.
    pub fn ended(&self) -> bool {
        let boundary = if self.state.playback_rate < 0.0 {
            0.0
        } else {
            self.state.duration
        };
        self.state.paused && self.state.current_time == boundary
    }

    /// The seekable range: the whole timeline once enough data is loaded.
    pub fn seekable(&self) -> Option<(f64, f64)> {
        (self.state.ready_state == ReadyState::EnoughData).then(|| (0.0, self.state.duration))
    }

    /// Single-format engine: everything is a "maybe".
    pub fn can_play_type(&self, _content_type: &str) -> CanPlayType {
        CanPlayType::Maybe
    }

    pub fn set_explain_errors(&mut self, explain: bool) {
        self.explain_errors = explain;
    }

    /// Start position consumed by the next successful load.
    pub fn set_default_start_position(&mut self, time_sec: f64) {
        self.default_start_position = time_sec.max(0.0);
    }

    /// Sets or changes the source locator. A present source pauses
    /// playback and invokes the load algorithm; removing the attribute
    /// does not.
    pub fn set_src(&mut self, src: Option<String>) -> Vec<PlayerEvent> {
        self.attrs.src = src;
        if self.attrs.src.is_some() {
            self.pause_internal();
            self.media_load_algorithm();
        }
        self.take_events()
    }

    /// Changes the poster specification and re-applies the overlay if it
    /// is showing.
    pub fn set_poster(&mut self, poster: impl Into<String>) -> Vec<PlayerEvent> {
        self.attrs.poster = poster.into();
        self.apply_show_poster(self.show_poster);
        self.take_events()
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.attrs.looping = looping;
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.attrs.autoplay = autoplay;
    }

    pub fn set_preload(&mut self, preload: Preload) {
        self.attrs.preload = preload;
    }

    pub fn set_base_url(&mut self, base_url: Option<url::Url>) {
        self.attrs.base_url = base_url;
    }

    /// Changes the default title restored on terminal resets.
    pub fn set_window_title(&mut self, title: impl Into<String>) -> Vec<PlayerEvent> {
        self.attrs.window_title = title.into();
        self.emit(PlayerEvent::TitleChange);
        self.take_events()
    }

    /// Applies a title reported by the terminal surface (e.g. an OSC 2
    /// escape the recording carried).
    pub fn set_title(&mut self, title: impl Into<String>) -> Vec<PlayerEvent> {
        self.set_title_internal(title.into());
        self.take_events()
    }

    /// The media load algorithm: tears down the current session and runs
    /// resource selection for the current source attribute.
    pub fn load(&mut self) -> Vec<PlayerEvent> {
        self.media_load_algorithm();
        self.take_events()
    }

    /// Starts playback, deferring until data arrives if necessary.
    pub fn play(&mut self) -> Vec<PlayerEvent> {
        self.play_internal();
        self.take_events()
    }

    /// Stops the clock.
    pub fn pause(&mut self) -> Vec<PlayerEvent> {
        self.pause_internal();
        self.take_events()
    }

    /// Seeks to `time_sec`, clamped into `[0, duration]`, and renders
    /// synchronously. Fails with [`TtyreelError::InvalidState`] before a
    /// recording is loaded.
    pub fn seek(&mut self, time_sec: f64) -> TtyreelResult<Vec<PlayerEvent>> {
        if self.state.recording.is_none() {
            return Err(TtyreelError::invalid_state(
                "cannot seek before a recording is loaded",
            ));
        }
        self.seek_internal(time_sec);
        Ok(self.take_events())
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Vec<PlayerEvent> {
        if self.state.playback_rate != rate {
            self.state.playback_rate = rate;
            self.emit(PlayerEvent::RateChange);
        }
        self.take_events()
    }

    pub fn set_default_playback_rate(&mut self, rate: f64) -> Vec<PlayerEvent> {
        if self.state.default_playback_rate != rate {
            self.state.default_playback_rate = rate;
            self.emit(PlayerEvent::RateChange);
        }
        self.take_events()
    }

    /// Marks a scrub as in progress (suppressing end-of-stream and loop
    /// handling) or finished. The host sets this around interactive
    /// seeking.
    pub fn set_semipaused(&mut self, semipaused: bool) {
        self.state.semipaused = semipaused;
    }

    /// Runs the deferred resource fetch, if one is scheduled, through the
    /// owned transport. Returns the events that emitted. Hosts with a
    /// synchronous transport call this once per scheduling turn.
    pub fn pump(&mut self) -> Vec<PlayerEvent> {
        if let Some((token, url)) = self.take_pending_fetch() {
            let result = self.transport.fetch(&url);
            self.apply_fetch_result(token, result);
        }
        self.take_events()
    }

    /// Hands the scheduled fetch to an asynchronous host. The result must
    /// come back through [`Player::complete_fetch`] with the same token.
    pub fn take_pending_fetch(&mut self) -> Option<(FetchToken, String)> {
        self.pending_fetch
            .take()
            .map(|pending| (FetchToken(pending.generation), pending.url))
    }

    /// Applies a fetch result. A token from a load that has since been
    /// cancelled is ignored entirely.
    pub fn complete_fetch(
        &mut self,
        token: FetchToken,
        result: TtyreelResult<FetchResponse>,
    ) -> Vec<PlayerEvent> {
        self.apply_fetch_result(token, result);
        self.take_events()
    }

    /// True while a scheduled fetch is waiting to be pumped.
    pub fn fetch_pending(&self) -> bool {
        self.pending_fetch.is_some()
    }

    pub(crate) fn emit(&mut self, event: PlayerEvent) {
        tracing::trace!(event = event.name(), "emit");
        self.events.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_title_internal(&mut self, title: String) {
        self.title = title;
        self.emit(PlayerEvent::TitleChange);
    }

    /// Blanks the sink and restores the default window title.
    pub(crate) fn reset_terminal(&mut self) {
        self.sink.reset();
        let title = self.attrs.window_title.clone();
        self.set_title_internal(title);
    }

    fn media_load_algorithm(&mut self) {
        tracing::debug!(src = ?self.attrs.src, "media load algorithm");
        self.reset_terminal();

        // Cancel any fetch in flight; its completion must not apply.
        self.pending_fetch = None;
        self.fetch_generation += 1;

        if matches!(
            self.state.network_state,
            NetworkState::Loading | NetworkState::Idle
        ) {
            self.emit(PlayerEvent::Abort);
        }

        if self.state.network_state != NetworkState::Empty {
            self.emit(PlayerEvent::Emptied);
            self.state.ready_state = ReadyState::Nothing;
            self.state.paused = true;
            self.last_tick = None;
            let old_time = self.state.current_time;
            self.state.current_time = 0.0;
            self.state.next_chunk = 0;
            if old_time != 0.0 {
                self.emit(PlayerEvent::TimeUpdate);
            }
            self.state.recording = None;
            self.state.duration = f64::NAN;
        }

        self.state.playback_rate = self.state.default_playback_rate;
        self.state.error = None;
        self.resource_selection();
    }

    /// Simplified resource selection: one source attribute, no candidate
    /// list. Ends by scheduling the fetch for the next scheduling turn,
    /// never running it within the caller's.
    fn resource_selection(&mut self) {
        self.state.network_state = NetworkState::NoSource;
        self.apply_show_poster(true);

        let Some(src) = self.attrs.src.clone() else {
            self.state.network_state = NetworkState::Empty;
            return;
        };

        self.state.network_state = NetworkState::Loading;
        self.emit(PlayerEvent::LoadStart);

        if src.is_empty() {
            self.fail_with_src_not_supported();
            return;
        }
        let Some(absolute) = self.attrs.resolve_src(&src) else {
            self.fail_with_src_not_supported();
            return;
        };
        self.state.current_src = absolute.into();

        self.pending_fetch = Some(PendingFetch {
            generation: self.fetch_generation,
            url: self.state.current_src.clone(),
        });
    }

    /// The shared failure tail: fetch errors, bad status codes, decode
    /// failures and unusable source attributes all land here and surface
    /// identically. The engine stays re-loadable.
    fn fail_with_src_not_supported(&mut self) {
        tracing::warn!(src = %self.state.current_src, "source not supported");
        self.state.error = Some(MediaErrorCode::SrcNotSupported);
        self.state.network_state = NetworkState::NoSource;
        self.apply_show_poster(true);
        self.emit(PlayerEvent::Error);
        if self.explain_errors {
            self.write_error_explanation();
        }
    }

    fn write_error_explanation(&mut self) {
        let Some(code) = self.state.error else {
            return;
        };
        self.set_title_internal("Error :-(".to_string());
        self.sink.reset();
        self.sink.write(&format!(
            "\r\n\x1b[1mMediaError.\x1b[31m{}\x1b[m (numeric value {})\r\n\r\n    {}\r\n\r\n(Sorry 'bout that.)",
            code.const_name(),
            code.code(),
            code.explanation(),
        ));
    }

    #[tracing::instrument(skip_all)]
    fn apply_fetch_result(&mut self, token: FetchToken, result: TtyreelResult<FetchResponse>) {
        if token.0 != self.fetch_generation {
            tracing::debug!("stale fetch completion discarded");
            return;
        }
        let decoded = result.and_then(|response| {
            if response.is_success() {
                Recording::decode(&response.bytes)
            } else {
                Err(TtyreelError::transport(format!(
                    "unexpected status {}",
                    response.status
                )))
            }
        });
        match decoded {
            Ok(recording) => self.install_recording(recording),
            Err(err) => {
                tracing::warn!(error = %err, "resource fetch failed");
                self.fail_with_src_not_supported();
            }
        }
    }

    /// The success tail of the resource fetch algorithm: installs the
    /// recording and walks the ready states, emitting the media lifecycle
    /// in order.
    fn install_recording(&mut self, recording: Recording) {
        self.state.current_time = 0.0;
        self.state.next_chunk = 0;
        self.state.duration = recording.duration_sec();
        let dimensions = recording.dimensions;
        self.state.recording = Some(recording);
        self.emit(PlayerEvent::DurationChange);

        if let Some(size) = dimensions {
            self.sink.resize(size.cols, size.rows);
            self.emit(PlayerEvent::Resize);
        }

        self.state.ready_state = ReadyState::Metadata;
        self.emit(PlayerEvent::LoadedMetadata);

        if self.default_start_position > 0.0 {
            self.state.current_time = self.default_start_position.min(self.state.duration);
        }
        self.default_start_position = 0.0;

        self.emit(PlayerEvent::Progress);
        self.state.network_state = NetworkState::Idle;
        self.emit(PlayerEvent::Suspend);

        self.state.ready_state = ReadyState::EnoughData;
        self.emit(PlayerEvent::LoadedData);
        self.emit(PlayerEvent::CanPlay);
        self.emit(PlayerEvent::CanPlayThrough);

        // Deferred consumers, in listener order: a waiting play() first
        // (it hides the overlay, which then skips the waiting poster).
        if self.pending_play {
            self.pending_play = false;
            self.begin_playback();
        }
        if self.pending_poster {
            self.pending_poster = false;
            if self.show_poster {
                if let Some(Poster::TimeOffset(time)) = self.active_poster {
                    self.render_poster_frame(time);
                }
            }
        }
    }

    fn play_internal(&mut self) {
        if !self.state.paused {
            return;
        }
        if self.state.recording.is_some() {
            self.begin_playback();
        } else {
            self.pending_play = true;
            self.load_if_not_loading();
        }
    }

    fn begin_playback(&mut self) {
        if self.ended() {
            // Play from the start again (or the end, for reverse rates).
            let target = if self.state.playback_rate < 0.0 {
                self.state.duration
            } else {
                0.0
            };
            self.seek_internal(target);
        }
        self.apply_show_poster(false);
        self.state.paused = false;
        self.last_tick = Some(self.clock.now());
        self.emit(PlayerEvent::Play);
    }

    pub(crate) fn pause_internal(&mut self) {
        if self.state.paused {
            return;
        }
        self.state.paused = true;
        self.last_tick = None;
        self.emit(PlayerEvent::Pause);
    }

    pub(crate) fn seek_internal(&mut self, time_sec: f64) {
        self.state.current_time = time_sec.min(self.state.duration).max(0.0);
        self.render_now();
    }

    fn load_if_not_loading(&mut self) {
        // Only Empty and Idle auto-load; a NoSource failure waits for an
        // explicit load() or source change.
        if matches!(
            self.state.network_state,
            NetworkState::Empty | NetworkState::Idle
        ) {
            self.media_load_algorithm();
        }
    }

    /// The show-poster flag plus its side effects on the terminal: shows
    /// or hides the idle overlay, and paints time-offset or literal-text
    /// posters into the sink.
    fn apply_show_poster(&mut self, show: bool) {
        let old_show = self.show_poster;
        let new_poster = Poster::classify(&self.attrs.poster);
        self.show_poster = show;

        // The overlay never covers an error explanation.
        self.overlay_visible = show && self.state.error.is_none();

        if old_show == show && self.active_poster.as_ref() == Some(&new_poster) {
            return;
        }
        self.active_poster = Some(new_poster.clone());

        if old_show || show {
            // Whatever was painted before (old poster or playback output)
            // is stale now.
            self.reset_terminal();
        }
        if !show {
            return;
        }
        match new_poster {
            Poster::TimeOffset(time) => {
                if self.state.recording.is_some() {
                    self.render_poster_frame(time);
                } else {
                    self.pending_poster = true;
                    self.load_if_not_loading();
                }
            }
            Poster::LiteralText(text) => {
                self.sink.write(&text);
            }
            Poster::None | Poster::Unsupported => {}
        }
    }

    /// Paints the frame at `time_sec` without disturbing playback
    /// position: a semipaused excursion that is fully restored afterwards.
    fn render_poster_frame(&mut self, time_sec: f64) {
        let saved_time = self.state.current_time;
        let saved_semipaused = self.state.semipaused;
        self.state.semipaused = true;
        self.state.current_time = time_sec;
        self.state.next_chunk = 0;
        self.render_now();
        self.state.semipaused = saved_semipaused;
        self.state.current_time = saved_time;
    }
}
