//! App — the event loop hosting the coordinator.
//!
//! Architecture:
//! - `App` owns the `Coordinator`, the input mapper and the UI-only state.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks (terminal reader, catalog fetch, music lookups).
//! - Intents from the HTTP API arrive on their own channel.
//! - The loop draws a frame, then awaits the next message.
//! - Every intent goes through `Coordinator::dispatch`; the returned effects
//!   are run here (music lookups are spawned, notices become toasts).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ethereal_core::audio_url::AudioResolver;
use ethereal_core::catalog::{Catalog, CatalogLoader};
use ethereal_core::coordinator::{Coordinator, Effect, MusicRequest};
use ethereal_core::error::{CatalogLoadError, MusicResolutionError};
use ethereal_core::input::{InputMapper, InputTarget, Key};
use ethereal_core::intent::{Intent, Overlay};

use crate::components::favorites_page::FavoritesPage;
use crate::http::{ApiState, SharedApiState};
use crate::surfaces::SharedViewport;
use crate::ui;
use crate::widgets::toast::ToastManager;

/// Approximate pixel size of a terminal cell, so drag distances can be
/// compared against the swipe threshold.
const CELL_WIDTH_PX: f32 = 8.0;
const CELL_HEIGHT_PX: f32 = 16.0;

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    CatalogLoaded(Result<Catalog, CatalogLoadError>),
    MusicResolved {
        token: u64,
        result: Result<String, MusicResolutionError>,
    },
}

pub struct App {
    coordinator: Coordinator,
    mapper: InputMapper,
    favorite_key: char,
    loader: CatalogLoader,
    resolver: Arc<AudioResolver>,
    deep_link: Option<String>,
    viewport: SharedViewport,
    api: SharedApiState,
    favorites_page: FavoritesPage,
    toast: ToastManager,
    viewer_area: Rect,
    /// Target of the drag in progress, fixed when the left button goes down.
    drag_target: Option<InputTarget>,
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        coordinator: Coordinator,
        mapper: InputMapper,
        favorite_key: char,
        loader: CatalogLoader,
        resolver: AudioResolver,
        deep_link: Option<String>,
        viewport: SharedViewport,
        api: SharedApiState,
    ) -> Self {
        Self {
            coordinator,
            mapper,
            favorite_key,
            loader,
            resolver: Arc::new(resolver),
            deep_link,
            viewport,
            api,
            favorites_page: FavoritesPage::new(),
            toast: ToastManager::new(),
            viewer_area: Rect::default(),
            drag_target: None,
            tx: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, mut intent_rx: mpsc::Receiver<Intent>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard/mouse/focus events ──────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: catalog fetch ────────────────────────────────────
        let loader = self.loader.clone();
        let catalog_tx = tx.clone();
        tokio::spawn(async move {
            let result = loader.load().await;
            let _ = catalog_tx.send(AppMessage::CatalogLoaded(result)).await;
        });

        // Toast expiry check
        let mut toast_tick = tokio::time::interval(Duration::from_millis(250));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                }

                Some(intent) = intent_rx.recv() => {
                    self.apply(intent);
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
            if needs_redraw {
                self.publish();
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        info!("ethereal shutting down");
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableFocusChange
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Returns `true` if the message requires a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for intent in self.handle_key(key) {
                        self.apply(intent);
                    }
                }
                Event::Mouse(mouse) => {
                    let intents = self.handle_mouse(mouse);
                    if intents.is_empty() {
                        return false;
                    }
                    for intent in intents {
                        self.apply(intent);
                    }
                }
                Event::FocusLost => self.apply(Intent::VisibilityChanged { hidden: true }),
                Event::FocusGained => self.apply(Intent::VisibilityChanged { hidden: false }),
                Event::Resize(..) => {}
                _ => return false,
            },

            AppMessage::CatalogLoaded(result) => {
                let deep_link = self.deep_link.take();
                let effects = self.coordinator.on_catalog_loaded(result, deep_link.as_deref());
                self.run_effects(effects);
            }

            AppMessage::MusicResolved { token, result } => {
                if let Err(e) = &result {
                    debug!("music lookup failed: {}", e);
                }
                self.coordinator.on_music_resolved(token, result);
            }
        }
        true
    }

    fn apply(&mut self, intent: Intent) {
        let effects = self.coordinator.dispatch(intent);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ResolveMusic(request) => self.spawn_music_lookup(request),
                Effect::Notice(notice) => self.toast.notice(notice),
            }
        }
    }

    fn spawn_music_lookup(&self, request: MusicRequest) {
        let Some(tx) = self.tx.clone() else {
            warn!("music lookup requested before the event loop started");
            return;
        };
        let resolver = self.resolver.clone();
        tokio::spawn(async move {
            let result = resolver.resolve(&request.music).await;
            let _ = tx
                .send(AppMessage::MusicResolved {
                    token: request.token,
                    result,
                })
                .await;
        });
    }

    /// Refresh the snapshot served by the HTTP API.
    fn publish(&self) {
        let snapshot = ApiState::capture(&self.coordinator);
        match self.api.write() {
            Ok(mut guard) => {
                if *guard != snapshot {
                    *guard = snapshot;
                }
            }
            Err(e) => warn!("api snapshot lock poisoned: {}", e),
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Intent> {
        let overlay = self.coordinator.overlay();
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return vec![];
        }
        if key.code == KeyCode::Char('q') && !overlay.is_open() {
            self.should_quit = true;
            return vec![];
        }

        // Any key counts as the first interaction.
        let mut intents = vec![Intent::Interact];
        if overlay == Overlay::Favorites {
            let entries = self.coordinator.favorites();
            intents.extend(self.favorites_page.handle_key(key, &entries));
        } else if let Some(intent) = self.mapper.map_key(to_key(key.code), overlay) {
            intents.push(intent);
        }
        intents
    }

    /// A drag finishes on the target it started on, wherever the pointer
    /// is released.
    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Intent> {
        let (x, y) = to_pixels(event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = if hit(self.viewer_area, event.column, event.row) {
                    InputTarget::Embedded
                } else {
                    InputTarget::Document
                };
                if let Some(previous) = self.drag_target.replace(target) {
                    self.mapper.touch_cancel(previous);
                }
                self.mapper.touch_start(target, x, y);
                vec![Intent::Interact]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(target) = self.drag_target.take() else {
                    return vec![];
                };
                let overlay = self.coordinator.overlay();
                self.mapper.touch_end(target, x, y, overlay).into_iter().collect()
            }
            MouseEventKind::Down(_) => {
                if let Some(target) = self.drag_target.take() {
                    self.mapper.touch_cancel(target);
                }
                vec![Intent::Interact]
            }
            _ => vec![],
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let viewport = self.viewport.read().ok().and_then(|v| v.clone());
        let areas = ui::draw_base(frame, &self.coordinator, viewport.as_ref(), self.favorite_key);
        self.viewer_area = areas.viewer;

        let area = frame.area();
        match self.coordinator.overlay() {
            Overlay::None => {}
            Overlay::About => {
                if let Some(about) = self.coordinator.about() {
                    ui::draw_about(frame, area, about);
                }
            }
            Overlay::Favorites => {
                let entries = self.coordinator.favorites();
                self.favorites_page.draw(frame, area, &entries);
            }
            Overlay::Share => {
                if let Some(link) = self.coordinator.share_link() {
                    ui::draw_share(frame, area, link);
                }
            }
        }
        self.toast.draw(frame, area);
    }
}

fn to_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Esc => Key::Escape,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}

fn to_pixels(column: u16, row: u16) -> (f32, f32) {
    (column as f32 * CELL_WIDTH_PX, row as f32 * CELL_HEIGHT_PX)
}

fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}
