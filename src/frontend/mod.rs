//! Frontend module for the desktop replay viewer
//!
//! The viewer never drives the engine from the ticker thread. It owns the
//! [`PlaybackController`], registers a [`BroadcastSink`] on it and drains the
//! receiving end once per repaint into its own sink models
//! ([`ViewerModels`]). Sessions are loaded on a background thread and handed
//! back over a channel.
//!
//! # Layout
//!
//! - Menu bar and transport toolbar at the top
//! - Session panel on the left, leaderboard on the right
//! - Track map in the centre, telemetry chart below it
//! - Status bar at the bottom

pub mod panels;
pub mod plot;
pub mod state;
pub mod status_bar;
pub mod toolbar;
pub mod track_map;

pub use state::{AppAction, LoadForm, SessionAnalysis, ViewerModels};

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use egui::Color32;
use std::time::Duration;

use crate::config::AppState;
use crate::error::Result;
use crate::session::controller::PlaybackController;
use crate::session::engine::PlaybackEngine;
use crate::session::loader::{FileSessionSource, LoadedSession, SessionLoader, SessionSource};
use crate::session::types::SessionRequest;
use crate::sinks::broadcast_sink::DEFAULT_CAPACITY;
use crate::sinks::{BroadcastSink, ReplayMessage};

use panels::{AnalysisPanel, AnalysisSelection, LeaderboardPanel, SessionPanel};
use status_bar::{render_status_bar, StatusBarContext};
use toolbar::{render_toolbar, ToolbarContext, COARSE_STEP};
use track_map::{render_track_map, TrackMapContext};

/// Repaint interval while a load is in flight
const LOADING_REPAINT: Duration = Duration::from_millis(100);

/// A session load running on a background thread
struct PendingLoad {
    request: SessionRequest,
    rx: Receiver<Result<LoadedSession>>,
}

/// Main application state
pub struct ReplayApp {
    controller: PlaybackController,
    frames_rx: Receiver<ReplayMessage>,
    models: ViewerModels,
    app_state: AppState,
    form: LoadForm,
    pending_load: Option<PendingLoad>,
    last_error: Option<String>,
    analysis_open: bool,
    analysis_selection: AnalysisSelection,
}

impl ReplayApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>, app_state: AppState) -> Self {
        if app_state.config.ui.dark_mode {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
        } else {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
        }

        let config = &app_state.config;
        let controller = PlaybackController::new(
            PlaybackEngine::with_rate(config.playback.default_rate),
            config.playback.tick_period(),
        );
        let (sink, frames_rx) = BroadcastSink::channel(DEFAULT_CAPACITY);
        controller.register_sink(Box::new(sink));

        let mut app = Self {
            controller,
            frames_rx,
            models: ViewerModels::new(config.ui.telemetry_history),
            form: LoadForm::default(),
            app_state,
            pending_load: None,
            last_error: None,
            analysis_open: false,
            analysis_selection: AnalysisSelection::default(),
        };

        if let Some(request) = app.app_state.last_session {
            tracing::info!("Restoring last session {}", request);
            app.form.set_request(request);
            app.start_load(request);
        }
        app.refresh_available(app.form.year);

        app
    }

    fn source(&self) -> FileSessionSource {
        FileSessionSource::new(self.app_state.config.data.sessions_dir.clone())
    }

    fn start_load(&mut self, request: SessionRequest) {
        if self.pending_load.is_some() {
            tracing::debug!("Ignoring load of {}: another load is running", request);
            return;
        }

        let (tx, rx) = bounded(1);
        let source = self.source();
        let spawned = std::thread::Builder::new()
            .name("session-loader".to_string())
            .spawn(move || {
                let loader = SessionLoader::new(Box::new(source));
                let _ = tx.send(loader.load_session(request));
            });

        match spawned {
            Ok(_) => self.pending_load = Some(PendingLoad { request, rx }),
            Err(e) => {
                tracing::error!("Failed to start session loader: {}", e);
                self.last_error = Some(format!("Failed to start loader: {}", e));
            }
        }
    }

    fn poll_load(&mut self) {
        let Some(pending) = &self.pending_load else {
            return;
        };

        let request = pending.request;
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.last_error = Some("Session loader exited unexpectedly".to_string());
                self.pending_load = None;
                return;
            }
        };

        self.pending_load = None;

        match result {
            Ok(session) => self.apply_session(session),
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", request, e);
                self.last_error = Some(format!("Failed to load {}: {}", request, e));
            }
        }
    }

    fn apply_session(&mut self, session: LoadedSession) {
        // Frames still queued belong to the previous session. Stop first so
        // none arrive between the drain and the session announcement.
        self.controller.stop();
        let _ = self.frames_rx.try_iter().count();

        self.controller.load_session(&session);
        self.controller
            .set_rate(self.app_state.config.playback.default_rate);

        self.app_state
            .add_recent_session(session.info.request, session.info.title());
        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {}", e);
        }

        self.models.track = session.track;
        self.models.buffer = session.buffer;
        self.models.analysis = None;
        self.analysis_selection = AnalysisSelection::default();
        self.last_error = None;

        // Show the grid before the first play
        self.controller.seek(0);
    }

    fn refresh_available(&mut self, year: u16) {
        match self.source().available(year) {
            Ok(sessions) => self.form.available = sessions,
            Err(e) => {
                tracing::warn!("Failed to list sessions for {}: {}", year, e);
                self.form.available.clear();
            }
        }
    }

    fn drain_frames(&mut self) -> bool {
        let mut had_messages = false;
        for message in self.frames_rx.try_iter() {
            self.models.apply(message);
            had_messages = true;
        }
        had_messages
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::LoadSession(request) => self.start_load(request),
            AppAction::RefreshAvailable(year) => self.refresh_available(year),
            AppAction::TogglePlay => {
                if let Err(e) = self.controller.toggle() {
                    self.last_error = Some(e.to_string());
                }
            }
            AppAction::Stop => {
                self.controller.stop();
                self.controller.seek(0);
            }
            AppAction::Step(frames) => {
                self.controller.step(frames);
            }
            AppAction::Seek(index) => {
                self.controller.seek(index);
            }
            AppAction::SetRate(rate) => self.controller.set_rate(rate),
            AppAction::SetDirection(direction) => self.controller.set_direction(direction),
            AppAction::FocusDriver(code) => {
                self.models.telemetry.set_focus(code);
                self.analysis_selection = AnalysisSelection::default();
                // Refill the chart with the frame on screen
                let snapshot = self.controller.snapshot();
                if !snapshot.status.is_playing() {
                    self.controller.seek(snapshot.cursor);
                }
            }
            AppAction::ToggleAnalysis => self.analysis_open = !self.analysis_open,
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::Key;

        let mut actions = Vec::new();
        let direction = self.controller.snapshot().direction;

        ctx.input(|i| {
            if i.key_pressed(Key::Space) && !i.modifiers.any() {
                actions.push(AppAction::TogglePlay);
            }

            let stride = if i.modifiers.shift { COARSE_STEP } else { 1 };
            if i.key_pressed(Key::ArrowLeft) {
                actions.push(AppAction::Step(-stride));
            }
            if i.key_pressed(Key::ArrowRight) {
                actions.push(AppAction::Step(stride));
            }

            if i.key_pressed(Key::Home) {
                actions.push(AppAction::Stop);
            }

            if i.key_pressed(Key::R) && !i.modifiers.any() {
                actions.push(AppAction::SetDirection(direction.reversed()));
            }

            if i.key_pressed(Key::A) && !i.modifiers.any() {
                actions.push(AppAction::ToggleAnalysis);
            }
        });

        // Text fields own the keyboard while focused
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }

        for action in actions {
            self.handle_action(action);
        }
    }
}

impl eframe::App for ReplayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_load();
        let had_messages = self.drain_frames();
        self.handle_keyboard_shortcuts(ctx);

        let snapshot = self.controller.snapshot();
        let loading = self.pending_load.is_some();

        if snapshot.status.is_playing() || had_messages {
            ctx.request_repaint_after(self.controller.tick_period());
        } else if loading {
            ctx.request_repaint_after(LOADING_REPAINT);
        }

        let mut actions = Vec::new();

        // Menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("Session", |ui| {
                    let last = self.app_state.last_session;
                    if ui
                        .add_enabled(last.is_some() && !loading, egui::Button::new("Reload"))
                        .clicked()
                    {
                        if let Some(request) = last {
                            actions.push(AppAction::LoadSession(request));
                        }
                        ui.close();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Session analysis (A)").clicked() {
                        actions.push(AppAction::ToggleAnalysis);
                        ui.close();
                    }
                    let ui_config = &mut self.app_state.config.ui;
                    ui.checkbox(&mut ui_config.show_driver_labels, "Driver labels");
                    if ui.checkbox(&mut ui_config.dark_mode, "Dark mode").changed() {
                        if ui_config.dark_mode {
                            ctx.set_visuals(egui::Visuals::dark());
                        } else {
                            ctx.set_visuals(egui::Visuals::light());
                        }
                    }
                });
            });
        });

        // Transport toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            let toolbar_ctx = ToolbarContext {
                snapshot: &snapshot,
                loading,
            };
            actions.extend(render_toolbar(ui, &toolbar_ctx));
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let weather = self
                .models
                .frame_index
                .and_then(|i| self.models.buffer.get(i).ok())
                .and_then(|f| f.weather.as_ref());
            let status_ctx = StatusBarContext {
                session: self.models.session.as_ref(),
                snapshot: &snapshot,
                frame_index: self.models.frame_index,
                weather,
                last_error: self.last_error.as_deref(),
            };
            render_status_bar(ui, &status_ctx);
        });

        egui::SidePanel::left("session_panel")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                actions.extend(SessionPanel::render(
                    ui,
                    &mut self.form,
                    &self.app_state.recent_sessions,
                    loading,
                ));
            });

        egui::SidePanel::right("leaderboard_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                actions.extend(LeaderboardPanel::render(
                    ui,
                    &self.models.leaderboard,
                    self.models.session.as_ref(),
                    self.models.telemetry.focus(),
                ));
            });

        egui::TopBottomPanel::bottom("telemetry_panel")
            .resizable(true)
            .default_height(280.0)
            .show(ctx, |ui| {
                plot::render_telemetry_chart(ui, &self.models.telemetry);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.models.session.is_none() && self.models.track.is_empty() {
                ui.centered_and_justified(|ui| {
                    let text = if loading {
                        "Loading session..."
                    } else {
                        "Load a session to start"
                    };
                    ui.colored_label(Color32::GRAY, text);
                });
                return;
            }

            let map_ctx = TrackMapContext {
                track: &self.models.track,
                scene: &self.models.scene,
                focus: self.models.telemetry.focus(),
                show_labels: self.app_state.config.ui.show_driver_labels,
            };
            render_track_map(ui, &map_ctx);
        });

        if self.analysis_open {
            let mut open = true;
            let focus = self.models.telemetry.focus().map(str::to_string);
            self.models.ensure_analysis();
            let models = &self.models;
            if let Some(analysis) = &models.analysis {
                egui::Window::new("Session analysis")
                    .open(&mut open)
                    .default_size([520.0, 600.0])
                    .show(ctx, |ui| {
                        AnalysisPanel::render(
                            ui,
                            analysis,
                            &models.buffer,
                            models.session.as_ref(),
                            focus.as_deref(),
                            &mut self.analysis_selection,
                        );
                    });
            }
            self.analysis_open = open;
        }

        for action in actions {
            self.handle_action(action);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.stop();

        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {}", e);
        }
    }
}
