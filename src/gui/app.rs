//! Main GUI application module
//!
//! Contains the GuiApp struct and all its implementations.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use eframe::{egui, egui::RichText, App, Frame, NativeOptions};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, BITS_SCALE};
use crate::divest::{
    parse_amount, run_divest, AmountError, Confirm, DivestAmount, DivestOutcome, DivestPhase,
    DivestRequest,
};
use crate::format::format_bits;
use crate::history::HistoryEntry;
use crate::mirror::MirrorState;
use crate::session::{Session, SessionEvent, SocketSession};

use super::async_job::AsyncJob;
use super::confirm::ModalConfirm;
use super::notifications::{trim_feed, NotificationEntry, NotificationKind};
use super::theme::{configure_style, AppTheme};

const MAX_NOTIFICATIONS: usize = 50;

/// GUI section enum for navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuiSection {
    Home,
    History,
    RemoveFromBankroll,
}

/// Which control on the withdrawal form fired a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitClick {
    Form,
    All,
}

pub(crate) struct HistoryState {
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
    pub(crate) entries: Vec<HistoryEntry>,
    pub(crate) job: Option<AsyncJob<Vec<HistoryEntry>>>,
    pub(crate) events: Option<broadcast::Receiver<SessionEvent>>,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            entries: Vec::new(),
            job: None,
            events: None,
        }
    }
}

pub(crate) struct WithdrawState {
    pub(crate) amount: String,
    pub(crate) amount_error: Option<AmountError>,
    pub(crate) offsite: String,
    pub(crate) touched: bool,
    pub(crate) advanced: bool,
    pub(crate) wants_focus: bool,
    pub(crate) phase: Option<watch::Receiver<DivestPhase>>,
    pub(crate) job: Option<AsyncJob<DivestOutcome>>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl Default for WithdrawState {
    fn default() -> Self {
        Self {
            amount: String::new(),
            amount_error: None,
            offsite: "0".to_string(),
            touched: false,
            advanced: false,
            wants_focus: true,
            phase: None,
            job: None,
            cancel: None,
        }
    }
}

impl WithdrawState {
    pub(crate) fn phase(&self) -> DivestPhase {
        self.phase
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or_default()
    }
}

pub struct GuiApp {
    pub(crate) config: Config,
    pub(crate) theme: AppTheme,
    runtime: Runtime,
    session: Arc<dyn Session>,
    pub(crate) mirror: watch::Receiver<MirrorState>,
    pub(crate) section: GuiSection,
    pub(crate) notifications: VecDeque<NotificationEntry>,
    show_notifications_popup: bool,
    pub(crate) history_view: HistoryState,
    pub(crate) withdraw_view: WithdrawState,
    pub(crate) confirm: ModalConfirm,
}

impl GuiApp {
    fn new(
        config: Config,
        runtime: Runtime,
        session: Arc<SocketSession>,
        ctx: &egui::Context,
    ) -> Self {
        let theme = AppTheme::default();
        configure_style(ctx, &theme);

        let mirror = session.mirror();

        Self {
            config,
            theme,
            runtime,
            session,
            mirror,
            section: GuiSection::Home,
            notifications: VecDeque::new(),
            show_notifications_popup: false,
            history_view: HistoryState::default(),
            withdraw_view: WithdrawState::default(),
            confirm: ModalConfirm::new(),
        }
    }

    pub(crate) fn spawn_job<T, Fut>(&self, fut: Fut) -> AsyncJob<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.runtime.spawn(async move {
            let _ = tx.send(fut.await);
        });
        AsyncJob::new(rx)
    }

    /// Navigate, tearing down whatever the departing section had in flight.
    pub(crate) fn set_section(&mut self, section: GuiSection) {
        if self.section == section {
            return;
        }
        match self.section {
            GuiSection::RemoveFromBankroll => self.teardown_withdraw(),
            GuiSection::History => self.history_view = HistoryState::default(),
            GuiSection::Home => {}
        }
        self.section = section;
        match section {
            GuiSection::History => {
                self.history_view = HistoryState::default();
                self.history_view.events = Some(self.session.events());
                self.start_history_fetch();
            }
            GuiSection::RemoveFromBankroll => self.withdraw_view = WithdrawState::default(),
            GuiSection::Home => {}
        }
    }

    /// Cancel an in-flight withdrawal and reset the form. The protocol task
    /// observes the token and stops without side effects.
    fn teardown_withdraw(&mut self) {
        if let Some(cancel) = self.withdraw_view.cancel.take() {
            cancel.cancel();
        }
        self.confirm.clear();
        self.withdraw_view = WithdrawState::default();
    }

    pub(crate) fn start_history_fetch(&mut self) {
        self.history_view.loading = true;
        self.history_view.error = None;
        let session = Arc::clone(&self.session);
        // Replacing the job drops the previous receiver, so a stale fetch
        // that later completes has nowhere to land.
        self.history_view.job = Some(self.spawn_job(async move {
            session.bankroll_history().await.map_err(Into::into)
        }));
    }

    pub(crate) fn start_divest(&mut self, click: SubmitClick) {
        if self.withdraw_view.job.is_some() {
            return;
        }

        let amount = match click {
            SubmitClick::All => DivestAmount::All,
            SubmitClick::Form => {
                self.withdraw_view.touched = true;
                match parse_amount(&self.withdraw_view.amount, self.config.min_divest) {
                    Ok(amount) => {
                        self.withdraw_view.amount_error = None;
                        amount
                    }
                    Err(e) => {
                        self.withdraw_view.amount_error = Some(e);
                        return;
                    }
                }
            }
        };
        let offsite = self
            .withdraw_view
            .offsite
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| (v * BITS_SCALE as f64).round() as u64)
            .unwrap_or(0);
        let request = DivestRequest { amount, offsite };

        let (phase_tx, phase_rx) = watch::channel(DivestPhase::Idle);
        let cancel = CancellationToken::new();
        self.withdraw_view.phase = Some(phase_rx);
        self.withdraw_view.cancel = Some(cancel.clone());

        let session = Arc::clone(&self.session);
        let confirm: Arc<dyn Confirm> = Arc::new(self.confirm.clone());
        self.withdraw_view.job = Some(self.spawn_job(async move {
            Ok(run_divest(session, confirm, request, phase_tx, cancel).await)
        }));
    }

    fn poll_jobs(&mut self) {
        // Fold queued server events into a single history refresh
        let mut refresh = false;
        if self.section == GuiSection::History {
            let mut closed = false;
            if let Some(events) = &mut self.history_view.events {
                loop {
                    match events.try_recv() {
                        Ok(SessionEvent::BankrollChanged)
                        | Ok(SessionEvent::BankrollStatsChanged)
                        | Ok(SessionEvent::UnameChanged) => refresh = true,
                        Ok(SessionEvent::GameEnded) => {}
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Lagged(_)) => refresh = true,
                        Err(TryRecvError::Closed) => {
                            closed = true;
                            break;
                        }
                    }
                }
            }
            if closed {
                self.history_view.events = None;
            }
        }
        if refresh {
            self.start_history_fetch();
        }

        if let Some(job) = &mut self.history_view.job {
            if let Some(res) = job.poll() {
                match res {
                    Ok(entries) => {
                        self.history_view.entries = entries;
                        self.history_view.error = None;
                    }
                    Err(e) => self.history_view.error = Some(e.to_string()),
                }
                self.history_view.loading = false;
                self.history_view.job = None;
            }
        }

        if let Some(job) = &mut self.withdraw_view.job {
            if let Some(res) = job.poll() {
                self.withdraw_view.job = None;
                self.withdraw_view.cancel = None;
                self.withdraw_view.phase = None;
                match res {
                    Ok(DivestOutcome::Completed) => {
                        self.withdraw_view = WithdrawState::default();
                        self.section = GuiSection::Home;
                    }
                    Ok(DivestOutcome::Declined) | Ok(DivestOutcome::Cancelled) => {}
                    Ok(DivestOutcome::Failed(msg)) => {
                        self.notifications.push_back(NotificationEntry::error(
                            format!("Unexpected server error: {}", msg),
                        ));
                    }
                    Err(e) => {
                        self.notifications
                            .push_back(NotificationEntry::error(e.to_string()));
                    }
                }
            }
        }

        trim_feed(&mut self.notifications, MAX_NOTIFICATIONS);
    }

    fn render_confirm_modal(&mut self, ctx: &egui::Context) {
        let message = self.confirm.with_pending(|p| p.message.clone());
        let Some(message) = message else { return };

        let mut answer = None;
        egui::Window::new("Confirm withdrawal")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.add_space(self.theme.spacing_sm);
                ui.label(&message);
                ui.add_space(self.theme.spacing_md);
                ui.horizontal(|ui| {
                    if ui.add(self.theme.button_primary("Yes, remove")).clicked() {
                        answer = Some(true);
                    }
                    if ui.add(self.theme.button_secondary("Cancel")).clicked() {
                        answer = Some(false);
                    }
                });
                ui.add_space(self.theme.spacing_sm);
            });

        if let Some(accepted) = answer {
            self.confirm.with_pending(|p| p.answer(accepted));
            self.confirm.clear();
        }
    }

    fn render_notifications(&mut self, ctx: &egui::Context) {
        if !self.show_notifications_popup {
            return;
        }
        egui::Window::new("Notifications")
            .collapsible(false)
            .default_width(360.0)
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 40.0])
            .show(ctx, |ui| {
                if self.notifications.is_empty() {
                    ui.label(RichText::new("Nothing yet.").color(self.theme.text_secondary));
                }
                egui::ScrollArea::vertical().max_height(280.0).show(ui, |ui| {
                    for entry in self.notifications.iter().rev() {
                        let color = match entry.kind {
                            NotificationKind::Info => self.theme.text_primary,
                            NotificationKind::Error => self.theme.error,
                        };
                        ui.horizontal_wrapped(|ui| {
                            ui.label(
                                RichText::new(entry.time_ago())
                                    .small()
                                    .color(self.theme.text_secondary),
                            );
                            ui.label(RichText::new(&entry.message).color(color));
                        });
                        ui.add_space(self.theme.spacing_xs);
                    }
                });
                if ui.add(self.theme.button_secondary("Close")).clicked() {
                    self.show_notifications_popup = false;
                }
            });
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_jobs();

        let mirror = self.mirror.borrow().clone();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal_wrapped(|ui| {
                ui.heading(
                    RichText::new("Bankroll Desk")
                        .size(24.0)
                        .color(self.theme.primary),
                );
                ui.label(
                    RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                        .size(12.0)
                        .color(self.theme.text_primary),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let badge = if self.notifications.is_empty() {
                        "[0]".to_string()
                    } else {
                        format!("[{}]", self.notifications.len())
                    };
                    if ui
                        .add(self.theme.button_secondary(&badge))
                        .on_hover_text("Notifications")
                        .clicked()
                    {
                        self.show_notifications_popup = !self.show_notifications_popup;
                    }
                    ui.label(
                        RichText::new(format!(
                            "Your share: {} bits",
                            format_bits(mirror.user_share())
                        ))
                        .color(self.theme.primary),
                    );
                    if let Some(uname) = &mirror.uname {
                        ui.label(RichText::new(uname).color(self.theme.text_secondary));
                    }
                });
            });
            ui.add_space(8.0);
        });

        egui::SidePanel::left("nav")
            .resizable(false)
            .default_width(180.0)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.surface)
                    .stroke(egui::Stroke::new(1.0, self.theme.primary)),
            )
            .show(ctx, |ui| {
                ui.add_space(self.theme.spacing_md);

                let nav_items = [
                    (GuiSection::Home, "[H] Home"),
                    (GuiSection::History, "[=] History"),
                    (GuiSection::RemoveFromBankroll, "[$] Remove from bankroll"),
                ];

                let mut target = None;
                for (section, label) in nav_items {
                    let selected = self.section == section;
                    ui.horizontal(|ui| {
                        if selected {
                            ui.add_space(2.0);
                            let (rect, _) = ui.allocate_exact_size(
                                egui::vec2(3.0, 20.0),
                                egui::Sense::hover(),
                            );
                            ui.painter().rect_filled(rect, 0.0, self.theme.primary);
                            ui.add_space(4.0);
                        } else {
                            ui.add_space(9.0);
                        }

                        let text_color = if selected {
                            self.theme.text_primary
                        } else {
                            self.theme.text_secondary
                        };
                        let response = ui.add(
                            egui::Button::new(
                                RichText::new(label).size(13.0).color(text_color),
                            )
                            .fill(egui::Color32::TRANSPARENT)
                            .stroke(egui::Stroke::NONE)
                            .sense(egui::Sense::click()),
                        );
                        if response.clicked() {
                            target = Some(section);
                        }
                    });
                    ui.add_space(self.theme.spacing_xs);
                }
                if let Some(section) = target {
                    self.set_section(section);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(self.theme.spacing_md);
            egui::ScrollArea::vertical().show(ui, |ui| match self.section {
                GuiSection::Home => super::views::view_home(self, ui),
                GuiSection::History => super::views::view_history(self, ui),
                GuiSection::RemoveFromBankroll => super::views::view_withdraw(self, ui),
            });
        });

        self.render_confirm_modal(ctx);
        self.render_notifications(ctx);

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

pub fn launch(config: Config) -> Result<()> {
    let runtime = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to create async runtime: {}", e))?;

    let session = Arc::new(SocketSession::new(config.server_url.clone()));
    runtime.spawn(Arc::clone(&session).run_with_reconnect());

    let app_creator = move |cc: &eframe::CreationContext<'_>| {
        Box::new(GuiApp::new(config, runtime, session, &cc.egui_ctx)) as Box<dyn App>
    };

    let viewport = egui::ViewportBuilder::default().with_inner_size([1000.0, 680.0]);
    let native_options = NativeOptions {
        viewport,
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native("Bankroll Desk", native_options, Box::new(app_creator))
        .map_err(|e| anyhow!("Failed to start GUI: {}", e))
}
