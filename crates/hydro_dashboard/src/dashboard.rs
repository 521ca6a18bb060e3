//! Dashboard principal – App eframe/egui.

use crate::device::DeviceConnection;
use crate::panels;
use crate::theme_egui::EguiTheme;
use crossbeam_channel::Receiver;
use egui::RichText;
use hydro_core::config::AppConfig;
use hydro_core::protocol::Command;
use hydro_core::types::DeviceState;
use hydro_link::LineFailure;
use std::time::{Duration, Instant};
use tracing::info;

/// Mensagens ao operador somem depois deste tempo.
const NOTICE_TTL: Duration = Duration::from_secs(8);

/// Aviso transitório exibido na barra de status.
struct Notice {
    text: String,
    is_error: bool,
    at: Instant,
}

/// Teclas de atalho lidas num frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Shortcuts {
    restore: bool,
    toggle_fullscreen: bool,
    quit: bool,
}

impl Shortcuts {
    /// `ctx.input` segura o lock do contexto: nenhum comando de viewport
    /// pode ser enviado dentro do closure.
    fn read(ctx: &egui::Context) -> Self {
        ctx.input(|i: &egui::InputState| Self {
            restore: i.key_pressed(egui::Key::Escape),
            toggle_fullscreen: i.key_pressed(egui::Key::F) || i.key_pressed(egui::Key::F11),
            quit: i.key_pressed(egui::Key::Q),
        })
    }

    fn apply(self, ctx: &egui::Context, is_fullscreen: &mut bool) {
        if self.restore {
            *is_fullscreen = false;
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
            ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(false));
        }
        if self.toggle_fullscreen {
            *is_fullscreen = !*is_fullscreen;
            info!("Fullscreen: {is_fullscreen}");
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(*is_fullscreen));
        }
        if self.quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

/// Drena o channel de falhas e retorna a última que merece aviso.
///
/// Linhas parciais (timeout no meio da linha) ficam só no log.
fn latest_notable_failure(failures: &Receiver<LineFailure>) -> Option<LineFailure> {
    failures.try_iter().filter(|f| !f.is_transient()).last()
}

/// Estado do dashboard.
pub struct HydroDashboard {
    config: AppConfig,
    theme: EguiTheme,
    connection: DeviceConnection,

    // Dados
    state: DeviceState,
    last_update: Option<Instant>,
    notice: Option<Notice>,

    // UI state
    is_fullscreen: bool,
}

impl HydroDashboard {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        connection: DeviceConnection,
    ) -> Self {
        let theme = EguiTheme::from_palette(&config.dashboard.colors);

        Self {
            config,
            theme,
            connection,
            state: DeviceState::new(),
            last_update: None,
            notice: None,
            is_fullscreen: false,
        }
    }

    /// Processa snapshots e falhas pendentes do link.
    fn poll_device(&mut self) {
        // Fica com o snapshot mais recente
        while let Ok(state) = self.connection.updates.try_recv() {
            self.state = state;
            self.last_update = Some(Instant::now());
        }
        if let Some(failure) = latest_notable_failure(&self.connection.failures) {
            self.notify(format!("Dispositivo: {failure}"), true);
        }
    }

    fn submit(&mut self, command: Command) {
        match self.connection.submit(command) {
            Some(Ok(())) => self.notify(format!("Comando {command} enviado"), false),
            Some(Err(e)) => self.notify(e.to_string(), true),
            None => self.notify(format!("Sem conexão: {command} não enviado"), true),
        }
    }

    fn notify(&mut self, text: String, is_error: bool) {
        self.notice = Some(Notice {
            text,
            is_error,
            at: Instant::now(),
        });
    }

    fn is_fresh(&self) -> bool {
        self.last_update
            .is_some_and(|t| t.elapsed().as_secs_f64() < self.config.dashboard.stale_after_secs)
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        let (text, color) = if let Some(ref e) = self.connection.error {
            (format!("✖ {e}"), self.theme.off)
        } else if self.is_fresh() {
            let elapsed = self.last_update.map(|t| t.elapsed()).unwrap_or_default();
            (
                format!(
                    "● {} | frame #{} | {:.0}ms atrás",
                    self.connection.source,
                    self.state.sequence,
                    elapsed.as_millis()
                ),
                self.theme.on,
            )
        } else if self.state.is_known() {
            (
                format!(
                    "○ {} sem dados recentes | último frame #{}",
                    self.connection.source, self.state.sequence
                ),
                self.theme.off,
            )
        } else {
            (
                format!("○ Aguardando dados de {}...", self.connection.source),
                self.theme.dim,
            )
        };
        ui.label(RichText::new(text).color(color).monospace());

        if let Some(ref notice) = self.notice {
            if notice.at.elapsed() < NOTICE_TTL {
                let color = if notice.is_error { self.theme.off } else { self.theme.dim };
                ui.label(RichText::new(&notice.text).color(color).monospace().size(12.0));
            }
        }
    }
}

impl eframe::App for HydroDashboard {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Poll link ──
        self.poll_device();

        // O link publica no máximo um snapshot por tick
        ctx.request_repaint_after(Duration::from_millis(100));

        // ── Estilo visual ──
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.theme.bg;
        visuals.window_fill = self.theme.card;
        visuals.override_text_color = Some(self.theme.text);
        ctx.set_visuals(visuals);

        // ── Atalhos de teclado ──
        Shortcuts::read(ctx).apply(ctx, &mut self.is_fullscreen);

        let mut clicked = None;

        // ── Painel central ──
        egui::CentralPanel::default().show(ctx, |ui: &mut egui::Ui| {
            // ── Título ──
            ui.add_space(12.0);
            ui.vertical_centered(|ui: &mut egui::Ui| {
                ui.label(
                    RichText::new("HYDROPONICS CONTROL DASHBOARD")
                        .color(self.theme.accent)
                        .size(26.0)
                        .strong(),
                );
                self.render_status(ui);
            });

            ui.add_space(16.0);

            // ── Sensores | Controles ──
            ui.columns(2, |cols| {
                panels::render_sensors(&mut cols[0], &self.state, &self.theme);
                clicked = panels::render_controls(&mut cols[1], &self.state, &self.theme);
            });

            // ── Help bar (fundo) ──
            ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui: &mut egui::Ui| {
                ui.label(
                    RichText::new("[F] Fullscreen | [Esc] Janela normal | [Q] Quit")
                        .color(self.theme.dim)
                        .monospace()
                        .size(10.0),
                );
            });
        });

        if let Some(command) = clicked {
            self.submit(command);
        }
    }
}
