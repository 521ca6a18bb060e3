//! Cards do dashboard renderizados com egui.

use crate::theme_egui::EguiTheme;
use egui::{RichText, Ui};
use hydro_core::protocol::Command;
use hydro_core::types::{DeviceState, UNKNOWN_VALUE};

const BUTTON_SIZE: [f32; 2] = [120.0, 28.0];
const INDICATOR_SIZE: [f32; 2] = [60.0, 36.0];

// ──────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────

fn card_frame(ui: &mut Ui, title: &str, theme: &EguiTheme, add_body: impl FnOnce(&mut Ui)) {
    egui::Frame::new()
        .fill(theme.card)
        .corner_radius(6.0)
        .inner_margin(16.0)
        .show(ui, |ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(title).color(theme.text).strong().size(18.0));
            });
            ui.add_space(12.0);
            add_body(ui);
        });
}

fn sensor_row(ui: &mut Ui, label: &str, value: &str, theme: &EguiTheme) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(label).color(theme.text).size(16.0));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            ui.label(RichText::new(value).color(theme.accent).strong().size(22.0));
        });
    });
    ui.add_space(14.0);
}

/// Anexa a unidade apenas a valores conhecidos.
fn with_unit(value: &str, unit: &str) -> String {
    if value == UNKNOWN_VALUE {
        value.to_string()
    } else {
        format!("{value} {unit}")
    }
}

fn indicator(ui: &mut Ui, on: Option<bool>, theme: &EguiTheme) {
    let (rect, _) = ui.allocate_exact_size(INDICATOR_SIZE.into(), egui::Sense::hover());
    let color = theme.status_color(on.unwrap_or(false));
    ui.painter().rect_filled(rect, 4.0, color);

    let label = match on {
        Some(true) => "ON",
        Some(false) => "OFF",
        None => UNKNOWN_VALUE,
    };
    ui.label(RichText::new(label).color(color).strong().size(14.0));
}

/// Seção de um atuador: título, indicador e botões. Retorna o comando clicado.
fn actuator_section(
    ui: &mut Ui,
    title: &str,
    on: Option<bool>,
    buttons: &[(&str, Command)],
    theme: &EguiTheme,
) -> Option<Command> {
    let mut clicked = None;
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(title).color(theme.text).strong().size(16.0));
        ui.add_space(4.0);
        indicator(ui, on, theme);
        ui.add_space(4.0);
        for (label, command) in buttons {
            if ui.add_sized(BUTTON_SIZE, egui::Button::new(*label)).clicked() {
                clicked = Some(*command);
            }
        }
    });
    clicked
}

// ──────────────────────────────────────────
// Sensor Card
// ──────────────────────────────────────────

pub fn render_sensors(ui: &mut Ui, state: &DeviceState, theme: &EguiTheme) {
    card_frame(ui, "Sensor Readings", theme, |ui: &mut Ui| {
        sensor_row(ui, "pH Level", state.ph(), theme);
        sensor_row(ui, "EC / TDS", state.tds(), theme);
        sensor_row(ui, "Temperature", &with_unit(state.temperature(), "°C"), theme);
        sensor_row(ui, "Humidity", &with_unit(state.humidity(), "%"), theme);
    });
}

// ──────────────────────────────────────────
// Control Card
// ──────────────────────────────────────────

pub fn render_controls(ui: &mut Ui, state: &DeviceState, theme: &EguiTheme) -> Option<Command> {
    let actuators = state.actuators();
    let mut clicked = None;

    card_frame(ui, "System Controls", theme, |ui: &mut Ui| {
        clicked = actuator_section(
            ui,
            "PUMP",
            actuators.map(|a| a.pump),
            &[("ON", Command::PumpOn), ("OFF", Command::PumpOff)],
            theme,
        );
        ui.add_space(24.0);
        let fan = actuator_section(
            ui,
            "FAN",
            actuators.map(|a| a.fan),
            &[
                ("ON", Command::FanOn),
                ("OFF", Command::FanOff),
                ("AUTO", Command::FanAuto),
            ],
            theme,
        );
        clicked = clicked.or(fan);
    });

    clicked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_is_only_added_to_known_values() {
        assert_eq!(with_unit("24.3", "°C"), "24.3 °C");
        assert_eq!(with_unit(UNKNOWN_VALUE, "%"), UNKNOWN_VALUE);
    }
}
