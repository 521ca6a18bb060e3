//! Conversão da paleta para `egui::Color32`.

use egui::Color32;
use hydro_core::theme::{Palette, hex_to_rgb};

/// Paleta convertida para tipos egui.
#[derive(Clone)]
pub struct EguiTheme {
    pub bg: Color32,
    pub card: Color32,
    pub accent: Color32,
    pub on: Color32,
    pub off: Color32,
    pub text: Color32,
    pub dim: Color32,
}

impl EguiTheme {
    /// Converte uma [`Palette`] do core para [`EguiTheme`].
    pub fn from_palette(p: &Palette) -> Self {
        let text = hex_color(&p.text);
        Self {
            bg: hex_color(&p.bg),
            card: hex_color(&p.card),
            accent: hex_color(&p.accent),
            on: hex_color(&p.on),
            off: hex_color(&p.off),
            text,
            dim: text.gamma_multiply(0.5),
        }
    }

    /// Verde quando ligado, vermelho quando desligado.
    pub fn status_color(&self, on: bool) -> Color32 {
        if on { self.on } else { self.off }
    }
}

fn hex_color(hex: &str) -> Color32 {
    let (r, g, b) = hex_to_rgb(hex);
    Color32::from_rgb(r, g, b)
}
