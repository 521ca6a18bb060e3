//! Paleta de cores do dashboard.
//!
//! As cores ficam em hex string para poderem ser sobrescritas no `config.toml`.
//! A conversão para `egui::Color32` é feita no dashboard.

use serde::{Deserialize, Serialize};

/// Cor em formato hex string (ex: "#14b8a6").
pub type ColorHex = String;

/// Paleta completa do dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Palette {
    /// Fundo da janela
    pub bg: ColorHex,
    /// Fundo dos cards
    pub card: ColorHex,
    /// Destaque (título e valores)
    pub accent: ColorHex,
    /// Indicador ligado
    pub on: ColorHex,
    /// Indicador desligado
    pub off: ColorHex,
    /// Texto comum
    pub text: ColorHex,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            bg: "#0f172a".into(),
            card: "#1e293b".into(),
            accent: "#14b8a6".into(),
            on: "#22c55e".into(),
            off: "#ef4444".into(),
            text: "#f8fafc".into(),
        }
    }
}

impl Palette {
    /// Lista `(nome, valor)` das cores que não são hex válido.
    pub fn invalid_colors(&self) -> Vec<(&'static str, &str)> {
        [
            ("bg", &self.bg),
            ("card", &self.card),
            ("accent", &self.accent),
            ("on", &self.on),
            ("off", &self.off),
            ("text", &self.text),
        ]
        .into_iter()
        .filter(|(_, hex)| parse_hex(hex).is_none())
        .map(|(name, hex)| (name, hex.as_str()))
        .collect()
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Converte uma string hex "#RRGGBB" para tupla (r, g, b).
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    parse_hex(hex).unwrap_or((255, 255, 255)) // fallback branco
}
