//! Definição de tipos/structs para leituras do dispositivo.
//!
//! Os valores dos sensores são mantidos como texto de exibição: o core não
//! interpreta unidades nem faixas numéricas, isso fica com a apresentação.

use serde::{Deserialize, Serialize};

/// Texto exibido enquanto nenhum frame válido foi recebido.
pub const UNKNOWN_VALUE: &str = "--";

// ──────────────────────────────────────────────
// Sensores
// ──────────────────────────────────────────────

/// Leitura dos sensores reportada pelo microcontrolador.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SensorReading {
    /// pH da solução
    pub ph: String,
    /// EC / TDS (ppm)
    pub tds: String,
    /// Temperatura do ar (°C)
    pub temperature: String,
    /// Umidade relativa (%)
    pub humidity: String,
}

// ──────────────────────────────────────────────
// Atuadores
// ──────────────────────────────────────────────

/// Estado dos atuadores como reportado pelo dispositivo.
///
/// O modo AUTO do fan é apenas um comando; o dispositivo só reporta ligado/desligado.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActuatorStatus {
    pub pump: bool,
    pub fan: bool,
}

// ──────────────────────────────────────────────
// Frame
// ──────────────────────────────────────────────

/// Uma linha serial validada e estruturada.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    pub reading: SensorReading,
    pub actuators: ActuatorStatus,
}

// ──────────────────────────────────────────────
// Estado do dispositivo
// ──────────────────────────────────────────────

/// Último frame confirmado + número de sequência.
///
/// `frame == None` é o sentinela "desconhecido" usado desde a inicialização
/// até o primeiro commit. Cada commit incrementa `sequence` em exatamente 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceState {
    pub frame: Option<Frame>,
    pub sequence: u64,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitui o frame atual e avança a sequência. Retorna a nova sequência.
    pub fn commit(&mut self, frame: Frame) -> u64 {
        self.frame = Some(frame);
        self.sequence += 1;
        self.sequence
    }

    pub fn is_known(&self) -> bool {
        self.frame.is_some()
    }

    pub fn reading(&self) -> Option<&SensorReading> {
        self.frame.as_ref().map(|f| &f.reading)
    }

    pub fn actuators(&self) -> Option<ActuatorStatus> {
        self.frame.as_ref().map(|f| f.actuators)
    }

    pub fn ph(&self) -> &str {
        self.reading().map_or(UNKNOWN_VALUE, |r| r.ph.as_str())
    }

    pub fn tds(&self) -> &str {
        self.reading().map_or(UNKNOWN_VALUE, |r| r.tds.as_str())
    }

    pub fn temperature(&self) -> &str {
        self.reading().map_or(UNKNOWN_VALUE, |r| r.temperature.as_str())
    }

    pub fn humidity(&self) -> &str {
        self.reading().map_or(UNKNOWN_VALUE, |r| r.humidity.as_str())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
