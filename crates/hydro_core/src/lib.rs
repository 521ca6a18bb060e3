//! # Hydro Core
//!
//! Crate compartilhada que define as estruturas de dados, o protocolo de
//! linha do microcontrolador, a configuração TOML e a paleta de cores do
//! sistema de Hidroponia. Não faz I/O de dispositivo.
//!
//! ## Módulos
//! - [`types`] – Leituras, estado dos atuadores e [`DeviceState`]
//! - [`protocol`] – Parser de frames `CHAVE:VALOR` e tokens de comando
//! - [`config`] – Configuração unificada via TOML
//! - [`theme`] – Paleta de cores do dashboard

pub mod types;
pub mod protocol;
pub mod config;
pub mod theme;

// Re-exports convenientes
pub use types::{ActuatorStatus, DeviceState, Frame, SensorReading};
pub use protocol::{Command, FrameKey, ParseError, parse_frame};
pub use config::{AppConfig, DashboardConfig, PollConfig, SerialConfig};
