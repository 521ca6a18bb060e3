//! Configuração unificada via TOML.
//!
//! Porta serial, cadência do poll e aparência do dashboard num único `config.toml`.

use crate::theme::Palette;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Nome de porta que seleciona a primeira porta serial disponível.
pub const AUTO_PORT: &str = "auto";

/// Limites aceitos para o intervalo do poll (ms).
pub const MIN_POLL_INTERVAL_MS: u64 = 10;
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Limite aceito para o atraso de estabilização (ms).
const MAX_SETTLE_MS: u64 = 30_000;

/// Configuração da conexão serial.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Nome da porta ("COM3", "/dev/ttyUSB0" ou "auto")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Timeout de leitura de uma linha (ms)
    pub read_timeout_ms: u64,
    /// Pausa após abrir a porta enquanto o microcontrolador reinicia (ms)
    pub settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "COM3".into(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_ms: 2000,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn is_auto(&self) -> bool {
        self.port.eq_ignore_ascii_case(AUTO_PORT)
    }
}

/// Configuração do loop de polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Intervalo entre ticks (ms)
    pub interval_ms: u64,
    /// Capacidade dos channels de snapshots e diagnósticos
    pub channel_capacity: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            channel_capacity: 64,
        }
    }
}

impl PollConfig {
    /// Intervalo entre ticks, nunca abaixo de [`MIN_POLL_INTERVAL_MS`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

/// Configuração do Dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Título da janela
    pub title: String,
    /// Inicia com a janela maximizada
    pub start_maximized: bool,
    /// Segundos sem snapshot até considerar os dados desatualizados
    pub stale_after_secs: f64,
    /// Cores
    pub colors: Palette,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Hydroponics Monitoring System".into(),
            start_maximized: true,
            stale_after_secs: 5.0,
            colors: Palette::default(),
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub poll: PollConfig,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.serial.port.trim().is_empty() {
            errors.push("Porta serial não pode ser vazia".into());
        }
        if self.serial.baud_rate == 0 {
            errors.push("Baud rate não pode ser 0".into());
        }
        if self.serial.read_timeout_ms == 0 {
            errors.push("Timeout de leitura não pode ser 0".into());
        }
        if self.serial.settle_ms > MAX_SETTLE_MS {
            errors.push(format!(
                "Atraso de estabilização inválido: {} ms (máximo {MAX_SETTLE_MS})",
                self.serial.settle_ms
            ));
        }
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll.interval_ms) {
            errors.push(format!(
                "Intervalo do poll inválido: {} ms ({MIN_POLL_INTERVAL_MS}–{MAX_POLL_INTERVAL_MS})",
                self.poll.interval_ms
            ));
        }
        if self.poll.channel_capacity == 0 {
            errors.push("Capacidade do channel não pode ser 0".into());
        }
        for (name, hex) in self.dashboard.colors.invalid_colors() {
            errors.push(format!("Cor inválida em dashboard.colors.{name}: {hex:?}"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn defaults_match_device_firmware() {
        let config = AppConfig::default();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.settle_delay(), Duration::from_secs(2));
        assert_eq!(config.poll.interval(), Duration::from_secs(1));
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.serial.port, parsed.serial.port);
        assert_eq!(config.dashboard.colors, parsed.dashboard.colors);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r##"
[serial]
port = "/dev/ttyACM0"

[dashboard.colors]
accent = "#00d9ff"
"##;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        // Outros campos devem ter valor padrão
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.dashboard.colors.accent, "#00d9ff");
        assert_eq!(config.dashboard.colors.bg, "#0f172a");
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = AppConfig::default();
        config.serial.port = "  ".into();
        config.serial.baud_rate = 0;
        config.poll.interval_ms = 0;
        config.poll.channel_capacity = 0;
        config.serial.settle_ms = 60_000;
        config.serial.read_timeout_ms = 0;
        assert_eq!(config.validate().len(), 6);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let poll = PollConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(poll.interval(), Duration::from_millis(MIN_POLL_INTERVAL_MS));
    }

    #[test]
    fn auto_port_is_case_insensitive() {
        let serial = SerialConfig {
            port: "AUTO".into(),
            ..Default::default()
        };
        assert!(serial.is_auto());
        assert!(!SerialConfig::default().is_auto());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/hydro/config.toml"));
        assert_eq!(config.serial.port, "COM3");
    }
}
