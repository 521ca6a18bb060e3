//! Conexão do dashboard com o dispositivo (serial ou simulado).

use crate::simulate::{self, SimulatedDevice};
use crossbeam_channel::{Receiver, never};
use hydro_core::config::AppConfig;
use hydro_core::protocol::Command;
use hydro_core::types::DeviceState;
use hydro_link::{DeviceLink, DispatchError, LineFailure, LinkError, MemoryTransport};
use tracing::{error, info};

/// Canais e link consumidos pela UI.
pub struct DeviceConnection {
    link: Option<DeviceLink>,
    pub updates: Receiver<DeviceState>,
    pub failures: Receiver<LineFailure>,
    /// Erro fatal de abertura da porta, exibido ao operador
    pub error: Option<String>,
    /// Descrição da origem dos dados ("COM3", "simulador"…)
    pub source: String,
    _simulator: Option<SimulatedDevice>,
}

impl DeviceConnection {
    /// Abre o link. Falha na porta não derruba o processo: a UI mostra o erro.
    pub fn open(config: &AppConfig, simulate: bool) -> Self {
        let result = if simulate {
            Self::open_simulated(config)
        } else {
            Self::open_serial(config)
        };

        result.unwrap_or_else(|e| {
            error!("Dispositivo indisponível: {e}");
            Self {
                link: None,
                updates: never(),
                failures: never(),
                error: Some(e.to_string()),
                source: config.serial.port.clone(),
                _simulator: None,
            }
        })
    }

    fn open_serial(config: &AppConfig) -> Result<Self, LinkError> {
        let mut builder = DeviceLink::builder(&config.poll);
        let updates = builder.subscribe();
        let failures = builder.failures();
        let link = builder.connect(&config.serial)?;

        Ok(Self {
            link: Some(link),
            updates,
            failures,
            error: None,
            source: config.serial.port.clone(),
            _simulator: None,
        })
    }

    fn open_simulated(config: &AppConfig) -> Result<Self, LinkError> {
        let device = MemoryTransport::new();
        let simulator = simulate::spawn(device.clone(), config.poll.interval())
            .map_err(|e| LinkError::Spawn(e.to_string()))?;

        let mut builder = DeviceLink::builder(&config.poll);
        let updates = builder.subscribe();
        let failures = builder.failures();
        let link = builder.spawn(device.clone(), device)?;
        info!("Modo simulação: nenhuma porta serial será aberta");

        Ok(Self {
            link: Some(link),
            updates,
            failures,
            error: None,
            source: "simulador".into(),
            _simulator: Some(simulator),
        })
    }

    /// Envia um comando; sem link, nada é enviado.
    pub fn submit(&self, command: Command) -> Option<Result<(), DispatchError>> {
        self.link.as_ref().map(|link| link.submit(command))
    }
}
