//! Canal de diagnósticos para falhas por linha.
//!
//! Falhas de leitura e de parse nunca alteram o [`DeviceState`], mas sempre
//! passam por um [`DiagnosticsSink`] para que um dispositivo com defeito seja
//! percebido pelo operador.
//!
//! [`DeviceState`]: hydro_core::types::DeviceState

use crate::transport::TransportError;
use crossbeam_channel::Sender;
use hydro_core::protocol::ParseError;
use tracing::{debug, warn};

/// Falha não fatal ocorrida durante um tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineFailure {
    #[error("Falha ao consultar a porta: {0}")]
    Status(TransportError),

    #[error("Falha de leitura: {0}")]
    Read(TransportError),

    #[error("Linha rejeitada: {error} em {line:?}")]
    Parse { line: String, error: ParseError },
}

impl LineFailure {
    /// Linha parcial: normal enquanto o dispositivo ainda está escrevendo.
    pub fn is_transient(&self) -> bool {
        matches!(self, LineFailure::Read(TransportError::ReadTimeout))
    }
}

/// Destino dos diagnósticos.
pub trait DiagnosticsSink: Send {
    fn report(&mut self, failure: &LineFailure);
}

/// Registra falhas via `tracing`.
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&mut self, failure: &LineFailure) {
        if failure.is_transient() {
            debug!("{failure}");
        } else {
            warn!("{failure}");
        }
    }
}

/// Encaminha falhas para a apresentação (non-blocking).
impl DiagnosticsSink for Sender<LineFailure> {
    fn report(&mut self, failure: &LineFailure) {
        if self.try_send(failure.clone()).is_err() {
            debug!("Channel de diagnósticos cheio, descartando falha");
        }
    }
}

/// Fan-out para vários destinos, em ordem.
impl DiagnosticsSink for Vec<Box<dyn DiagnosticsSink>> {
    fn report(&mut self, failure: &LineFailure) {
        for sink in self.iter_mut() {
            sink.report(failure);
        }
    }
}
