//! Poll loop: transforma bytes da serial em [`DeviceState`].
//!
//! A cada tick consome no máximo uma linha. Um backlog é drenado nos ticks
//! seguintes, mantendo o loop responsivo a pedidos de shutdown.
//!
//! [`DeviceState`]: hydro_core::types::DeviceState

use crate::diagnostics::{DiagnosticsSink, LineFailure};
use crate::store::StateStore;
use crate::transport::LineReader;
use crossbeam_channel::{Receiver, TryRecvError, select};
use hydro_core::protocol::parse_frame;
use std::time::Instant;
use tracing::{debug, info};

/// Resultado de um tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nenhum byte disponível
    Idle,
    /// Frame aplicado; carrega a nova sequência
    Committed(u64),
    /// Falha de leitura ou parse (reportada aos diagnósticos)
    Failed,
}

/// Contadores do loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ticks: u64,
    pub idle: u64,
    pub committed: u64,
    pub failed: u64,
}

pub struct PollLoop<R: LineReader> {
    reader: R,
    store: StateStore,
    diagnostics: Box<dyn DiagnosticsSink>,
    stats: PollStats,
}

impl<R: LineReader> PollLoop<R> {
    pub fn new(reader: R, store: StateStore, diagnostics: Box<dyn DiagnosticsSink>) -> Self {
        Self {
            reader,
            store,
            diagnostics,
            stats: PollStats::default(),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Executa um tick: no máximo uma linha lida, parseada e aplicada.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        match self.reader.has_pending_data() {
            Ok(true) => {}
            Ok(false) => {
                self.stats.idle += 1;
                return TickOutcome::Idle;
            }
            Err(e) => return self.fail(LineFailure::Status(e)),
        }

        let line = match self.reader.read_line() {
            Ok(line) => line,
            Err(e) => return self.fail(LineFailure::Read(e)),
        };

        match parse_frame(&line) {
            Ok(frame) => {
                let sequence = self.store.commit(frame);
                self.stats.committed += 1;
                debug!("← #{sequence} {line}");
                TickOutcome::Committed(sequence)
            }
            Err(error) => self.fail(LineFailure::Parse { line, error }),
        }
    }

    fn fail(&mut self, failure: LineFailure) -> TickOutcome {
        self.stats.failed += 1;
        self.diagnostics.report(&failure);
        TickOutcome::Failed
    }

    /// Roda até o shutdown ser pedido (ou o ticker fechar).
    ///
    /// O pedido de shutdown é checado antes de cada tick. O leitor é liberado
    /// (porta fechada) quando o loop retorna.
    pub fn run(mut self, ticker: &Receiver<Instant>, shutdown: &Receiver<()>) -> PollStats {
        info!("Poll loop iniciado");

        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(ticker) -> tick => {
                    if tick.is_err() || shutdown_requested(shutdown) {
                        break;
                    }
                    self.tick();
                }
            }
        }

        let stats = self.stats;
        info!(
            "Poll loop encerrado – {} ticks | {} frames | {} falhas | {} ociosos",
            stats.ticks, stats.committed, stats.failed, stats.idle
        );
        stats
    }
}

fn shutdown_requested(shutdown: &Receiver<()>) -> bool {
    matches!(
        shutdown.try_recv(),
        Ok(()) | Err(TryRecvError::Disconnected)
    )
}
