//! Fachada do core: liga transporte, poll loop e dispatcher.
//!
//! ```text
//!  Transport ──▶ PollLoop ──▶ parse_frame ──▶ StateStore ──▶ observadores
//!      ▲
//!      └──────── CommandDispatcher ◀── submit(Command)
//! ```

use crate::diagnostics::{DiagnosticsSink, LineFailure, TracingDiagnostics};
use crate::dispatch::{CommandDispatcher, DispatchError};
use crate::poll::{PollLoop, PollStats};
use crate::store::{LatestState, StateObserver, StateStore};
use crate::transport::{LineReader, LineWriter, SerialTransport, TransportError};
use crossbeam_channel::{Receiver, Sender, bounded};
use hydro_core::config::{PollConfig, SerialConfig};
use hydro_core::protocol::Command;
use hydro_core::types::DeviceState;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

/// Erros ao iniciar o link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Falha ao criar thread de polling: {0}")]
    Spawn(String),
}

/// Configura observadores e diagnósticos antes de iniciar o poll loop.
pub struct LinkBuilder {
    interval: Duration,
    capacity: usize,
    store: StateStore,
    sinks: Vec<Box<dyn DiagnosticsSink>>,
    latest: LatestState,
}

impl LinkBuilder {
    fn new(config: &PollConfig) -> Self {
        let latest = LatestState::default();
        let mut store = StateStore::new();
        store.register(latest.clone());
        Self {
            interval: config.interval(),
            capacity: config.channel_capacity.max(1),
            store,
            sinks: vec![Box::new(TracingDiagnostics)],
            latest,
        }
    }

    /// Assina snapshots via channel (descartados se o consumidor atrasar).
    pub fn subscribe(&mut self) -> Receiver<DeviceState> {
        let (tx, rx) = bounded::<DeviceState>(self.capacity);
        self.store.register(tx);
        rx
    }

    pub fn observe(&mut self, observer: impl StateObserver + 'static) -> &mut Self {
        self.store.register(observer);
        self
    }

    /// Canal com as falhas por linha, para exibição ao operador.
    pub fn failures(&mut self) -> Receiver<LineFailure> {
        let (tx, rx): (Sender<LineFailure>, _) = bounded(self.capacity);
        self.sinks.push(Box::new(tx));
        rx
    }

    pub fn diagnostics(&mut self, sink: impl DiagnosticsSink + 'static) -> &mut Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn latest(&self) -> LatestState {
        self.latest.clone()
    }

    /// Abre a porta serial configurada e inicia o link.
    ///
    /// Falha ao abrir a porta é fatal para o link e volta ao chamador.
    pub fn connect(self, serial: &SerialConfig) -> Result<DeviceLink, LinkError> {
        let (reader, writer) = SerialTransport::open(serial)?.into_split();
        self.spawn(reader, writer)
    }

    /// Inicia a thread de polling sobre um transporte já aberto.
    pub fn spawn<R, W>(self, reader: R, writer: W) -> Result<DeviceLink, LinkError>
    where
        R: LineReader + 'static,
        W: LineWriter + 'static,
    {
        let poll = PollLoop::new(reader, self.store, Box::new(self.sinks));
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let ticker = crossbeam_channel::tick(self.interval);

        let handle = std::thread::Builder::new()
            .name("serial-poll".into())
            .spawn(move || poll.run(&ticker, &shutdown_rx))
            .map_err(|e| LinkError::Spawn(e.to_string()))?;

        info!("Link iniciado – tick de {} ms", self.interval.as_millis());

        Ok(DeviceLink {
            dispatcher: Arc::new(CommandDispatcher::new(writer)),
            latest: self.latest,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }
}

/// Link ativo com o dispositivo.
///
/// Dropar o link pede o shutdown e aguarda a thread, liberando a porta.
pub struct DeviceLink {
    dispatcher: Arc<CommandDispatcher>,
    latest: LatestState,
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<PollStats>>,
}

impl DeviceLink {
    pub fn builder(config: &PollConfig) -> LinkBuilder {
        LinkBuilder::new(config)
    }

    /// Envia um comando de forma síncrona.
    pub fn submit(&self, command: Command) -> Result<(), DispatchError> {
        self.dispatcher.send(command)
    }

    pub fn dispatcher(&self) -> Arc<CommandDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Cópia do último estado confirmado.
    pub fn latest(&self) -> DeviceState {
        self.latest.get()
    }

    /// Encerra o poll loop e retorna seus contadores.
    pub fn shutdown(mut self) -> Option<PollStats> {
        self.stop()
    }

    fn stop(&mut self) -> Option<PollStats> {
        if let Some(tx) = self.shutdown_tx.take() {
            // Erro aqui só significa que o loop já terminou
            let _ = tx.send(());
        }
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("Thread de polling terminou com panic");
                None
            }
        }
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        self.stop();
    }
}
