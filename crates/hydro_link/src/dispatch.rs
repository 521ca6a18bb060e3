//! Envio de comandos do operador.
//!
//! Entrega no máximo uma vez: o fio não tem confirmação, então o resultado só
//! aparece num frame posterior. Falhas voltam ao chamador, sem retry.

use crate::transport::{LineWriter, TransportError};
use hydro_core::protocol::Command;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Falha ao enviar um comando.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Falha ao enviar {command}: {source}")]
pub struct DispatchError {
    pub command: Command,
    #[source]
    pub source: TransportError,
}

/// Serializa escritas concorrentes no lado de escrita do transporte.
pub struct CommandDispatcher {
    writer: Mutex<Box<dyn LineWriter>>,
}

impl CommandDispatcher {
    pub fn new(writer: impl LineWriter + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Escreve o token do comando seguido de `\n`.
    pub fn send(&self, command: Command) -> Result<(), DispatchError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_line(command.token()).map_err(|source| {
            warn!("Comando {command} não enviado: {source}");
            DispatchError { command, source }
        })?;
        info!("→ {command}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;
    use std::sync::Arc;

    #[test]
    fn each_command_writes_its_token_and_newline() {
        for command in Command::ALL {
            let device = MemoryTransport::new();
            let dispatcher = CommandDispatcher::new(device.clone());

            dispatcher.send(command).unwrap();

            let expected = format!("{}\n", command.token());
            assert_eq!(device.written_bytes(), expected.as_bytes());
        }
    }

    #[test]
    fn pump_on_is_exact_bytes() {
        let device = MemoryTransport::new();
        CommandDispatcher::new(device.clone())
            .send(Command::PumpOn)
            .unwrap();
        assert_eq!(device.written_bytes(), b"PUMP_ON\n");
    }

    #[test]
    fn write_failure_becomes_dispatch_error_without_retry() {
        let device = MemoryTransport::new();
        device.set_fail_writes(true);
        let dispatcher = CommandDispatcher::new(device.clone());

        let err = dispatcher.send(Command::FanAuto).unwrap_err();

        assert_eq!(err.command, Command::FanAuto);
        assert!(matches!(err.source, TransportError::Write(_)));

        // Nenhum reenvio automático quando a porta volta
        device.set_fail_writes(false);
        assert!(device.written_bytes().is_empty());
    }

    #[test]
    fn concurrent_sends_never_interleave() {
        let device = MemoryTransport::new();
        let dispatcher = Arc::new(CommandDispatcher::new(device.clone()));

        let handles: Vec<_> = Command::ALL
            .into_iter()
            .map(|command| {
                let dispatcher = Arc::clone(&dispatcher);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        dispatcher.send(command).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = device.take_written_lines();
        assert_eq!(lines.len(), 100);
        assert!(lines.iter().all(|l| l.parse::<Command>().is_ok()));
    }
}
