//! Transporte em memória (loopback).
//!
//! Substitui a porta serial em testes e no modo de simulação: linhas de
//! entrada são enfileiradas por quem simula o dispositivo e os bytes escritos
//! ficam registrados. Clones compartilham o mesmo estado, então um clone pode
//! servir de leitor, outro de escritor e um terceiro de "dispositivo".

use crate::transport::{LineReader, LineWriter, TransportError, encode_line};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Shared {
    inbound: VecDeque<Result<String, TransportError>>,
    written: Vec<u8>,
    reads: usize,
    fail_writes: bool,
}

#[derive(Clone, Default)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enfileira uma linha como se o dispositivo a tivesse enviado.
    pub fn push_line(&self, line: impl Into<String>) {
        self.lock().inbound.push_back(Ok(line.into()));
    }

    /// Enfileira uma falha de leitura.
    pub fn push_error(&self, error: TransportError) {
        self.lock().inbound.push_back(Err(error));
    }

    /// Linhas ainda não consumidas.
    pub fn pending(&self) -> usize {
        self.lock().inbound.len()
    }

    /// Quantas vezes `read_line` foi chamada.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    /// Todos os bytes escritos até agora.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Linhas escritas (sem terminador), drenando o registro.
    pub fn take_written_lines(&self) -> Vec<String> {
        let bytes = std::mem::take(&mut self.lock().written);
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Faz as próximas escritas falharem (simula cabo desconectado).
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }
}

impl LineReader for MemoryTransport {
    fn has_pending_data(&mut self) -> Result<bool, TransportError> {
        Ok(!self.lock().inbound.is_empty())
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        let mut shared = self.lock();
        shared.reads += 1;
        shared
            .inbound
            .pop_front()
            .unwrap_or(Err(TransportError::ReadTimeout))
    }
}

impl LineWriter for MemoryTransport {
    fn write_line(&mut self, text: &str) -> Result<(), TransportError> {
        let mut shared = self.lock();
        if shared.fail_writes {
            return Err(TransportError::Write("porta desconectada".into()));
        }
        shared.written.extend_from_slice(&encode_line(text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_queue() {
        let device = MemoryTransport::new();
        let mut reader = device.clone();

        assert!(!reader.has_pending_data().unwrap());
        device.push_line("PH:6.5");
        assert!(reader.has_pending_data().unwrap());
        assert_eq!(reader.read_line().unwrap(), "PH:6.5");
        assert_eq!(reader.reads(), 1);
    }

    #[test]
    fn empty_read_times_out() {
        let mut reader = MemoryTransport::new();
        assert_eq!(reader.read_line(), Err(TransportError::ReadTimeout));
    }

    #[test]
    fn records_written_lines() {
        let device = MemoryTransport::new();
        let mut writer = device.clone();
        writer.write_line("FAN_ON").unwrap();
        writer.write_line("FAN_AUTO").unwrap();

        assert_eq!(device.written_bytes(), b"FAN_ON\nFAN_AUTO\n");
        assert_eq!(device.take_written_lines(), ["FAN_ON", "FAN_AUTO"]);
        assert!(device.written_bytes().is_empty());
    }

    #[test]
    fn write_failure_is_reported() {
        let device = MemoryTransport::new();
        device.set_fail_writes(true);
        assert!(matches!(
            device.clone().write_line("PUMP_ON"),
            Err(TransportError::Write(_))
        ));
        assert!(device.written_bytes().is_empty());
    }
}
