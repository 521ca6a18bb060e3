//! Transporte serial orientado a linhas.
//!
//! O lado de leitura ([`LineReader`]) pertence exclusivamente à thread de
//! polling e o lado de escrita ([`LineWriter`]) ao [`CommandDispatcher`],
//! que serializa as escritas. Assim nenhum `read_line` se sobrepõe a outro
//! e nenhuma escrita se sobrepõe a outra.
//!
//! [`CommandDispatcher`]: crate::dispatch::CommandDispatcher

use hydro_core::config::SerialConfig;
use hydro_core::protocol::LINE_TERMINATOR;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use tracing::{debug, info};

/// Tamanho máximo de uma linha antes de descartá-la (bytes).
pub const MAX_LINE_LEN: usize = 1024;

const TERMINATOR: u8 = LINE_TERMINATOR as u8;

/// Erros do transporte.
///
/// Carregam apenas texto para poderem trafegar em channels (`Clone`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Falha ao abrir a porta {port}: {reason}")]
    Connection { port: String, reason: String },

    #[error("Nenhuma porta serial disponível")]
    NoPortAvailable,

    #[error("Timeout aguardando fim de linha")]
    ReadTimeout,

    #[error("Linha inválida: {0}")]
    Decode(String),

    #[error("Falha de escrita: {0}")]
    Write(String),

    #[error("Erro de I/O: {0}")]
    Io(String),
}

/// Lado de leitura do transporte.
pub trait LineReader: Send {
    /// Consulta sem bloquear se há ao menos um byte disponível.
    fn has_pending_data(&mut self) -> Result<bool, TransportError>;

    /// Lê uma linha terminada em `\n`, sem o terminador.
    ///
    /// Só deve ser chamada quando [`has_pending_data`](Self::has_pending_data)
    /// retornou `true`.
    fn read_line(&mut self) -> Result<String, TransportError>;
}

/// Lado de escrita do transporte.
pub trait LineWriter: Send {
    /// Escreve `text` seguido do terminador de linha.
    fn write_line(&mut self, text: &str) -> Result<(), TransportError>;
}

impl<T: LineReader + ?Sized> LineReader for Box<T> {
    fn has_pending_data(&mut self) -> Result<bool, TransportError> {
        (**self).has_pending_data()
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        (**self).read_line()
    }
}

impl<T: LineWriter + ?Sized> LineWriter for Box<T> {
    fn write_line(&mut self, text: &str) -> Result<(), TransportError> {
        (**self).write_line(text)
    }
}

// ──────────────────────────────────────────────
// Porta serial
// ──────────────────────────────────────────────

/// Conexão serial aberta e estabilizada.
pub struct SerialTransport {
    port_name: String,
    reader: SerialReader,
    writer: SerialWriter,
}

impl SerialTransport {
    /// Abre a porta, aguarda o reset do microcontrolador e descarta o lixo
    /// emitido durante o boot.
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let port_name = resolve_port(config)?;
        let connection_error = |e: serialport::Error| TransportError::Connection {
            port: port_name.clone(),
            reason: e.to_string(),
        };

        info!("Abrindo {port_name} @ {} baud", config.baud_rate);
        let port = serialport::new(&port_name, config.baud_rate)
            .timeout(config.read_timeout())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open()
            .map_err(connection_error)?;

        // O microcontrolador reinicia ao abrir a porta USB-serial
        debug!("Aguardando {} ms de estabilização", config.settle_ms);
        std::thread::sleep(config.settle_delay());

        if let Err(e) = port.clear(ClearBuffer::Input) {
            debug!("Não foi possível limpar o buffer de entrada: {e}");
        }

        let writer_port = port.try_clone().map_err(connection_error)?;
        info!("Porta {port_name} pronta");

        Ok(Self {
            port_name,
            reader: SerialReader::new(port),
            writer: SerialWriter { port: writer_port },
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Separa os lados de leitura e escrita (handles clonados da mesma porta).
    pub fn into_split(self) -> (SerialReader, SerialWriter) {
        (self.reader, self.writer)
    }
}

impl LineReader for SerialTransport {
    fn has_pending_data(&mut self) -> Result<bool, TransportError> {
        self.reader.has_pending_data()
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        self.reader.read_line()
    }
}

impl LineWriter for SerialTransport {
    fn write_line(&mut self, text: &str) -> Result<(), TransportError> {
        self.writer.write_line(text)
    }
}

/// Lado de leitura da porta serial.
pub struct SerialReader {
    lines: LineAssembler<Box<dyn SerialPort>>,
}

impl SerialReader {
    fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            lines: LineAssembler::new(port),
        }
    }
}

impl LineReader for SerialReader {
    fn has_pending_data(&mut self) -> Result<bool, TransportError> {
        if self.lines.has_buffered() {
            return Ok(true);
        }
        self.lines
            .get_ref()
            .bytes_to_read()
            .map(|n| n > 0)
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        self.lines.read_line()
    }
}

/// Monta linhas a partir de um fluxo de bytes com timeout.
///
/// Os bytes de uma linha incompleta sobrevivem a timeouts. Cada chamada lê
/// no máximo `MAX_LINE_LEN + 1` bytes, então um dispositivo que nunca envia
/// o terminador não prende o tick.
pub(crate) struct LineAssembler<R> {
    port: BufReader<R>,
    partial: Vec<u8>,
}

impl<R: Read> LineAssembler<R> {
    pub(crate) fn new(port: R) -> Self {
        Self {
            port: BufReader::new(port),
            partial: Vec::with_capacity(128),
        }
    }

    pub(crate) fn get_ref(&self) -> &R {
        self.port.get_ref()
    }

    /// Há bytes já lidos da porta aguardando no buffer interno.
    pub(crate) fn has_buffered(&self) -> bool {
        !self.port.buffer().is_empty()
    }

    pub(crate) fn read_line(&mut self) -> Result<String, TransportError> {
        let budget = (MAX_LINE_LEN + 1).saturating_sub(self.partial.len()) as u64;
        let result = (&mut self.port)
            .take(budget)
            .read_until(TERMINATOR, &mut self.partial);

        if self.partial.last() == Some(&TERMINATOR) {
            return decode_line(std::mem::take(&mut self.partial));
        }
        if self.partial.len() > MAX_LINE_LEN {
            let dropped = std::mem::take(&mut self.partial).len();
            return Err(TransportError::Decode(format!(
                "{dropped} bytes sem terminador descartados"
            )));
        }

        match result {
            Ok(_) => Err(TransportError::Io("conexão encerrada no meio da linha".into())),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Err(TransportError::ReadTimeout)
            }
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }
}

/// Lado de escrita da porta serial.
pub struct SerialWriter {
    port: Box<dyn SerialPort>,
}

impl LineWriter for SerialWriter {
    fn write_line(&mut self, text: &str) -> Result<(), TransportError> {
        self.port
            .write_all(&encode_line(text))
            .and_then(|_| self.port.flush())
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Lista os nomes das portas seriais disponíveis.
pub fn list_ports() -> Result<Vec<String>, TransportError> {
    let ports = serialport::available_ports().map_err(|e| TransportError::Io(e.to_string()))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

fn resolve_port(config: &SerialConfig) -> Result<String, TransportError> {
    if !config.is_auto() {
        return Ok(config.port.clone());
    }
    let port = list_ports()?
        .into_iter()
        .next()
        .ok_or(TransportError::NoPortAvailable)?;
    info!("Porta detectada automaticamente: {port}");
    Ok(port)
}

/// Decodifica uma linha completa em UTF-8, sem `\r\n`.
pub(crate) fn decode_line(bytes: Vec<u8>) -> Result<String, TransportError> {
    if bytes.len() > MAX_LINE_LEN {
        return Err(TransportError::Decode(format!(
            "linha com {} bytes excede o limite de {MAX_LINE_LEN}",
            bytes.len()
        )));
    }
    let mut line = String::from_utf8(bytes).map_err(|e| TransportError::Decode(e.to_string()))?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Bytes enviados ao fio para uma linha de texto.
pub(crate) fn encode_line(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(TERMINATOR);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Porta roteirizada: cada item é entregue por um `read` (ou vira erro).
    #[derive(Default)]
    struct ScriptedPort {
        script: VecDeque<io::Result<Vec<u8>>>,
        delivered: usize,
    }

    impl ScriptedPort {
        fn chunk(mut self, bytes: &[u8]) -> Self {
            self.script.push_back(Ok(bytes.to_vec()));
            self
        }

        fn timeout(mut self) -> Self {
            self.script.push_back(Err(ErrorKind::TimedOut.into()));
            self
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                // Fim do roteiro: EOF
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.script.push_front(Ok(chunk.split_off(n)));
                    }
                    self.delivered += n;
                    Ok(n)
                }
            }
        }
    }

    #[test]
    fn timeout_mid_line_keeps_partial_bytes() {
        let port = ScriptedPort::default()
            .chunk(b"PH:6.5,TDS")
            .timeout()
            .chunk(b":850\r\n");
        let mut lines = LineAssembler::new(port);

        assert_eq!(lines.read_line(), Err(TransportError::ReadTimeout));
        assert_eq!(lines.read_line().unwrap(), "PH:6.5,TDS:850");
    }

    #[test]
    fn reads_one_line_per_call() {
        let port = ScriptedPort::default().chunk(b"PUMP:1\nFAN:0\n");
        let mut lines = LineAssembler::new(port);

        assert_eq!(lines.read_line().unwrap(), "PUMP:1");
        assert!(lines.has_buffered());
        assert_eq!(lines.read_line().unwrap(), "FAN:0");
        assert!(!lines.has_buffered());
    }

    #[test]
    fn endless_line_is_bounded_and_discarded() {
        let port = ScriptedPort::default()
            .chunk(&vec![b'A'; 8 * 1024 * 1024])
            .timeout();
        let mut lines = LineAssembler::new(port);

        assert!(matches!(lines.read_line(), Err(TransportError::Decode(_))));
        assert!(lines.partial.is_empty());
        // Só o que cabe no buffer interno foi puxado da porta
        assert!(lines.get_ref().delivered <= 16 * 1024);
    }

    #[test]
    fn reader_recovers_after_discarding_long_line() {
        let mut noise = vec![b'A'; MAX_LINE_LEN + 1];
        noise.push(b'\n');
        let port = ScriptedPort::default().chunk(&noise).chunk(b"PH:7.0\n");
        let mut lines = LineAssembler::new(port);

        assert!(matches!(lines.read_line(), Err(TransportError::Decode(_))));
        // Sobra do ruído até o terminador chega como linha curta
        assert_eq!(lines.read_line().unwrap(), "");
        assert_eq!(lines.read_line().unwrap(), "PH:7.0");
    }

    #[test]
    fn eof_mid_line_is_io_error() {
        let port = ScriptedPort::default().chunk(b"PH:6.5");
        let mut lines = LineAssembler::new(port);

        assert!(matches!(lines.read_line(), Err(TransportError::Io(_))));
    }

    #[test]
    fn other_read_errors_are_io() {
        let mut port = ScriptedPort::default();
        port.script
            .push_back(Err(io::Error::new(ErrorKind::BrokenPipe, "cabo removido")));
        let mut lines = LineAssembler::new(port);

        assert!(matches!(lines.read_line(), Err(TransportError::Io(_))));
    }

    #[test]
    fn decode_strips_terminators() {
        assert_eq!(decode_line(b"PH:6.5\r\n".to_vec()).unwrap(), "PH:6.5");
        assert_eq!(decode_line(b"PH:6.5\n".to_vec()).unwrap(), "PH:6.5");
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_line(vec![0x50, 0xFF, 0xFE, b'\n']),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_oversized_line() {
        let mut line = vec![b'A'; MAX_LINE_LEN + 1];
        line.push(b'\n');
        assert!(matches!(decode_line(line), Err(TransportError::Decode(_))));
    }

    #[test]
    fn encode_appends_newline() {
        assert_eq!(encode_line("PUMP_ON"), b"PUMP_ON\n");
    }

    #[test]
    fn explicit_port_is_used_as_is() {
        let config = SerialConfig {
            port: "/dev/ttyUSB0".into(),
            ..Default::default()
        };
        assert_eq!(resolve_port(&config).unwrap(), "/dev/ttyUSB0");
    }

    #[test]
    fn connection_error_names_port() {
        let err = TransportError::Connection {
            port: "COM3".into(),
            reason: "Acesso negado".into(),
        };
        assert!(err.to_string().contains("COM3"));
    }
}
