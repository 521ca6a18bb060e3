//! Protocolo de linha do microcontrolador.
//!
//! Dispositivo → host, uma leitura por linha:
//!
//! ```text
//! PH:<v>,TDS:<v>,TEMP:<v>,HUM:<v>,PUMP:<0|1>,FAN:<0|1>\n
//! ```
//!
//! - Pares `CHAVE:VALOR` separados por vírgula, em qualquer ordem
//! - As seis chaves são obrigatórias; chaves extras são ignoradas
//! - `PUMP`/`FAN` só são ligados com o valor exato `"1"`
//!
//! Host → dispositivo: um token literal por linha (`PUMP_ON`, `FAN_AUTO`…).

use crate::types::{ActuatorStatus, Frame, SensorReading};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Separador entre segmentos de uma linha.
pub const SEGMENT_SEPARATOR: char = ',';

/// Separador entre chave e valor dentro de um segmento.
pub const KEY_VALUE_SEPARATOR: char = ':';

/// Terminador de linha em ambas as direções.
pub const LINE_TERMINATOR: char = '\n';

// ──────────────────────────────────────────────
// Chaves do frame
// ──────────────────────────────────────────────

/// Chaves obrigatórias de um frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKey {
    Ph,
    Tds,
    Temp,
    Hum,
    Pump,
    Fan,
}

impl FrameKey {
    /// Todas as chaves na ordem canônica do fio.
    pub const ALL: [FrameKey; 6] = [
        FrameKey::Ph,
        FrameKey::Tds,
        FrameKey::Temp,
        FrameKey::Hum,
        FrameKey::Pump,
        FrameKey::Fan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameKey::Ph => "PH",
            FrameKey::Tds => "TDS",
            FrameKey::Temp => "TEMP",
            FrameKey::Hum => "HUM",
            FrameKey::Pump => "PUMP",
            FrameKey::Fan => "FAN",
        }
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Erros de parse de uma linha.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Segmento malformado: {0:?} (esperado CHAVE:VALOR)")]
    MalformedSegment(String),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(FrameKey),
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

/// Converte uma linha recebida em [`Frame`].
///
/// Tudo ou nada: qualquer segmento sem exatamente um `:` falha com
/// [`ParseError::MalformedSegment`], e a primeira chave ausente (na ordem de
/// [`FrameKey::ALL`]) falha com [`ParseError::MissingField`].
pub fn parse_frame(line: &str) -> Result<Frame, ParseError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();

    for segment in line.trim().split(SEGMENT_SEPARATOR) {
        let mut parts = segment.split(KEY_VALUE_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => {
                // Chave repetida: a última ocorrência vence
                fields.insert(key, value);
            }
            _ => return Err(ParseError::MalformedSegment(segment.to_string())),
        }
    }

    let field = |key: FrameKey| {
        fields
            .get(key.as_str())
            .copied()
            .ok_or(ParseError::MissingField(key))
    };

    // Valida todas as chaves antes de montar o frame
    for key in FrameKey::ALL {
        field(key)?;
    }

    Ok(Frame {
        reading: SensorReading {
            ph: field(FrameKey::Ph)?.to_string(),
            tds: field(FrameKey::Tds)?.to_string(),
            temperature: field(FrameKey::Temp)?.to_string(),
            humidity: field(FrameKey::Hum)?.to_string(),
        },
        actuators: ActuatorStatus {
            pump: is_on(field(FrameKey::Pump)?),
            fan: is_on(field(FrameKey::Fan)?),
        },
    })
}

/// Codificação fixa do firmware: apenas `"1"` é ligado.
pub fn is_on(value: &str) -> bool {
    value == "1"
}

/// Renderiza um [`Frame`] na ordem canônica do fio (sem terminador).
pub fn encode_frame(frame: &Frame) -> String {
    let flag = |on: bool| if on { "1" } else { "0" };
    format!(
        "PH:{},TDS:{},TEMP:{},HUM:{},PUMP:{},FAN:{}",
        frame.reading.ph,
        frame.reading.tds,
        frame.reading.temperature,
        frame.reading.humidity,
        flag(frame.actuators.pump),
        flag(frame.actuators.fan),
    )
}

// ──────────────────────────────────────────────
// Comandos
// ──────────────────────────────────────────────

/// Comando do operador para os atuadores.
///
/// Somente escrita: o sucesso só é visível num frame posterior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    PumpOn,
    PumpOff,
    FanOn,
    FanOff,
    FanAuto,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::PumpOn,
        Command::PumpOff,
        Command::FanOn,
        Command::FanOff,
        Command::FanAuto,
    ];

    /// Token literal enviado ao dispositivo.
    pub fn token(self) -> &'static str {
        match self {
            Command::PumpOn => "PUMP_ON",
            Command::PumpOff => "PUMP_OFF",
            Command::FanOn => "FAN_ON",
            Command::FanOff => "FAN_OFF",
            Command::FanAuto => "FAN_AUTO",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Erros de conversão de texto para [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Comando desconhecido: {0:?}")]
    UnknownCommand(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.token() == s)
            .ok_or_else(|| CommandError::UnknownCommand(s.to_string()))
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "PH:6.5,TDS:850,TEMP:24.3,HUM:55,PUMP:1,FAN:0";

    #[test]
    fn parses_sample_line() {
        let frame = parse_frame(SAMPLE).unwrap();
        assert_eq!(frame.reading.ph, "6.5");
        assert_eq!(frame.reading.tds, "850");
        assert_eq!(frame.reading.temperature, "24.3");
        assert_eq!(frame.reading.humidity, "55");
        assert!(frame.actuators.pump);
        assert!(!frame.actuators.fan);
    }

    #[test]
    fn field_order_is_irrelevant() {
        let shuffled = "FAN:0,HUM:55,PUMP:1,TEMP:24.3,PH:6.5,TDS:850";
        assert_eq!(parse_frame(shuffled).unwrap(), parse_frame(SAMPLE).unwrap());
    }

    #[test]
    fn strips_line_terminators() {
        let line = format!("{SAMPLE}\r\n");
        assert_eq!(parse_frame(&line).unwrap(), parse_frame(SAMPLE).unwrap());
    }

    #[test]
    fn reports_first_missing_field() {
        assert_eq!(
            parse_frame("PH:6.5,TDS:850"),
            Err(ParseError::MissingField(FrameKey::Temp))
        );
        assert_eq!(
            parse_frame("TDS:850,TEMP:24.3,HUM:55,PUMP:1,FAN:0"),
            Err(ParseError::MissingField(FrameKey::Ph))
        );
    }

    #[test]
    fn rejects_segment_without_colon() {
        assert_eq!(
            parse_frame("PH:6.5,TDS850,TEMP:24.3,HUM:55,PUMP:1,FAN:0"),
            Err(ParseError::MalformedSegment("TDS850".into()))
        );
    }

    #[test]
    fn rejects_segment_with_two_colons() {
        assert_eq!(
            parse_frame("PH:6:5,TDS:850,TEMP:24.3,HUM:55,PUMP:1,FAN:0"),
            Err(ParseError::MalformedSegment("PH:6:5".into()))
        );
    }

    #[test]
    fn empty_line_is_malformed() {
        assert_eq!(
            parse_frame(""),
            Err(ParseError::MalformedSegment(String::new()))
        );
        assert!(matches!(
            parse_frame("   \r\n"),
            Err(ParseError::MalformedSegment(_))
        ));
    }

    #[test]
    fn trailing_comma_is_malformed() {
        let line = format!("{SAMPLE},");
        assert!(matches!(
            parse_frame(&line),
            Err(ParseError::MalformedSegment(_))
        ));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let line = format!("{SAMPLE},RSSI:-70");
        assert_eq!(parse_frame(&line).unwrap(), parse_frame(SAMPLE).unwrap());
    }

    #[test]
    fn duplicate_key_last_wins() {
        let line = format!("{SAMPLE},PH:7.0");
        assert_eq!(parse_frame(&line).unwrap().reading.ph, "7.0");
    }

    #[test]
    fn only_exact_one_is_on() {
        assert!(is_on("1"));
        for value in ["0", "01", "true", "", " 1", "1 ", "ON"] {
            assert!(!is_on(value), "{value:?} não deveria ligar");
        }
    }

    #[test]
    fn encode_then_parse_preserves_frame() {
        let frame = parse_frame("FAN:1,PUMP:0,HUM:40,TEMP:21,TDS:900,PH:5.9").unwrap();
        let line = encode_frame(&frame);
        assert_eq!(line, "PH:5.9,TDS:900,TEMP:21,HUM:40,PUMP:0,FAN:1");
        assert_eq!(parse_frame(&line).unwrap(), frame);
    }

    #[test]
    fn command_tokens_match_wire_table() {
        let tokens: Vec<&str> = Command::ALL.iter().map(|c| c.token()).collect();
        assert_eq!(
            tokens,
            ["PUMP_ON", "PUMP_OFF", "FAN_ON", "FAN_OFF", "FAN_AUTO"]
        );
        assert_eq!(Command::FanAuto.to_string(), "FAN_AUTO");
    }

    #[test]
    fn command_from_str() {
        assert_eq!("PUMP_OFF".parse::<Command>(), Ok(Command::PumpOff));
        assert_eq!(
            "pump_off".parse::<Command>(),
            Err(CommandError::UnknownCommand("pump_off".into()))
        );
    }
}
