//! Dispositivo simulado para rodar o dashboard sem hardware (`--simulate`).
//!
//! Conversa com o link por um [`MemoryTransport`]: lê os comandos escritos,
//! atualiza bomba/fan e publica um frame por intervalo.

use crossbeam_channel::{Receiver, Sender, bounded, select, tick};
use hydro_core::protocol::{Command, encode_frame};
use hydro_core::types::{ActuatorStatus, Frame, SensorReading};
use hydro_link::MemoryTransport;
use std::time::Duration;
use tracing::{debug, info};

/// Temperatura acima da qual o fan liga em modo AUTO (°C).
const FAN_AUTO_THRESHOLD: f64 = 26.0;

/// Mantém a thread do simulador viva; ao dropar, ela termina.
pub struct SimulatedDevice {
    _stop: Sender<()>,
}

pub fn spawn(device: MemoryTransport, interval: Duration) -> std::io::Result<SimulatedDevice> {
    let (stop_tx, stop_rx) = bounded::<()>(0);

    std::thread::Builder::new()
        .name("device-sim".into())
        .spawn(move || simulator_loop(&device, interval, &stop_rx))?;

    info!("Dispositivo simulado ativo");
    Ok(SimulatedDevice { _stop: stop_tx })
}

fn simulator_loop(device: &MemoryTransport, interval: Duration, stop: &Receiver<()>) {
    let ticker = tick(interval);
    let mut sim = SimState::default();

    loop {
        select! {
            recv(stop) -> _ => break,
            recv(ticker) -> _ => {
                for line in device.take_written_lines() {
                    match line.parse::<Command>() {
                        Ok(command) => sim.apply(command),
                        Err(e) => debug!("Simulador ignorou: {e}"),
                    }
                }
                sim.step();
                device.push_line(encode_frame(&sim.frame()));
            }
        }
    }
}

/// Estado interno do dispositivo simulado.
#[derive(Debug, Default)]
struct SimState {
    ticks: u64,
    pump: bool,
    fan: bool,
    fan_auto: bool,
}

impl SimState {
    fn apply(&mut self, command: Command) {
        match command {
            Command::PumpOn => self.pump = true,
            Command::PumpOff => self.pump = false,
            Command::FanOn => {
                self.fan_auto = false;
                self.fan = true;
            }
            Command::FanOff => {
                self.fan_auto = false;
                self.fan = false;
            }
            Command::FanAuto => self.fan_auto = true,
        }
    }

    fn step(&mut self) {
        self.ticks += 1;
        if self.fan_auto {
            self.fan = self.temperature() > FAN_AUTO_THRESHOLD;
        }
    }

    /// Ciclo lento de ~10 min a 1 frame/s.
    fn phase(&self) -> f64 {
        self.ticks as f64 / 600.0 * std::f64::consts::TAU
    }

    fn temperature(&self) -> f64 {
        24.0 + 3.0 * self.phase().sin()
    }

    fn frame(&self) -> Frame {
        let phase = self.phase();
        Frame {
            reading: SensorReading {
                ph: format!("{:.1}", 6.2 + 0.3 * phase.cos()),
                tds: format!("{:.0}", 850.0 + 40.0 * (2.0 * phase).sin()),
                temperature: format!("{:.1}", self.temperature()),
                humidity: format!("{:.0}", 55.0 - 10.0 * phase.sin()),
            },
            actuators: ActuatorStatus {
                pump: self.pump,
                fan: self.fan,
            },
        }
    }
}
