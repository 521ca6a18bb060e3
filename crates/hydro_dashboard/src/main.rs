//! # Hydroponics Dashboard
//!
//! Monitoramento de pH, TDS, temperatura e umidade vindos do microcontrolador
//! via serial, com controle manual da bomba e do fan.
//!
//! ## Uso
//! ```bash
//! hydro_dashboard                    # Porta do config.toml
//! hydro_dashboard --port /dev/ttyUSB0
//! hydro_dashboard --list-ports       # Lista portas e sai
//! hydro_dashboard --simulate         # Sem hardware
//! ```
//!
//! ## Atalhos
//! - `F` / `F11`: Fullscreen
//! - `Esc`: Janela normal
//! - `Q`: Sair

mod dashboard;
mod device;
mod panels;
mod simulate;
mod theme_egui;

use dashboard::HydroDashboard;
use device::DeviceConnection;
use hydro_core::config::AppConfig;
use tracing::{info, warn};

/// Opções de linha de comando.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    port: Option<String>,
    list_ports: bool,
    simulate: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => match args.next() {
                Some(port) => cli.port = Some(port),
                None => warn!("--port requer um nome de porta"),
            },
            "--list-ports" => cli.list_ports = true,
            "--simulate" => cli.simulate = true,
            other => warn!("Argumento ignorado: {other}"),
        }
    }
    cli
}

fn main() -> eframe::Result<()> {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = parse_args(std::env::args().skip(1));

    if cli.list_ports {
        match hydro_link::transport::list_ports() {
            Ok(ports) if ports.is_empty() => println!("Nenhuma porta serial encontrada"),
            Ok(ports) => ports.iter().for_each(|p| println!("{p}")),
            Err(e) => eprintln!("Erro ao listar portas: {e}"),
        }
        return Ok(());
    }

    // ── Config ──
    let config_path = AppConfig::default_path();
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    // ── Dispositivo ──
    let connection = DeviceConnection::open(&config, cli.simulate);
    info!("Dashboard iniciando – fonte: {}", connection.source);

    // ── Janela eframe ──
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title(config.dashboard.title.clone())
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 520.0])
            .with_maximized(config.dashboard.start_maximized),
        ..Default::default()
    };

    let app_name = config.dashboard.title.clone();
    eframe::run_native(
        &app_name,
        options,
        Box::new(move |cc| Ok(Box::new(HydroDashboard::new(cc, config, connection)))),
    )
}
