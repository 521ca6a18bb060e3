//! # Hydro Link
//!
//! Núcleo de comunicação com o microcontrolador: transporte serial, poll
//! loop de cadência fixa, estado do dispositivo com observadores e envio de
//! comandos. Não depende de nenhuma tecnologia de apresentação.
//!
//! ## Módulos
//! - [`transport`] – Traits de leitura/escrita por linha e porta serial
//! - [`memory`] – Transporte loopback em memória
//! - [`store`] – [`DeviceState`](hydro_core::DeviceState) + observadores
//! - [`diagnostics`] – Falhas por linha e seus destinos
//! - [`poll`] – Poll loop (um tick, no máximo uma linha)
//! - [`dispatch`] – Envio de comandos do operador
//! - [`link`] – Fachada que junta tudo numa thread

pub mod transport;
pub mod memory;
pub mod store;
pub mod diagnostics;
pub mod poll;
pub mod dispatch;
pub mod link;

// Re-exports convenientes
pub use diagnostics::LineFailure;
pub use dispatch::{CommandDispatcher, DispatchError};
pub use link::{DeviceLink, LinkBuilder, LinkError};
pub use memory::MemoryTransport;
pub use transport::{LineReader, LineWriter, SerialTransport, TransportError};
