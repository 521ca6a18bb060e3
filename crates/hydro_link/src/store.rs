//! Estado do dispositivo e notificação de observadores.
//!
//! Apenas o poll loop faz commit; os demais consumidores recebem cópias
//! imutáveis ([`DeviceState`] é `Clone`) via observador ou [`LatestState`].

use crossbeam_channel::{Sender, TrySendError};
use hydro_core::types::{DeviceState, Frame};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Recebe um snapshot a cada commit.
pub trait StateObserver: Send {
    fn on_commit(&mut self, state: &DeviceState);
}

/// Non-blocking: se o consumidor está lento, o snapshot é descartado.
impl StateObserver for Sender<DeviceState> {
    fn on_commit(&mut self, state: &DeviceState) {
        match self.try_send(state.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!("Channel cheio, descartando snapshot #{}", state.sequence);
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Assinante desconectado, snapshot #{} ignorado", state.sequence);
            }
        }
    }
}

/// Adapta uma closure como observador.
pub struct FnObserver<F>(pub F);

impl<F: FnMut(&DeviceState) + Send> StateObserver for FnObserver<F> {
    fn on_commit(&mut self, state: &DeviceState) {
        (self.0)(state)
    }
}

/// Último snapshot, legível de qualquer thread (cópia na leitura).
#[derive(Clone, Default)]
pub struct LatestState {
    inner: Arc<Mutex<DeviceState>>,
}

impl LatestState {
    pub fn get(&self) -> DeviceState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StateObserver for LatestState {
    fn on_commit(&mut self, state: &DeviceState) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
    }
}

/// Dono do [`DeviceState`] e da lista ordenada de observadores.
#[derive(Default)]
pub struct StateStore {
    state: DeviceState,
    observers: Vec<Box<dyn StateObserver>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um observador; a notificação segue a ordem de registro.
    pub fn register(&mut self, observer: impl StateObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Aplica o frame, incrementa a sequência e notifica cada observador uma vez.
    pub fn commit(&mut self, frame: Frame) -> u64 {
        let sequence = self.state.commit(frame);
        for observer in &mut self.observers {
            observer.on_commit(&self.state);
        }
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use hydro_core::protocol::parse_frame;

    fn frame(ph: &str) -> Frame {
        parse_frame(&format!("PH:{ph},TDS:850,TEMP:24.3,HUM:55,PUMP:1,FAN:0")).unwrap()
    }

    #[test]
    fn observers_are_notified_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut store = StateStore::new();
        for id in 0..3 {
            let calls = Arc::clone(&calls);
            store.register(FnObserver(move |s: &DeviceState| {
                calls.lock().unwrap().push((id, s.sequence));
            }));
        }

        store.commit(frame("6.5"));

        assert_eq!(*calls.lock().unwrap(), vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn channel_observer_receives_snapshot() {
        let (tx, rx) = bounded(4);
        let mut store = StateStore::new();
        store.register(tx);

        store.commit(frame("6.5"));
        store.commit(frame("6.7"));

        assert_eq!(rx.try_recv().unwrap().ph(), "6.5");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.ph(), "6.7");
        assert_eq!(second.sequence, 2);
    }

    #[test]
    fn full_channel_drops_snapshot_without_blocking() {
        let (tx, rx) = bounded(1);
        let mut store = StateStore::new();
        store.register(tx);

        store.commit(frame("6.5"));
        store.commit(frame("6.7"));

        assert_eq!(rx.len(), 1);
        assert_eq!(store.state().sequence, 2);
    }

    #[test]
    fn latest_state_is_copy_on_read() {
        let latest = LatestState::default();
        let mut store = StateStore::new();
        store.register(latest.clone());

        let before = latest.get();
        store.commit(frame("6.5"));

        assert_eq!(before.sequence, 0);
        assert_eq!(latest.get().ph(), "6.5");
    }
}
