// ============================================================================
// SYNC STATE - Estado observable de sincronización
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::{SyncEvent, SyncStatus};

/// Estado de sincronización compartido entre el coordinador y la UI
#[derive(Clone)]
pub struct SyncStateHandle {
    pub status: Rc<RefCell<SyncStatus>>,
    /// Hay una escritura remota en vuelo para la semana actual
    pub write_in_flight: Rc<RefCell<bool>>,
    /// Llegó otro guardado mientras había una escritura en vuelo; al
    /// completar se hace exactamente una escritura más (coalescing)
    pub write_queued: Rc<RefCell<bool>>,
    pub last_event: Rc<RefCell<Option<SyncEvent>>>,
}

impl SyncStateHandle {
    pub fn new() -> Self {
        Self {
            status: Rc::new(RefCell::new(SyncStatus::Idle)),
            write_in_flight: Rc::new(RefCell::new(false)),
            write_queued: Rc::new(RefCell::new(false)),
            last_event: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_status(&self, status: SyncStatus) {
        *self.status.borrow_mut() = status;
    }

    pub fn get_status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn set_write_in_flight(&self, in_flight: bool) {
        *self.write_in_flight.borrow_mut() = in_flight;
    }

    pub fn is_write_in_flight(&self) -> bool {
        *self.write_in_flight.borrow()
    }

    pub fn set_write_queued(&self, queued: bool) {
        *self.write_queued.borrow_mut() = queued;
    }

    /// Consumir el flag de guardado pendiente
    pub fn take_write_queued(&self) -> bool {
        self.write_queued.replace(false)
    }

    pub fn emit(&self, event: SyncEvent) {
        *self.last_event.borrow_mut() = Some(event);
    }

    pub fn last_event(&self) -> Option<SyncEvent> {
        self.last_event.borrow().clone()
    }
}

impl Default for SyncStateHandle {
    fn default() -> Self {
        Self::new()
    }
}
