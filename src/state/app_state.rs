// ============================================================================
// APP STATE - Estado global de la aplicación
// ============================================================================
// Reemplaza los globals sueltos del original (selectedWeek, activeCodes,
// deletedCodes) por un struct explícito compartido via Rc<RefCell>.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Datelike;

use crate::models::{MergeStrategy, WeekLedger};
use crate::state::{AuthState, SyncStateHandle};
use crate::utils::constants::STRATEGY_PREF_KEY;
use crate::utils::storage::LocalStore;

pub const MIN_WEEK: u32 = 1;
pub const MAX_WEEK: u32 = 52;

/// Severidad de un mensaje transitorio (el showMessage del original)
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Mensaje de una línea, descartable, para la UI
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
}

/// Semana ISO actual, acotada al rango del selector
pub fn current_week() -> u32 {
    chrono::Utc::now().iso_week().week().clamp(MIN_WEEK, MAX_WEEK)
}

/// Estado global de la aplicación
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub sync: SyncStateHandle,

    pub week: Rc<RefCell<u32>>,
    pub ledger: Rc<RefCell<WeekLedger>>,
    pub filter_text: Rc<RefCell<String>>,
    pub strategy: Rc<RefCell<MergeStrategy>>,
    pub notice: Rc<RefCell<Option<Notice>>>,

    // Callbacks para notificar cambios de estado a la capa de render
    pub change_subscribers: Rc<RefCell<Vec<Rc<dyn Fn()>>>>,

    store: Rc<dyn LocalStore>,
}

impl AppState {
    /// Crear el estado inicial: semana actual, preferencias desde storage
    pub fn new(store: Rc<dyn LocalStore>) -> Self {
        let week = current_week();
        let strategy = store
            .get(STRATEGY_PREF_KEY)
            .as_deref()
            .and_then(MergeStrategy::parse)
            .unwrap_or_default();

        Self {
            auth: AuthState::new(),
            sync: SyncStateHandle::new(),
            week: Rc::new(RefCell::new(week)),
            ledger: Rc::new(RefCell::new(WeekLedger::empty(week))),
            filter_text: Rc::new(RefCell::new(String::new())),
            strategy: Rc::new(RefCell::new(strategy)),
            notice: Rc::new(RefCell::new(None)),
            change_subscribers: Rc::new(RefCell::new(Vec::new())),
            store,
        }
    }

    pub fn store(&self) -> Rc<dyn LocalStore> {
        self.store.clone()
    }

    pub fn get_week(&self) -> u32 {
        *self.week.borrow()
    }

    pub fn set_week(&self, week: u32) {
        *self.week.borrow_mut() = week;
    }

    pub fn get_ledger(&self) -> WeekLedger {
        self.ledger.borrow().clone()
    }

    pub fn set_ledger(&self, ledger: WeekLedger) {
        *self.ledger.borrow_mut() = ledger;
    }

    /// Mutar el ledger en el lugar (sin clonar)
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut WeekLedger) -> R) -> R {
        f(&mut self.ledger.borrow_mut())
    }

    pub fn get_filter(&self) -> String {
        self.filter_text.borrow().clone()
    }

    pub fn set_filter(&self, query: String) {
        *self.filter_text.borrow_mut() = query;
    }

    pub fn get_strategy(&self) -> MergeStrategy {
        *self.strategy.borrow()
    }

    /// Establecer la estrategia de merge y persistirla en las preferencias
    pub fn set_strategy(&self, strategy: MergeStrategy) {
        *self.strategy.borrow_mut() = strategy;
        if let Err(e) = self.store.set(STRATEGY_PREF_KEY, strategy.as_str()) {
            log::error!("❌ Error guardando preferencia de estrategia: {}", e);
        }
    }

    /// Mostrar un mensaje transitorio (reemplaza al anterior)
    pub fn show_message(&self, text: impl Into<String>, kind: NoticeKind) {
        let text = text.into();
        match kind {
            NoticeKind::Error => log::warn!("⚠️ {}", text),
            _ => log::info!("ℹ️ {}", text),
        }
        *self.notice.borrow_mut() = Some(Notice { text, kind });
    }

    pub fn take_notice(&self) -> Option<Notice> {
        self.notice.borrow_mut().take()
    }

    /// Suscribirse a cambios de estado
    pub fn subscribe_to_changes<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.change_subscribers.borrow_mut().push(Rc::new(callback));
    }

    /// Notificar a todos los subscribers (señal de re-render)
    pub fn notify_subscribers(&self) {
        let subscribers: Vec<Rc<dyn Fn()>> = self.change_subscribers.borrow().clone();
        for callback in subscribers {
            callback();
        }
    }
}
