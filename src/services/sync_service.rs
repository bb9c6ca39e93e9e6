// ============================================================================
// SYNC COORDINATOR - Persistencia local + espejo remoto
// ============================================================================
// Toda mutación se guarda primero en el storage local (síncrono, nunca debe
// fallar); con sesión activa se intenta además UNA escritura remota, sin
// reintentos. Los fallos remotos se convierten en transiciones de estado y
// eventos para el observador, nunca se propagan al llamador de la mutación.
// ============================================================================

use std::rc::Rc;

use crate::models::auth::{validate_credentials, validate_signup};
use crate::models::{
    reconcile, AppFailure, SyncEvent, SyncOperation, SyncStatus, UserInfo, WeekDocument,
};
use crate::services::cloud::CloudBackend;
use crate::state::{AppState, NoticeKind};
use crate::utils::storage::{load_week_ledger, save_week_ledger, LocalStore};

/// Tiempo máximo para una operación remota antes de clasificarla SyncError
pub const REMOTE_TIMEOUT_MS: u32 = 10_000;

#[cfg(target_arch = "wasm32")]
async fn with_timeout<F, T>(fut: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    use futures::future::{select, Either};
    use futures::pin_mut;

    let timeout = gloo_timers::future::TimeoutFuture::new(REMOTE_TIMEOUT_MS);
    pin_mut!(fut);
    pin_mut!(timeout);
    match select(fut, timeout).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(..) => Err(format!(
            "Remote operation timed out after {} ms",
            REMOTE_TIMEOUT_MS
        )),
    }
}

// En builds nativos (tests) no hay event loop del navegador: sin timeout
#[cfg(not(target_arch = "wasm32"))]
async fn with_timeout<F, T>(fut: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    Ok(fut.await)
}

/// Orquestador de persistencia local y sincronización remota
#[derive(Clone)]
pub struct SyncCoordinator {
    state: AppState,
    store: Rc<dyn LocalStore>,
    backend: Rc<dyn CloudBackend>,
}

impl SyncCoordinator {
    pub fn new(state: AppState, store: Rc<dyn LocalStore>, backend: Rc<dyn CloudBackend>) -> Self {
        Self {
            state,
            store,
            backend,
        }
    }

    /// Guardado local síncrono. Un fallo acá es LocalError: inesperado,
    /// se loguea y se marca estado de error, pero la app sigue corriendo.
    fn save_local(&self) -> bool {
        let ledger = self.state.get_ledger();
        match save_week_ledger(&*self.store, &ledger) {
            Ok(()) => true,
            Err(e) => {
                let failure = AppFailure::Local(e.clone());
                log::error!("❌ Fallo inesperado guardando en storage local: {}", e);
                self.state.sync.set_status(SyncStatus::Error {
                    message: failure.to_string(),
                });
                self.state.sync.emit(SyncEvent::DataError {
                    operation: SyncOperation::Save,
                    message: e,
                });
                self.state
                    .show_message(failure.to_string(), NoticeKind::Error);
                false
            }
        }
    }

    /// Persistir tras una mutación del ledger: local siempre, remoto si hay
    /// sesión. Serializa las escrituras remotas por semana (coalescing).
    pub async fn persist_mutation(&self) {
        self.state.sync.set_status(SyncStatus::Syncing);
        if !self.save_local() {
            return;
        }

        let Some(uid) = self.state.auth.get_uid() else {
            self.state.sync.set_status(SyncStatus::Offline);
            return;
        };

        if self.state.sync.is_write_in_flight() {
            // Ya hay una escritura en vuelo: dejar exactamente un guardado
            // pendiente en lugar de competir con dos writes
            log::info!("⏳ Escritura remota en vuelo, guardado coalescido");
            self.state.sync.set_write_queued(true);
            return;
        }

        loop {
            self.write_remote_once(&uid).await;
            if !self.state.sync.take_write_queued() {
                break;
            }
            log::info!("🔁 Ejecutando guardado coalescido");
        }
    }

    async fn write_remote_once(&self, uid: &str) {
        let week_id = self.state.get_week();
        let doc = WeekDocument::from_ledger(&self.state.get_ledger());

        self.state.sync.set_write_in_flight(true);
        let result = with_timeout(self.backend.write_week(uid, week_id, &doc))
            .await
            .and_then(|r| r);
        self.state.sync.set_write_in_flight(false);

        match result {
            Ok(()) => {
                self.state.sync.set_status(SyncStatus::Synced);
                self.state.sync.emit(SyncEvent::DataSaved { week_id });
            }
            Err(e) => {
                // El guardado local ya está hecho: no se pierde nada, solo
                // queda sin espejar. Un solo intento, sin retry automático.
                log::error!("❌ Error sincronizando semana {}: {}", week_id, e);
                self.state.sync.set_status(SyncStatus::Error { message: e.clone() });
                self.state.sync.emit(SyncEvent::DataError {
                    operation: SyncOperation::Save,
                    message: e.clone(),
                });
                self.state
                    .show_message(AppFailure::Sync(e).to_string(), NoticeKind::Error);
            }
        }
    }

    /// Cambio de semana: cargar local (con migración legacy) y, con sesión
    /// activa, leer el documento remoto y reconciliarlo con la estrategia
    /// configurada. El resultado se persiste solo localmente para no
    /// amplificar escrituras.
    pub async fn load_week(&self, week_id: u32) {
        let ledger = load_week_ledger(&*self.store, week_id);
        self.state.set_week(week_id);
        self.state.set_ledger(ledger);

        let Some(uid) = self.state.auth.get_uid() else {
            self.state.sync.set_status(SyncStatus::Offline);
            return;
        };

        self.state.sync.set_status(SyncStatus::Syncing);
        let result = with_timeout(self.backend.read_week(&uid, week_id))
            .await
            .and_then(|r| r);

        // El usuario pudo navegar a otra semana mientras esperábamos:
        // un resultado de una semana vieja se descarta
        if self.state.get_week() != week_id {
            log::warn!(
                "⚠️ Descartando respuesta remota de la semana {} (semana actual: {})",
                week_id,
                self.state.get_week()
            );
            return;
        }

        match result {
            Ok(Some(doc)) => {
                let remote = doc.into_ledger(week_id);
                let strategy = self.state.get_strategy();
                let local = self.state.get_ledger();
                let merged = reconcile(&local, Some(&remote), strategy);
                log::info!(
                    "🔀 Semana {} reconciliada ({:?}): {} activos, {} borrados",
                    week_id,
                    strategy,
                    merged.active.len(),
                    merged.deleted.len()
                );
                self.state.set_ledger(merged);
                if self.save_local() {
                    self.state.sync.set_status(SyncStatus::Synced);
                    self.state.sync.emit(SyncEvent::DataLoaded { week_id });
                }
            }
            Ok(None) => {
                // No hay documento en la nube para esta semana
                self.state.sync.set_status(SyncStatus::Synced);
                self.state.sync.emit(SyncEvent::DataEmpty { week_id });
            }
            Err(e) => {
                log::error!("❌ Error leyendo semana {} de la nube: {}", week_id, e);
                self.state.sync.set_status(SyncStatus::Error { message: e.clone() });
                self.state.sync.emit(SyncEvent::DataError {
                    operation: SyncOperation::Load,
                    message: e.clone(),
                });
                self.state
                    .show_message(AppFailure::Sync(e).to_string(), NoticeKind::Error);
            }
        }
    }

    fn apply_signed_in_user(&self, user: UserInfo) {
        log::info!("✅ Sesión iniciada: {}", user.uid);
        self.state.auth.set_user(Some(user.clone()));
        self.state.sync.emit(SyncEvent::AuthChanged { user: Some(user) });
    }

    fn report_auth_error(&self, message: String) {
        log::warn!("⚠️ {}", AppFailure::Auth(message.clone()));
        self.state.sync.emit(SyncEvent::AuthError {
            message: message.clone(),
        });
        self.state.show_message(message, NoticeKind::Error);
    }

    /// Iniciar sesión y comportarse como un cambio a la semana actual
    /// (lectura remota + reconciliación)
    pub async fn sign_in(&self, email: &str, password: &str) {
        if let Err(e) = validate_credentials(email, password) {
            self.report_auth_error(e);
            return;
        }
        match with_timeout(self.backend.sign_in(email, password))
            .await
            .and_then(|r| r)
        {
            Ok(user) => {
                self.apply_signed_in_user(user);
                self.load_week(self.state.get_week()).await;
            }
            Err(e) => self.report_auth_error(e),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) {
        if let Err(e) = validate_signup(email, password) {
            self.report_auth_error(e);
            return;
        }
        match with_timeout(self.backend.sign_up(email, password))
            .await
            .and_then(|r| r)
        {
            Ok(user) => {
                self.apply_signed_in_user(user);
                self.load_week(self.state.get_week()).await;
            }
            Err(e) => self.report_auth_error(e),
        }
    }

    pub async fn sign_in_federated(&self, id_token: &str) {
        match with_timeout(self.backend.sign_in_federated(id_token))
            .await
            .and_then(|r| r)
        {
            Ok(user) => {
                self.apply_signed_in_user(user);
                self.load_week(self.state.get_week()).await;
            }
            Err(e) => self.report_auth_error(e),
        }
    }

    /// Cerrar sesión: sin más intentos remotos hasta el próximo login;
    /// el ledger queda en su último estado local
    pub async fn sign_out(&self) {
        match with_timeout(self.backend.sign_out()).await.and_then(|r| r) {
            Ok(()) => {
                self.state.auth.sign_out();
                self.state.sync.set_status(SyncStatus::Offline);
                self.state.sync.emit(SyncEvent::AuthChanged { user: None });
                log::info!("👋 Sesión cerrada");
            }
            Err(e) => self.report_auth_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    use crate::models::MergeStrategy;
    use crate::services::cloud::AuthCallback;
    use crate::utils::storage::memory::MemoryStore;

    /// Backend de prueba con document store en memoria
    #[derive(Default)]
    struct MockBackend {
        docs: RefCell<HashMap<(String, u32), WeekDocument>>,
        writes: Cell<usize>,
        fail_writes: Cell<bool>,
        fail_reads: Cell<bool>,
        deny_auth: Cell<bool>,
        // Hook ejecutado durante read_week (simula navegación en vuelo)
        on_read: RefCell<Option<Box<dyn Fn()>>>,
    }

    #[async_trait::async_trait(?Send)]
    impl CloudBackend for MockBackend {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<UserInfo, String> {
            if self.deny_auth.get() {
                return Err("Invalid email or password".to_string());
            }
            Ok(UserInfo {
                uid: "uid-1".to_string(),
                email: Some(email.to_string()),
            })
        }

        async fn sign_up(&self, email: &str, password: &str) -> Result<UserInfo, String> {
            self.sign_in(email, password).await
        }

        async fn sign_in_federated(&self, _id_token: &str) -> Result<UserInfo, String> {
            self.sign_in("federated@example.com", "-").await
        }

        async fn sign_out(&self) -> Result<(), String> {
            Ok(())
        }

        async fn write_week(
            &self,
            uid: &str,
            week_id: u32,
            doc: &WeekDocument,
        ) -> Result<(), String> {
            if self.fail_writes.get() {
                return Err("HTTP 500: internal error".to_string());
            }
            self.writes.set(self.writes.get() + 1);
            self.docs
                .borrow_mut()
                .insert((uid.to_string(), week_id), doc.clone());
            Ok(())
        }

        async fn read_week(
            &self,
            uid: &str,
            week_id: u32,
        ) -> Result<Option<WeekDocument>, String> {
            if let Some(hook) = self.on_read.borrow().as_ref() {
                hook();
            }
            if self.fail_reads.get() {
                return Err("network down".to_string());
            }
            Ok(self.docs.borrow().get(&(uid.to_string(), week_id)).cloned())
        }

        fn subscribe_auth(&self, _callback: AuthCallback) {}
    }

    fn setup() -> (SyncCoordinator, AppState, Rc<MemoryStore>, Rc<MockBackend>) {
        let store = Rc::new(MemoryStore::new());
        let backend = Rc::new(MockBackend::default());
        let state = AppState::new(store.clone());
        state.set_week(10);
        state.set_ledger(crate::models::WeekLedger::empty(10));
        let coordinator = SyncCoordinator::new(state.clone(), store.clone(), backend.clone());
        (coordinator, state, store, backend)
    }

    fn signed_in(state: &AppState) {
        state.auth.set_user(Some(UserInfo {
            uid: "uid-1".to_string(),
            email: None,
        }));
    }

    #[test]
    fn test_mutation_without_session_goes_offline_but_saves_locally() {
        let (coordinator, state, store, backend) = setup();
        state.with_ledger(|l| l.add_active("A1", 2)).unwrap();

        block_on(coordinator.persist_mutation());

        assert_eq!(state.sync.get_status(), SyncStatus::Offline);
        assert_eq!(backend.writes.get(), 0);
        assert_eq!(load_week_ledger(&*store, 10).active_quantity("A1"), Some(2));
    }

    #[test]
    fn test_mutation_with_session_mirrors_to_cloud() {
        let (coordinator, state, _store, backend) = setup();
        signed_in(&state);
        state.with_ledger(|l| l.add_active("A1", 2)).unwrap();

        block_on(coordinator.persist_mutation());

        assert_eq!(state.sync.get_status(), SyncStatus::Synced);
        assert_eq!(backend.writes.get(), 1);
        assert_eq!(
            state.sync.last_event(),
            Some(SyncEvent::DataSaved { week_id: 10 })
        );
    }

    #[test]
    fn test_failed_remote_write_keeps_local_data() {
        let (coordinator, state, store, backend) = setup();
        signed_in(&state);
        backend.fail_writes.set(true);
        state.with_ledger(|l| l.add_active("A1", 2)).unwrap();

        block_on(coordinator.persist_mutation());

        assert!(matches!(state.sync.get_status(), SyncStatus::Error { .. }));
        // los datos locales no se pierden
        assert_eq!(load_week_ledger(&*store, 10).active_quantity("A1"), Some(2));
    }

    #[test]
    fn test_concurrent_save_is_coalesced_not_raced() {
        let (coordinator, state, store, backend) = setup();
        signed_in(&state);
        state.with_ledger(|l| l.add_active("A1", 1)).unwrap();

        // Con una escritura ya en vuelo, el guardado queda pendiente y no
        // se emite un segundo write
        state.sync.set_write_in_flight(true);
        block_on(coordinator.persist_mutation());
        assert_eq!(backend.writes.get(), 0);
        assert!(state.sync.take_write_queued());
        assert_eq!(load_week_ledger(&*store, 10).active_quantity("A1"), Some(1));
    }

    #[test]
    fn test_week_change_reconciles_remote_data() {
        let (coordinator, state, store, backend) = setup();
        signed_in(&state);
        state.set_strategy(MergeStrategy::Merge);

        let mut local = crate::models::WeekLedger::empty(11);
        local.add_active("A", 2).unwrap();
        save_week_ledger(&*store, &local).unwrap();

        let mut remote = crate::models::WeekLedger::empty(11);
        remote.add_active("A", 5).unwrap();
        backend.docs.borrow_mut().insert(
            ("uid-1".to_string(), 11),
            WeekDocument::from_ledger(&remote),
        );

        block_on(coordinator.load_week(11));

        assert_eq!(state.get_week(), 11);
        assert_eq!(state.get_ledger().active_quantity("A"), Some(7));
        // el resultado reconciliado se persiste localmente...
        assert_eq!(load_week_ledger(&*store, 11).active_quantity("A"), Some(7));
        // ...sin forzar una escritura remota de vuelta
        assert_eq!(backend.writes.get(), 0);
        assert_eq!(state.sync.get_status(), SyncStatus::Synced);
    }

    #[test]
    fn test_week_change_without_cloud_document() {
        let (coordinator, state, _store, _backend) = setup();
        signed_in(&state);

        block_on(coordinator.load_week(12));

        assert_eq!(state.sync.get_status(), SyncStatus::Synced);
        assert_eq!(
            state.sync.last_event(),
            Some(SyncEvent::DataEmpty { week_id: 12 })
        );
    }

    #[test]
    fn test_stale_read_result_is_discarded() {
        let (coordinator, state, _store, backend) = setup();
        signed_in(&state);

        let mut remote = crate::models::WeekLedger::empty(11);
        remote.add_active("REMOTO", 9).unwrap();
        backend.docs.borrow_mut().insert(
            ("uid-1".to_string(), 11),
            WeekDocument::from_ledger(&remote),
        );

        // Mientras la lectura está en vuelo el usuario navega a otra semana
        let state_clone = state.clone();
        *backend.on_read.borrow_mut() = Some(Box::new(move || {
            state_clone.set_week(12);
        }));

        block_on(coordinator.load_week(11));

        // el resultado de la semana 11 se descarta
        assert_eq!(state.get_week(), 12);
        assert_eq!(state.get_ledger().active_quantity("REMOTO"), None);
    }

    #[test]
    fn test_read_failure_reports_sync_error() {
        let (coordinator, state, _store, backend) = setup();
        signed_in(&state);
        backend.fail_reads.set(true);

        block_on(coordinator.load_week(11));

        assert!(matches!(state.sync.get_status(), SyncStatus::Error { .. }));
        assert!(matches!(
            state.sync.last_event(),
            Some(SyncEvent::DataError {
                operation: SyncOperation::Load,
                ..
            })
        ));
    }

    #[test]
    fn test_sign_in_triggers_week_reconcile() {
        let (coordinator, state, _store, backend) = setup();

        let mut remote = crate::models::WeekLedger::empty(10);
        remote.add_active("NUBE", 4).unwrap();
        backend.docs.borrow_mut().insert(
            ("uid-1".to_string(), 10),
            WeekDocument::from_ledger(&remote),
        );

        block_on(coordinator.sign_in("a@b.c", "secret"));

        assert!(state.auth.is_signed_in());
        // replace por defecto: el documento de la nube manda
        assert_eq!(state.get_ledger().active_quantity("NUBE"), Some(4));
    }

    #[test]
    fn test_rejected_sign_in_reports_auth_error() {
        let (coordinator, state, _store, backend) = setup();
        backend.deny_auth.set(true);

        block_on(coordinator.sign_in("a@b.c", "bad"));

        assert!(!state.auth.is_signed_in());
        assert!(matches!(
            state.sync.last_event(),
            Some(SyncEvent::AuthError { .. })
        ));
    }

    #[test]
    fn test_empty_credentials_never_reach_backend() {
        let (coordinator, state, _store, _backend) = setup();
        block_on(coordinator.sign_in("", ""));
        assert!(!state.auth.is_signed_in());
        assert!(matches!(
            state.sync.last_event(),
            Some(SyncEvent::AuthError { .. })
        ));
    }

    #[test]
    fn test_sign_out_clears_session_and_stops_remote_writes() {
        let (coordinator, state, _store, backend) = setup();
        signed_in(&state);

        block_on(coordinator.sign_out());
        assert!(!state.auth.is_signed_in());
        assert_eq!(state.sync.get_status(), SyncStatus::Offline);

        // las mutaciones siguientes no intentan escritura remota
        state.with_ledger(|l| l.add_active("A1", 1)).unwrap();
        block_on(coordinator.persist_mutation());
        assert_eq!(backend.writes.get(), 0);
    }

    #[test]
    fn test_local_storage_failure_is_fatal_error() {
        let (coordinator, state, store, backend) = setup();
        signed_in(&state);
        store.fail_writes.set(true);
        state.with_ledger(|l| l.add_active("A1", 1)).unwrap();

        block_on(coordinator.persist_mutation());

        assert!(matches!(state.sync.get_status(), SyncStatus::Error { .. }));
        // ni siquiera se intenta el remoto si falló el guardado local
        assert_eq!(backend.writes.get(), 0);
    }
}
