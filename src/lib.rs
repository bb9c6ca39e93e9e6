// ============================================================================
// TRACKING CODES PWA - GESTOR DE CÓDIGOS DE SEGUIMIENTO (RUST PURO)
// ============================================================================
// Arquitectura por capas:
// - Models: ledger semanal, reconciliador, tipos wire (sin I/O)
// - Services: backend de nube, CSV, coordinador de sincronización
// - State: State Management con Rc<RefCell> + subscribers
// - App: comandos explícitos consumidos por dispatch
// El render vive en JS: consume snapshots ViewState y despacha Commands.
// ============================================================================

pub mod app;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use crate::app::{App, Command, CsvExport, ViewState};

// ============================================================================
// BOOT WASM
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub mod boot {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use wasm_logger::Config;

    use crate::app::{App, Command};
    use crate::models::SyncEvent;
    use crate::services::api_client::HttpBackend;
    use crate::services::cloud::CloudBackend;
    use crate::services::SyncCoordinator;
    use crate::state::{current_week, AppState};
    use crate::utils::storage::WebStorage;

    // Instancia global de la app, viva durante toda la sesión
    thread_local! {
        static APP: RefCell<Option<App>> = RefCell::new(None);
    }

    fn with_app<R>(f: impl FnOnce(&App) -> R) -> Option<R> {
        APP.with(|cell| cell.borrow().as_ref().map(f))
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        wasm_logger::init(Config::default());
        log::info!("🚀 Tracking Codes PWA - Rust + WASM");

        let store = Rc::new(WebStorage::new());
        let backend = Rc::new(HttpBackend::new());
        let state = AppState::new(store.clone());

        // Cambios de sesión empujados por el backend (token expirado,
        // login en otra pestaña) se reflejan en el estado
        {
            let auth = state.auth.clone();
            let sync = state.sync.clone();
            backend.subscribe_auth(Rc::new(move |user| {
                log::info!("🔔 Cambio de sesión del backend: {:?}", user.is_some());
                auth.set_user(user.clone());
                sync.emit(SyncEvent::AuthChanged { user });
            }));
        }

        let coordinator = SyncCoordinator::new(state.clone(), store, backend);
        let app = App::new(state, coordinator);

        APP.with(|cell| {
            *cell.borrow_mut() = Some(app.clone());
        });

        // Carga inicial: semana ISO actual desde el storage local
        spawn_local(async move {
            app.dispatch(Command::ChangeWeek {
                week: current_week(),
            })
            .await;
        });

        Ok(())
    }

    /// Despachar un comando serializado como JSON (ver `Command`)
    #[wasm_bindgen]
    pub fn dispatch(command_json: &str) -> Result<(), JsValue> {
        let command: Command = serde_json::from_str(command_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid command: {}", e)))?;
        let Some(app) = with_app(App::clone) else {
            return Err(JsValue::from_str("App not initialized"));
        };
        spawn_local(async move {
            app.dispatch(command).await;
        });
        Ok(())
    }

    /// Snapshot del estado como JSON para el render
    #[wasm_bindgen]
    pub fn view_state() -> Result<String, JsValue> {
        with_app(|app| {
            serde_json::to_string(&app.view_state())
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
        .unwrap_or_else(|| Err(JsValue::from_str("App not initialized")))
    }

    /// Consumir el CSV pendiente de descarga: JSON {filename, content} o null
    #[wasm_bindgen]
    pub fn take_export() -> Result<JsValue, JsValue> {
        match with_app(App::take_export).flatten() {
            Some(export) => serde_json::to_string(&export)
                .map(|json| JsValue::from_str(&json))
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    /// Registrar el callback de re-render de la capa JS
    #[wasm_bindgen]
    pub fn subscribe_render(callback: js_sys::Function) {
        let registered = with_app(|app| {
            app.state.subscribe_to_changes(move || {
                if let Err(e) = callback.call0(&JsValue::NULL) {
                    log::error!("❌ Error en callback de render: {:?}", e);
                }
            });
        });
        if registered.is_none() {
            log::warn!("⚠️ subscribe_render llamado antes de inicializar la app");
        }
    }
}
