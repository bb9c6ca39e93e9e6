// ============================================================================
// STORAGE LOCAL - Colaborador clave/valor durable
// ============================================================================
// El core depende solo del trait LocalStore; la implementación web
// (localStorage) queda detrás de cfg(wasm32) y los tests usan MemoryStore.
// ============================================================================

use crate::models::entry::{CodeEntry, StoredEntry};
use crate::models::ledger::WeekLedger;
use crate::utils::constants::{active_codes_key, deleted_codes_key};

/// Storage clave/valor durable (localStorage en el navegador)
pub trait LocalStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::LocalStore;
    use web_sys::Storage;

    fn local_storage() -> Option<Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    /// Implementación sobre window.localStorage
    #[derive(Clone, Default)]
    pub struct WebStorage;

    impl WebStorage {
        pub fn new() -> Self {
            Self
        }
    }

    impl LocalStore for WebStorage {
        fn get(&self, key: &str) -> Option<String> {
            local_storage()?.get_item(key).ok()?
        }

        fn set(&self, key: &str, value: &str) -> Result<(), String> {
            let storage =
                local_storage().ok_or("No se pudo acceder a localStorage".to_string())?;
            storage
                .set_item(key, value)
                .map_err(|_| "Error guardando en localStorage".to_string())
        }

        fn remove(&self, key: &str) -> Result<(), String> {
            let storage =
                local_storage().ok_or("No se pudo acceder a localStorage".to_string())?;
            storage
                .remove_item(key)
                .map_err(|_| "Error eliminando de localStorage".to_string())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebStorage;


// ============================================================================
// CODEC DEL LEDGER SEMANAL
// ============================================================================

/// Decodificar una colección guardada, aplicando la migración del formato
/// legacy (strings sin cantidad -> {code, quantity: 1})
pub fn decode_entries(json: &str) -> Result<Vec<CodeEntry>, String> {
    let stored: Vec<StoredEntry> =
        serde_json::from_str(json).map_err(|e| format!("Parse error: {}", e))?;
    Ok(stored
        .into_iter()
        .map(StoredEntry::upgrade)
        .filter(|e| e.quantity >= 1)
        .collect())
}

fn load_collection(store: &dyn LocalStore, key: &str) -> Vec<CodeEntry> {
    let Some(json) = store.get(key) else {
        return Vec::new();
    };
    match decode_entries(&json) {
        Ok(entries) => entries,
        Err(e) => {
            // Datos corruptos: se descartan, igual que el JSON.parse || []
            log::warn!("⚠️ Datos ilegibles en {}: {}", key, e);
            Vec::new()
        }
    }
}

/// Cargar el ledger de una semana (colecciones vacías si no hay datos)
pub fn load_week_ledger(store: &dyn LocalStore, week_id: u32) -> WeekLedger {
    WeekLedger {
        week_id,
        active: load_collection(store, &active_codes_key(week_id)),
        deleted: load_collection(store, &deleted_codes_key(week_id)),
    }
}

/// Persistir el ledger de una semana. Un fallo aquí es inesperado y el
/// llamador lo trata como LocalError (fatal).
pub fn save_week_ledger(store: &dyn LocalStore, ledger: &WeekLedger) -> Result<(), String> {
    let active =
        serde_json::to_string(&ledger.active).map_err(|e| format!("Serialize error: {}", e))?;
    let deleted =
        serde_json::to_string(&ledger.deleted).map_err(|e| format!("Serialize error: {}", e))?;
    store.set(&active_codes_key(ledger.week_id), &active)?;
    store.set(&deleted_codes_key(ledger.week_id), &deleted)?;
    Ok(())
}
