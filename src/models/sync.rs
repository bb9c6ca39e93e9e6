use serde::{Deserialize, Serialize};

use crate::models::auth::UserInfo;
use crate::models::entry::CodeEntry;
use crate::models::ledger::WeekLedger;

/// Estado del indicador de sincronización
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced,
    Offline,
    Error { message: String },
}

/// Operación remota que falló (para mensajes y eventos)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOperation {
    Save,
    Load,
}

/// Eventos emitidos hacia el observador de estado (protocolo heredado del
/// listener del manager de nube: data-saved, data-loaded, data-empty,
/// data-error, auth-change, auth-error)
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    DataSaved { week_id: u32 },
    DataLoaded { week_id: u32 },
    DataEmpty { week_id: u32 },
    DataError { operation: SyncOperation, message: String },
    AuthChanged { user: Option<UserInfo> },
    AuthError { message: String },
}

/// Clasificación de fallos fuera del ledger.
/// Auth y Sync son recuperables (los datos locales siguen siendo la
/// autoridad); Local es inesperado y se trata como fatal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AppFailure {
    #[error("Auth error: {0}")]
    Auth(String),
    #[error("Sync error: {0}")]
    Sync(String),
    #[error("Local storage error: {0}")]
    Local(String),
}

// ============================================================================
// DOCUMENTO SEMANAL REMOTO (formato wire)
// ============================================================================

/// Documento de una semana tal como viaja al document store
/// (mismo shape que el documento original: activeCodes/deletedCodes)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeekDocument {
    #[serde(rename = "activeCodes")]
    pub active_codes: Vec<CodeEntry>,
    #[serde(rename = "deletedCodes")]
    pub deleted_codes: Vec<CodeEntry>,
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

impl WeekDocument {
    pub fn from_ledger(ledger: &WeekLedger) -> Self {
        Self {
            active_codes: ledger.active.clone(),
            deleted_codes: ledger.deleted.clone(),
            last_updated: Some(chrono::Utc::now().timestamp()),
        }
    }

    pub fn into_ledger(self, week_id: u32) -> WeekLedger {
        WeekLedger {
            week_id,
            active: self.active_codes,
            deleted: self.deleted_codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_document_wire_shape() {
        let doc = WeekDocument {
            active_codes: vec![CodeEntry::new("A1", 2)],
            deleted_codes: vec![],
            last_updated: Some(1700000000),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"activeCodes\""));
        assert!(json.contains("\"deletedCodes\""));
        assert!(json.contains("\"lastUpdated\""));

        let parsed: WeekDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_document_ledger_roundtrip() {
        let mut ledger = WeekLedger::empty(33);
        ledger.add_active("A1", 2).unwrap();
        ledger.add_active("B2", 1).unwrap();
        ledger.delete_full("B2").unwrap();

        let back = WeekDocument::from_ledger(&ledger).into_ledger(33);
        assert_eq!(back, ledger);
    }
}
