use serde::{Deserialize, Serialize};

/// Entrada de código con cantidad
///
/// `code` se guarda con su casing original; las búsquedas y comparaciones
/// usan la forma normalizada en mayúsculas (ver `normalize_code`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub quantity: u32,
}

impl CodeEntry {
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            code: code.into(),
            quantity,
        }
    }

    /// Forma normalizada del código (para lookup/filtrado)
    pub fn normalized(&self) -> String {
        normalize_code(&self.code)
    }
}

/// Normalizar un código para comparación: trim + mayúsculas
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Estado de una entrada dentro del ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Active,
    Deleted,
}

impl EntryStatus {
    /// Etiqueta usada en el CSV exportado
    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::Active => "Active",
            EntryStatus::Deleted => "Deleted",
        }
    }
}

// ============================================================================
// MIGRACIÓN DEL FORMATO LEGACY
// ============================================================================
// Las versiones antiguas guardaban arrays de strings ("ABC123") en lugar de
// objetos {code, quantity}. La migración se aplica una sola vez al decodificar
// y queda aislada aquí; el resto del código solo ve CodeEntry.

/// Entrada tal como puede aparecer en el storage: formato actual o legacy
#[derive(Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Full(CodeEntry),
    Legacy(String),
}

impl StoredEntry {
    /// Upgrade al formato actual: un string legacy vale cantidad 1
    pub fn upgrade(self) -> CodeEntry {
        match self {
            StoredEntry::Full(entry) => entry,
            StoredEntry::Legacy(code) => CodeEntry::new(code, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  ab12c "), "AB12C");
        assert_eq!(normalize_code("X1"), "X1");
    }

    #[test]
    fn test_legacy_string_upgrades_to_quantity_one() {
        let stored: Vec<StoredEntry> = serde_json::from_str(r#"["ABC123", "xy9"]"#).unwrap();
        let entries: Vec<CodeEntry> = stored.into_iter().map(StoredEntry::upgrade).collect();
        assert_eq!(
            entries,
            vec![CodeEntry::new("ABC123", 1), CodeEntry::new("xy9", 1)]
        );
    }

    #[test]
    fn test_mixed_formats_decode() {
        let json = r#"[{"code":"A1","quantity":3}, "B2"]"#;
        let stored: Vec<StoredEntry> = serde_json::from_str(json).unwrap();
        let entries: Vec<CodeEntry> = stored.into_iter().map(StoredEntry::upgrade).collect();
        assert_eq!(entries[0], CodeEntry::new("A1", 3));
        assert_eq!(entries[1], CodeEntry::new("B2", 1));
    }
}
