// ============================================================================
// WEEK LEDGER - Colecciones (activos, borrados) de una semana
// ============================================================================
// Todas las operaciones son transformaciones puras sobre el ledger en memoria;
// la persistencia y la sincronización viven en services/.
// ============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::entry::{normalize_code, CodeEntry, EntryStatus};

/// Errores recuperables de las operaciones del ledger.
/// Se reportan al usuario como mensajes; nunca mutan el estado.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Code {0} not found in database")]
    NotFound(String),
    #[error("Code {0} already deleted")]
    AlreadyDeleted(String),
    #[error("Quantity must be a positive number")]
    InvalidQuantity,
}

/// Ledger de una semana: códigos activos y borrados con sus cantidades
///
/// Invariantes:
/// - `week_id` en 1..=52
/// - cantidades siempre >= 1; una entrada que llega a 0 se elimina
/// - como máximo una entrada por código normalizado en cada colección
/// - un código solo aparece en ambas colecciones cuando un borrado parcial
///   repartió sus unidades; la suma de cantidades se conserva al moverlas
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekLedger {
    pub week_id: u32,
    pub active: Vec<CodeEntry>,
    pub deleted: Vec<CodeEntry>,
}

fn find(list: &[CodeEntry], normalized: &str) -> Option<usize> {
    list.iter().position(|e| e.normalized() == normalized)
}

impl WeekLedger {
    pub fn empty(week_id: u32) -> Self {
        Self {
            week_id,
            active: Vec::new(),
            deleted: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.deleted.is_empty()
    }

    pub fn active_quantity(&self, code: &str) -> Option<u32> {
        let norm = normalize_code(code);
        find(&self.active, &norm).map(|i| self.active[i].quantity)
    }

    pub fn deleted_quantity(&self, code: &str) -> Option<u32> {
        let norm = normalize_code(code);
        find(&self.deleted, &norm).map(|i| self.deleted[i].quantity)
    }

    /// Cantidad total de un código sumando ambas colecciones
    pub fn total_quantity(&self, code: &str) -> u32 {
        self.active_quantity(code).unwrap_or(0) + self.deleted_quantity(code).unwrap_or(0)
    }

    /// Agregar un código activo (o sumar a su cantidad si ya existe).
    /// Un código presente en borrados NO se puede re-agregar: la única vía
    /// de vuelta es la operación explícita `restore`.
    pub fn add_active(&mut self, code: &str, qty: u32) -> Result<(), LedgerError> {
        if qty < 1 {
            return Err(LedgerError::InvalidQuantity);
        }
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::NotFound(code.to_string()));
        }
        let norm = normalize_code(trimmed);
        if find(&self.deleted, &norm).is_some() {
            return Err(LedgerError::AlreadyDeleted(trimmed.to_string()));
        }
        match find(&self.active, &norm) {
            Some(i) => self.active[i].quantity = self.active[i].quantity.saturating_add(qty),
            None => self.active.push(CodeEntry::new(trimmed, qty)),
        }
        Ok(())
    }

    /// Mover la entrada completa de activos a borrados (cantidad preservada)
    pub fn delete_full(&mut self, code: &str) -> Result<(), LedgerError> {
        let norm = normalize_code(code);
        match find(&self.active, &norm) {
            Some(i) => {
                let entry = self.active.remove(i);
                self.credit_deleted(&entry.code, entry.quantity);
                Ok(())
            }
            None if find(&self.deleted, &norm).is_some() => {
                Err(LedgerError::AlreadyDeleted(code.trim().to_string()))
            }
            None => Err(LedgerError::NotFound(code.trim().to_string())),
        }
    }

    /// Borrar `qty` unidades de un código activo. Si `qty` cubre toda la
    /// cantidad activa, equivale a `delete_full`.
    pub fn delete_partial(&mut self, code: &str, qty: u32) -> Result<(), LedgerError> {
        if qty < 1 {
            return Err(LedgerError::InvalidQuantity);
        }
        let norm = normalize_code(code);
        let Some(i) = find(&self.active, &norm) else {
            if find(&self.deleted, &norm).is_some() {
                return Err(LedgerError::AlreadyDeleted(code.trim().to_string()));
            }
            return Err(LedgerError::NotFound(code.trim().to_string()));
        };
        if qty >= self.active[i].quantity {
            return self.delete_full(code);
        }
        self.active[i].quantity -= qty;
        let display = self.active[i].code.clone();
        self.credit_deleted(&display, qty);
        Ok(())
    }

    /// Devolver `qty` unidades de borrados a activos (vía sancionada de
    /// vuelta). Si `qty` cubre toda la cantidad borrada, restaura la entrada
    /// completa.
    pub fn restore(&mut self, code: &str, qty: u32) -> Result<(), LedgerError> {
        if qty < 1 {
            return Err(LedgerError::InvalidQuantity);
        }
        let norm = normalize_code(code);
        let Some(i) = find(&self.deleted, &norm) else {
            return Err(LedgerError::NotFound(code.trim().to_string()));
        };
        let moved = qty.min(self.deleted[i].quantity);
        let display = self.deleted[i].code.clone();
        if moved == self.deleted[i].quantity {
            self.deleted.remove(i);
        } else {
            self.deleted[i].quantity -= moved;
        }
        self.credit_active(&display, moved);
        Ok(())
    }

    /// Fijar la cantidad de un código activo. Cantidades no positivas se
    /// rechazan; para eliminar hay que usar `delete_full`/`delete_partial`.
    pub fn adjust_quantity(&mut self, code: &str, new_qty: u32) -> Result<(), LedgerError> {
        if new_qty < 1 {
            return Err(LedgerError::InvalidQuantity);
        }
        let norm = normalize_code(code);
        match find(&self.active, &norm) {
            Some(i) => {
                self.active[i].quantity = new_qty;
                Ok(())
            }
            None if find(&self.deleted, &norm).is_some() => {
                Err(LedgerError::AlreadyDeleted(code.trim().to_string()))
            }
            None => Err(LedgerError::NotFound(code.trim().to_string())),
        }
    }

    /// Filtrar por substring (case-insensitive) en ambas colecciones.
    /// Orden determinista: activos primero, luego borrados, cada colección
    /// en orden de inserción.
    pub fn filter(&self, query: &str) -> Vec<(&CodeEntry, EntryStatus)> {
        let needle = normalize_code(query);
        self.active
            .iter()
            .filter(|e| e.normalized().contains(&needle))
            .map(|e| (e, EntryStatus::Active))
            .chain(
                self.deleted
                    .iter()
                    .filter(|e| e.normalized().contains(&needle))
                    .map(|e| (e, EntryStatus::Deleted)),
            )
            .collect()
    }

    /// Contadores (activos, borrados) sobre un resultado de filtro
    pub fn filter_stats(&self, query: &str) -> (usize, usize) {
        let results = self.filter(query);
        let active = results
            .iter()
            .filter(|(_, s)| *s == EntryStatus::Active)
            .count();
        (active, results.len() - active)
    }

    /// Ledger vacío para la misma semana. Destructivo; la confirmación es
    /// responsabilidad del llamador (UI).
    pub fn reset(&self) -> WeekLedger {
        WeekLedger::empty(self.week_id)
    }

    /// Sumar unidades en activos sin pasar por las validaciones de
    /// `add_active`. Solo para el reconciliador y el import CSV, que ya
    /// garantizan sus propias reglas.
    pub(crate) fn credit_active(&mut self, code: &str, qty: u32) {
        if qty == 0 {
            return;
        }
        let norm = normalize_code(code);
        match find(&self.active, &norm) {
            Some(i) => self.active[i].quantity = self.active[i].quantity.saturating_add(qty),
            None => self.active.push(CodeEntry::new(code.trim(), qty)),
        }
    }

    /// Sumar unidades en borrados (creando la entrada si no existe)
    pub(crate) fn credit_deleted(&mut self, code: &str, qty: u32) {
        if qty == 0 {
            return;
        }
        let norm = normalize_code(code);
        match find(&self.deleted, &norm) {
            Some(i) => self.deleted[i].quantity = self.deleted[i].quantity.saturating_add(qty),
            None => self.deleted.push(CodeEntry::new(code.trim(), qty)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(active: &[(&str, u32)], deleted: &[(&str, u32)]) -> WeekLedger {
        let mut ledger = WeekLedger::empty(12);
        for (code, qty) in active {
            ledger.credit_active(code, *qty);
        }
        for (code, qty) in deleted {
            ledger.credit_deleted(code, *qty);
        }
        ledger
    }

    #[test]
    fn test_add_new_code() {
        let mut ledger = WeekLedger::empty(1);
        ledger.add_active("ab12", 1).unwrap();
        assert_eq!(ledger.active_quantity("AB12"), Some(1));
        // casing original preservado
        assert_eq!(ledger.active[0].code, "ab12");
    }

    #[test]
    fn test_add_existing_code_sums_quantity() {
        let mut ledger = ledger_with(&[("X1", 2)], &[]);
        ledger.add_active("x1", 3).unwrap();
        assert_eq!(ledger.active_quantity("X1"), Some(5));
        assert_eq!(ledger.active.len(), 1);
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let mut ledger = WeekLedger::empty(1);
        assert_eq!(ledger.add_active("X1", 0), Err(LedgerError::InvalidQuantity));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_deleted_code_fails_without_restore() {
        let mut ledger = ledger_with(&[], &[("X1", 2)]);
        assert_eq!(
            ledger.add_active("X1", 1),
            Err(LedgerError::AlreadyDeleted("X1".to_string()))
        );
        // sin mutación
        assert_eq!(ledger.deleted_quantity("X1"), Some(2));
        assert_eq!(ledger.active_quantity("X1"), None);
    }

    #[test]
    fn test_delete_full_moves_whole_entry() {
        let mut ledger = ledger_with(&[("X1", 4)], &[]);
        ledger.delete_full("x1").unwrap();
        assert_eq!(ledger.active_quantity("X1"), None);
        assert_eq!(ledger.deleted_quantity("X1"), Some(4));
    }

    #[test]
    fn test_delete_unknown_code() {
        let mut ledger = WeekLedger::empty(1);
        assert_eq!(
            ledger.delete_full("NOPE"),
            Err(LedgerError::NotFound("NOPE".to_string()))
        );
    }

    #[test]
    fn test_delete_already_deleted_reported() {
        let mut ledger = ledger_with(&[], &[("X1", 1)]);
        assert_eq!(
            ledger.delete_full("X1"),
            Err(LedgerError::AlreadyDeleted("X1".to_string()))
        );
    }

    #[test]
    fn test_delete_partial_splits_entry() {
        // Escenario: active={X1:3}, borrar 1 -> active={X1:2}, deleted={X1:1}
        let mut ledger = ledger_with(&[("X1", 3)], &[]);
        ledger.delete_partial("X1", 1).unwrap();
        assert_eq!(ledger.active_quantity("X1"), Some(2));
        assert_eq!(ledger.deleted_quantity("X1"), Some(1));
    }

    #[test]
    fn test_delete_partial_conserves_total() {
        let mut ledger = ledger_with(&[("X1", 7)], &[]);
        let before = ledger.total_quantity("X1");
        ledger.delete_partial("X1", 3).unwrap();
        assert_eq!(ledger.total_quantity("X1"), before);
        ledger.delete_partial("X1", 2).unwrap();
        assert_eq!(ledger.total_quantity("X1"), before);
    }

    #[test]
    fn test_delete_partial_full_amount_acts_as_delete_full() {
        let mut ledger = ledger_with(&[("X1", 3)], &[]);
        ledger.delete_partial("X1", 5).unwrap();
        assert_eq!(ledger.active_quantity("X1"), None);
        assert_eq!(ledger.deleted_quantity("X1"), Some(3));
    }

    #[test]
    fn test_restore_moves_units_back() {
        let mut ledger = ledger_with(&[("X1", 2)], &[("X1", 3)]);
        ledger.restore("X1", 1).unwrap();
        assert_eq!(ledger.active_quantity("X1"), Some(3));
        assert_eq!(ledger.deleted_quantity("X1"), Some(2));
    }

    #[test]
    fn test_restore_full_removes_deleted_entry() {
        let mut ledger = ledger_with(&[], &[("X1", 2)]);
        ledger.restore("X1", 9).unwrap();
        assert_eq!(ledger.active_quantity("X1"), Some(2));
        assert_eq!(ledger.deleted_quantity("X1"), None);
    }

    #[test]
    fn test_restore_conserves_total() {
        let mut ledger = ledger_with(&[("X1", 1)], &[("X1", 4)]);
        let before = ledger.total_quantity("X1");
        ledger.restore("X1", 2).unwrap();
        assert_eq!(ledger.total_quantity("X1"), before);
    }

    #[test]
    fn test_adjust_quantity() {
        let mut ledger = ledger_with(&[("X1", 2)], &[]);
        ledger.adjust_quantity("X1", 9).unwrap();
        assert_eq!(ledger.active_quantity("X1"), Some(9));
    }

    #[test]
    fn test_adjust_quantity_to_zero_rejected() {
        let mut ledger = ledger_with(&[("X1", 2)], &[]);
        assert_eq!(
            ledger.adjust_quantity("X1", 0),
            Err(LedgerError::InvalidQuantity)
        );
        assert_eq!(ledger.active_quantity("X1"), Some(2));
    }

    #[test]
    fn test_exclusion_for_full_operation_sequences() {
        // Con add/delete_full un código nunca está en ambas colecciones
        let mut ledger = WeekLedger::empty(1);
        ledger.add_active("A1", 2).unwrap();
        ledger.add_active("B2", 1).unwrap();
        ledger.delete_full("A1").unwrap();
        assert!(ledger.add_active("A1", 1).is_err());
        ledger.delete_full("B2").unwrap();
        for entry in &ledger.active {
            assert!(ledger.deleted_quantity(&entry.code).is_none());
        }
        for entry in &ledger.deleted {
            assert!(ledger.active_quantity(&entry.code).is_none());
        }
    }

    #[test]
    fn test_filter_is_case_insensitive_and_ordered() {
        let mut ledger = ledger_with(&[("ab1", 1), ("ZZ9", 2)], &[("AB2", 3)]);
        let results = ledger.filter("ab");
        let codes: Vec<&str> = results.iter().map(|(e, _)| e.code.as_str()).collect();
        assert_eq!(codes, vec!["ab1", "AB2"]);
        assert_eq!(results[0].1, EntryStatus::Active);
        assert_eq!(results[1].1, EntryStatus::Deleted);
        assert_eq!(ledger.filter_stats("ab"), (1, 1));
        // query vacía devuelve todo
        assert_eq!(ledger.filter("").len(), 3);
        ledger.add_active("zz9", 1).unwrap();
        assert_eq!(ledger.active_quantity("ZZ9"), Some(3));
    }

    #[test]
    fn test_reset_returns_empty_same_week() {
        let ledger = ledger_with(&[("X1", 3)], &[("Y2", 1)]);
        let fresh = ledger.reset();
        assert_eq!(fresh.week_id, ledger.week_id);
        assert!(fresh.is_empty());
    }
}
