// ============================================================================
// CSV - Import/export del ledger semanal
// ============================================================================
// Formato de línea: code[,quantity[,status]]
// - cantidad ausente o vacía => 1
// - status "Deleted" (case-insensitive) => va a la colección de borrados
// - la fila de cabecera se detecta y se salta automáticamente
// El contenido ya viene leído como texto; el file picker y la descarga son
// responsabilidad de la capa externa.
// ============================================================================

use crate::models::ledger::{LedgerError, WeekLedger};

/// Contadores del resultado de un import (nada es fatal)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Códigos nuevos incorporados
    pub imported: usize,
    /// Filas sumadas a un código ya existente
    pub merged: usize,
    /// Filas rechazadas por apuntar a un código borrado
    pub duplicates: usize,
    /// Filas con código vacío o cantidad ilegible
    pub invalid: usize,
}

impl ImportReport {
    pub fn changed(&self) -> bool {
        self.imported > 0 || self.merged > 0
    }

    /// Mensaje de una línea para el usuario
    pub fn summary(&self) -> String {
        if !self.changed() {
            let mut message = "No valid new codes found in file".to_string();
            if self.duplicates > 0 {
                message.push_str(&format!(" ({} duplicates found)", self.duplicates));
            }
            if self.invalid > 0 {
                message.push_str(&format!(" ({} invalid entries)", self.invalid));
            }
            return message;
        }
        let mut message = format!("Imported {} new codes", self.imported);
        if self.merged > 0 {
            message.push_str(&format!(", {} merged", self.merged));
        }
        if self.duplicates > 0 {
            message.push_str(&format!(", {} duplicates skipped", self.duplicates));
        }
        if self.invalid > 0 {
            message.push_str(&format!(", {} invalid entries", self.invalid));
        }
        message
    }
}

fn is_header(first_field: &str) -> bool {
    first_field.eq_ignore_ascii_case("code")
}

/// Importar filas CSV al ledger. Las filas Deleted primero drenan unidades
/// activas que ya existían antes del import (conservación) y el resto entra
/// directo a borrados. Las unidades agregadas por el propio import no se
/// drenan: así un export vuelve a importarse sin redistribuir cantidades.
pub fn import_csv(ledger: &mut WeekLedger, content: &str) -> ImportReport {
    let mut report = ImportReport::default();
    let mut first_row = true;

    // Cantidades activas previas al import, por código normalizado
    let mut pre_active: std::collections::HashMap<String, u32> = ledger
        .active
        .iter()
        .map(|e| (e.normalized(), e.quantity))
        .collect();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(',');
        let code = fields.next().unwrap_or("").trim();

        if first_row && is_header(code) {
            first_row = false;
            continue;
        }
        first_row = false;

        if code.is_empty() {
            report.invalid += 1;
            continue;
        }

        let quantity = match fields.next().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(q) if q >= 1 => q,
                _ => {
                    report.invalid += 1;
                    continue;
                }
            },
        };

        let deleted_row = fields
            .next()
            .map(|s| s.trim().eq_ignore_ascii_case("deleted"))
            .unwrap_or(false);

        let existed = ledger.total_quantity(code) > 0;

        if deleted_row {
            // Drenar primero de activos pre-existentes: Z9 activo en 5 +
            // fila "Z9,3,Deleted" => activo 2, borrado 3
            let norm = crate::models::entry::normalize_code(code);
            let available = pre_active.entry(norm).or_insert(0);
            let drain = quantity.min(*available);
            *available -= drain;
            if drain > 0 {
                // no puede fallar: el código está activo con cantidad >= drain
                let _ = ledger.delete_partial(code, drain);
            }
            ledger.credit_deleted(code, quantity - drain);
            if existed {
                report.merged += 1;
            } else {
                report.imported += 1;
            }
        } else {
            match ledger.add_active(code, quantity) {
                Ok(()) if existed => report.merged += 1,
                Ok(()) => report.imported += 1,
                Err(LedgerError::AlreadyDeleted(_)) => report.duplicates += 1,
                Err(_) => report.invalid += 1,
            }
        }
    }

    report
}

/// Exportar el ledger completo: cabecera + activos + borrados
pub fn export_csv(ledger: &WeekLedger) -> String {
    let mut rows = Vec::with_capacity(1 + ledger.active.len() + ledger.deleted.len());
    rows.push("Code,Quantity,Status".to_string());
    for entry in &ledger.active {
        rows.push(format!("{},{},Active", entry.code, entry.quantity));
    }
    for entry in &ledger.deleted {
        rows.push(format!("{},{},Deleted", entry.code, entry.quantity));
    }
    rows.join("\n")
}

/// Nombre de archivo con la semana seleccionada
pub fn export_filename(week_id: u32) -> String {
    format!("tracking_codes_week_{}.csv", week_id)
}
