// ============================================================================
// RECONCILIADOR - Fusión de ledger local y remoto
// ============================================================================
// Función pura y determinista. Para la estrategia Merge el resultado es
// conmutativo: reconcile(A, B) == reconcile(B, A) (colecciones ordenadas por
// código normalizado).
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::entry::{normalize_code, CodeEntry};
use crate::models::ledger::WeekLedger;

/// Estrategia configurada para fusionar datos locales y de la nube
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// La nube reemplaza los datos locales
    #[default]
    Replace,
    /// Los datos locales tienen prioridad
    LocalWins,
    /// Igual que Replace; nombre distinto para claridad en la UI
    CloudWins,
    /// Unión aditiva: cantidades de códigos repetidos se suman
    Merge,
}

impl MergeStrategy {
    /// Valor persistido en las preferencias
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Replace => "replace",
            MergeStrategy::LocalWins => "local-wins",
            MergeStrategy::CloudWins => "cloud-wins",
            MergeStrategy::Merge => "merge",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "replace" => Some(MergeStrategy::Replace),
            "local-wins" => Some(MergeStrategy::LocalWins),
            "cloud-wins" => Some(MergeStrategy::CloudWins),
            "merge" => Some(MergeStrategy::Merge),
            _ => None,
        }
    }
}

// Acumulador por código normalizado durante el merge
#[derive(Default)]
struct Bucket {
    display: String,
    active: u32,
    deleted: u32,
}

impl Bucket {
    fn keep_display(&mut self, candidate: &str) {
        // Casing determinista e independiente del orden de los argumentos
        if self.display.is_empty() || candidate < self.display.as_str() {
            self.display = candidate.to_string();
        }
    }
}

/// Fusionar el ledger local con el documento remoto de la misma semana.
///
/// Sin datos remotos devuelve el local sin cambios, para toda estrategia.
/// Con `Merge`, un código borrado en cualquiera de los dos lados queda solo
/// en borrados y arrastra todas sus unidades (activas incluidas); así se
/// preserva la partición y no se pierden cantidades.
pub fn reconcile(
    local: &WeekLedger,
    remote: Option<&WeekLedger>,
    strategy: MergeStrategy,
) -> WeekLedger {
    let Some(remote) = remote else {
        return local.clone();
    };

    match strategy {
        MergeStrategy::Replace | MergeStrategy::CloudWins => WeekLedger {
            week_id: local.week_id,
            active: remote.active.clone(),
            deleted: remote.deleted.clone(),
        },
        MergeStrategy::LocalWins => local.clone(),
        MergeStrategy::Merge => merge_additive(local, remote),
    }
}

fn merge_additive(local: &WeekLedger, remote: &WeekLedger) -> WeekLedger {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    let mut feed = |entries: &[CodeEntry], deleted: bool| {
        for entry in entries {
            let bucket = buckets.entry(normalize_code(&entry.code)).or_default();
            bucket.keep_display(&entry.code);
            if deleted {
                bucket.deleted = bucket.deleted.saturating_add(entry.quantity);
            } else {
                bucket.active = bucket.active.saturating_add(entry.quantity);
            }
        }
    };

    feed(&local.active, false);
    feed(&local.deleted, true);
    feed(&remote.active, false);
    feed(&remote.deleted, true);

    let mut merged = WeekLedger::empty(local.week_id);
    // BTreeMap itera por código normalizado: salida ordenada y conmutativa
    for bucket in buckets.into_values() {
        if bucket.deleted > 0 {
            merged
                .deleted
                .push(CodeEntry::new(bucket.display, bucket.deleted.saturating_add(bucket.active)));
        } else {
            merged.active.push(CodeEntry::new(bucket.display, bucket.active));
        }
    }
    merged
}
