/// URL base del backend de sincronización
/// Configurada en tiempo de compilación:
/// - Desarrollo: http://localhost:3000 (por defecto)
/// - Producción: via BACKEND_URL en .env / variable de entorno
pub const BACKEND_URL: &str = match option_env!("BACKEND_URL") {
    Some(url) => url,
    None => "http://localhost:3000",
};

/// Preferencia persistida: estrategia de merge
pub const STRATEGY_PREF_KEY: &str = "mergeStrategy";

/// Clave de storage para los códigos activos de una semana
pub fn active_codes_key(week_id: u32) -> String {
    format!("activeCodes_{}", week_id)
}

/// Clave de storage para los códigos borrados de una semana
pub fn deleted_codes_key(week_id: u32) -> String {
    format!("deletedCodes_{}", week_id)
}
