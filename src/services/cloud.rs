// ============================================================================
// CLOUD BACKEND - Colaborador de identidad + document store
// ============================================================================
// El core depende solo de este trait, nunca de un proveedor concreto.
// Los errores viajan como String en este borde y el coordinador los
// clasifica (AuthError/SyncError).
// ============================================================================

use std::rc::Rc;

use async_trait::async_trait;

use crate::models::{UserInfo, WeekDocument};

/// Callback registrado para cambios de estado de autenticación
pub type AuthCallback = Rc<dyn Fn(Option<UserInfo>)>;

/// Proveedor de identidad + document store remoto, keyed por usuario.
/// Futures !Send: todo corre en el hilo lógico del navegador.
#[async_trait(?Send)]
pub trait CloudBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserInfo, String>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserInfo, String>;

    /// Login federado con un token de identidad ya obtenido por la UI
    async fn sign_in_federated(&self, id_token: &str) -> Result<UserInfo, String>;

    async fn sign_out(&self) -> Result<(), String>;

    /// Escribir el documento de una semana (last-write-wins por documento)
    async fn write_week(&self, uid: &str, week_id: u32, doc: &WeekDocument)
        -> Result<(), String>;

    /// Leer el documento de una semana; Ok(None) si no existe
    async fn read_week(&self, uid: &str, week_id: u32) -> Result<Option<WeekDocument>, String>;

    /// Suscribirse al stream de cambios de autenticación
    fn subscribe_auth(&self, callback: AuthCallback);
}
