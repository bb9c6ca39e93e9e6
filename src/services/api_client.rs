// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// Implementación de CloudBackend contra el backend configurado en
// BACKEND_URL. Sin lógica de negocio: requests, códigos de estado y parseo.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::Request;

use crate::models::auth::{
    describe_auth_error, AuthResponse, CredentialsRequest, FederatedRequest,
};
use crate::models::{UserInfo, WeekDocument};
use crate::services::cloud::{AuthCallback, CloudBackend};
use crate::utils::constants::BACKEND_URL;

/// Cliente HTTP del backend de sincronización
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    // Listeners de cambios de auth; se notifican tras cada operación de
    // sesión exitosa (el onAuthStateChanged del proveedor original)
    auth_listeners: Rc<RefCell<Vec<AuthCallback>>>,
}

impl HttpBackend {
    pub fn new() -> Self {
        Self::with_base_url(BACKEND_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn notify_auth(&self, user: Option<UserInfo>) {
        let listeners: Vec<AuthCallback> = self.auth_listeners.borrow().clone();
        for listener in listeners {
            listener(user.clone());
        }
    }

    async fn auth_request(&self, path: &str, body: &impl serde::Serialize) -> Result<UserInfo, String> {
        let url = format!("{}{}", self.base_url, path);
        let response = Request::post(&url)
            .json(body)
            .map_err(|e| format!("Request build error: {}", e))?
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.ok() {
            // El backend devuelve el código del proveedor en el cuerpo
            if let Ok(parsed) = response.json::<AuthResponse>().await {
                if let Some(error) = parsed.error {
                    return Err(describe_auth_error(&error));
                }
            }
            return Err(format!("HTTP error: {}", response.status()));
        }

        let parsed = response
            .json::<AuthResponse>()
            .await
            .map_err(|e| format!("Parse error: {}", e))?;

        match (parsed.success, parsed.user) {
            (true, Some(user)) => {
                self.notify_auth(Some(user.clone()));
                Ok(user)
            }
            _ => Err(parsed
                .error
                .as_ref()
                .map(describe_auth_error)
                .unwrap_or_else(|| "An error occurred during authentication".to_string())),
        }
    }

    fn week_url(&self, uid: &str, week_id: u32) -> String {
        format!("{}/users/{}/weeks/{}", self.base_url, uid, week_id)
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl CloudBackend for HttpBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserInfo, String> {
        log::info!("🔐 Iniciando sesión para {}", email);
        self.auth_request(
            "/auth/login",
            &CredentialsRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserInfo, String> {
        log::info!("🆕 Creando cuenta para {}", email);
        self.auth_request(
            "/auth/signup",
            &CredentialsRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    async fn sign_in_federated(&self, id_token: &str) -> Result<UserInfo, String> {
        log::info!("🔐 Iniciando sesión federada");
        self.auth_request(
            "/auth/federated",
            &FederatedRequest {
                id_token: id_token.to_string(),
            },
        )
        .await
    }

    async fn sign_out(&self) -> Result<(), String> {
        let url = format!("{}/auth/logout", self.base_url);
        let response = Request::post(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.ok() {
            return Err(format!("HTTP error: {}", response.status()));
        }
        self.notify_auth(None);
        Ok(())
    }

    async fn write_week(
        &self,
        uid: &str,
        week_id: u32,
        doc: &WeekDocument,
    ) -> Result<(), String> {
        log::info!("📤 Guardando semana {} en la nube", week_id);
        let response = Request::put(&self.week_url(uid, week_id))
            .json(doc)
            .map_err(|e| format!("Request build error: {}", e))?
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.ok() {
            return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
        }
        Ok(())
    }

    async fn read_week(&self, uid: &str, week_id: u32) -> Result<Option<WeekDocument>, String> {
        log::info!("📥 Leyendo semana {} de la nube", week_id);
        let response = Request::get(&self.week_url(uid, week_id))
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if response.status() == 404 {
            return Ok(None);
        }
        if !response.ok() {
            return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
        }

        response
            .json::<WeekDocument>()
            .await
            .map(Some)
            .map_err(|e| format!("Parse error: {}", e))
    }

    fn subscribe_auth(&self, callback: AuthCallback) {
        self.auth_listeners.borrow_mut().push(callback);
    }
}
