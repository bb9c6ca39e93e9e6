use serde::{Deserialize, Serialize};

/// Usuario autenticado en el proveedor de identidad
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct FederatedRequest {
    #[serde(rename = "idToken")]
    pub id_token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserInfo>,
    #[serde(default)]
    pub error: Option<AuthErrorInfo>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthErrorInfo {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Mensaje amigable para los códigos de error del proveedor
pub fn auth_error_message(code: &str) -> Option<&'static str> {
    match code {
        "auth/invalid-email" => Some("Invalid email address format"),
        "auth/user-disabled" => Some("This account has been disabled"),
        "auth/user-not-found" | "auth/wrong-password" => Some("Invalid email or password"),
        "auth/email-already-in-use" => Some("Email already in use"),
        "auth/weak-password" => Some("Password is too weak"),
        "auth/operation-not-allowed" => Some("This login method is not enabled"),
        "auth/too-many-requests" => Some("Too many failed login attempts. Try again later"),
        _ => None,
    }
}

/// Traducir el error del proveedor a un mensaje para el usuario.
/// Código desconocido: se usa el mensaje del proveedor tal cual.
pub fn describe_auth_error(info: &AuthErrorInfo) -> String {
    if let Some(code) = info.code.as_deref() {
        if let Some(message) = auth_error_message(code) {
            return message.to_string();
        }
    }
    info.message
        .clone()
        .unwrap_or_else(|| "An error occurred during authentication".to_string())
}

/// Chequeos de credenciales previos a llamar al proveedor
pub fn validate_credentials(email: &str, password: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Email and password are required".to_string());
    }
    Ok(())
}

/// Chequeos adicionales para el alta de cuenta
pub fn validate_signup(email: &str, password: &str) -> Result<(), String> {
    validate_credentials(email, password)?;
    if password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_provider_codes_are_mapped() {
        assert_eq!(
            auth_error_message("auth/invalid-email"),
            Some("Invalid email address format")
        );
        assert_eq!(
            auth_error_message("auth/wrong-password"),
            auth_error_message("auth/user-not-found")
        );
        assert_eq!(auth_error_message("auth/other"), None);
    }

    #[test]
    fn test_unknown_code_falls_back_to_provider_message() {
        let info = AuthErrorInfo {
            code: Some("auth/internal".to_string()),
            message: Some("boom".to_string()),
        };
        assert_eq!(describe_auth_error(&info), "boom");

        let empty = AuthErrorInfo {
            code: None,
            message: None,
        };
        assert_eq!(
            describe_auth_error(&empty),
            "An error occurred during authentication"
        );
    }

    #[test]
    fn test_credential_prechecks() {
        assert!(validate_credentials("", "pw").is_err());
        assert!(validate_credentials("a@b.c", "").is_err());
        assert!(validate_credentials("a@b.c", "secret").is_ok());
        assert!(validate_signup("a@b.c", "12345").is_err());
        assert!(validate_signup("a@b.c", "123456").is_ok());
    }
}
