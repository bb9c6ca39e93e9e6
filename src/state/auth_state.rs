// ============================================================================
// AUTH STATE - Sesión del proveedor de identidad
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::UserInfo;

/// Estado de autenticación: creado vacío al arrancar, seteado al iniciar
/// sesión, limpiado al cerrarla. Decide si el coordinador intenta
/// operaciones remotas.
#[derive(Clone, Default)]
pub struct AuthState {
    pub user: Rc<RefCell<Option<UserInfo>>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&self, user: Option<UserInfo>) {
        *self.user.borrow_mut() = user;
    }

    pub fn get_user(&self) -> Option<UserInfo> {
        self.user.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.borrow().is_some()
    }

    pub fn get_uid(&self) -> Option<String> {
        self.user.borrow().as_ref().map(|u| u.uid.clone())
    }

    /// Cerrar sesión - limpiar todo
    pub fn sign_out(&self) {
        self.set_user(None);
    }
}
