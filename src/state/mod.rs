// ============================================================================
// STATE MODULE - State Management con Rc<RefCell> + notificaciones
// ============================================================================

pub mod app_state;
pub mod auth_state;
pub mod sync_state;

pub use app_state::*;
pub use auth_state::*;
pub use sync_state::*;
