// ============================================================================
// APP - Comandos y orquestación
// ============================================================================
// Reemplaza el cableado de event listeners del original por un enum de
// comandos explícito: la capa de render (JS) serializa un Command, dispatch
// lo aplica sobre el estado y dispara a los subscribers para re-render.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::models::{EntryStatus, MergeStrategy, SyncStatus};
use crate::services::csv_service::{export_csv, export_filename, import_csv};
use crate::services::SyncCoordinator;
use crate::state::{AppState, Notice, NoticeKind, MAX_WEEK, MIN_WEEK};

/// Acciones que la UI puede despachar
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    AddCode { code: String, quantity: Option<u32> },
    DeleteCode { code: String },
    DeletePartial { code: String, quantity: u32 },
    Restore { code: String, quantity: u32 },
    AdjustQuantity { code: String, quantity: u32 },
    SetFilter { query: String },
    ChangeWeek { week: u32 },
    ResetWeek,
    ImportCsv { content: String },
    ExportCsv,
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    SignInFederated { id_token: String },
    SignOut,
    SetStrategy { strategy: MergeStrategy },
}

/// Archivo CSV generado, listo para descargar
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

/// Fila del listado filtrado, tal como la consume el render
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub code: String,
    pub quantity: u32,
    pub status: EntryStatus,
}

/// Snapshot serializable del estado para la capa de render
#[derive(Clone, Debug, Serialize)]
pub struct ViewState {
    pub week: u32,
    pub signed_in: bool,
    pub email: Option<String>,
    pub status: SyncStatus,
    pub strategy: MergeStrategy,
    pub filter: String,
    pub entries: Vec<EntryView>,
    pub active_count: usize,
    pub deleted_count: usize,
    pub notice: Option<Notice>,
}

/// Fachada de la aplicación: estado + coordinador de sincronización
#[derive(Clone)]
pub struct App {
    pub state: AppState,
    coordinator: SyncCoordinator,
    pending_export: Rc<RefCell<Option<CsvExport>>>,
}

impl App {
    pub fn new(state: AppState, coordinator: SyncCoordinator) -> Self {
        Self {
            state,
            coordinator,
            pending_export: Rc::new(RefCell::new(None)),
        }
    }

    /// Consumir el CSV pendiente de descarga (si un ExportCsv lo generó)
    pub fn take_export(&self) -> Option<CsvExport> {
        self.pending_export.borrow_mut().take()
    }

    /// Aplicar un comando. Las mutaciones del ledger se guardan local
    /// (y remoto con sesión activa) antes de notificar a los subscribers.
    pub async fn dispatch(&self, command: Command) {
        match command {
            Command::AddCode { code, quantity } => {
                let code = code.trim().to_string();
                if code.is_empty() {
                    self.state
                        .show_message("Please enter a code", NoticeKind::Error);
                } else {
                    let qty = quantity.unwrap_or(1);
                    match self.state.with_ledger(|l| l.add_active(&code, qty)) {
                        Ok(()) => {
                            self.state.show_message(
                                format!("Code \"{}\" added", code),
                                NoticeKind::Success,
                            );
                            self.coordinator.persist_mutation().await;
                        }
                        Err(e) => self.state.show_message(e.to_string(), NoticeKind::Error),
                    }
                }
            }
            Command::DeleteCode { code } => {
                match self.state.with_ledger(|l| l.delete_full(&code)) {
                    Ok(()) => {
                        self.state.show_message(
                            format!("Code \"{}\" deleted", code.trim()),
                            NoticeKind::Success,
                        );
                        self.coordinator.persist_mutation().await;
                    }
                    Err(e) => self.state.show_message(e.to_string(), NoticeKind::Error),
                }
            }
            Command::DeletePartial { code, quantity } => {
                match self.state.with_ledger(|l| l.delete_partial(&code, quantity)) {
                    Ok(()) => {
                        self.state.show_message(
                            format!("Deleted {} of code \"{}\"", quantity, code.trim()),
                            NoticeKind::Success,
                        );
                        self.coordinator.persist_mutation().await;
                    }
                    Err(e) => self.state.show_message(e.to_string(), NoticeKind::Error),
                }
            }
            Command::Restore { code, quantity } => {
                match self.state.with_ledger(|l| l.restore(&code, quantity)) {
                    Ok(()) => {
                        self.state.show_message(
                            format!("Code \"{}\" restored", code.trim()),
                            NoticeKind::Success,
                        );
                        self.coordinator.persist_mutation().await;
                    }
                    Err(e) => self.state.show_message(e.to_string(), NoticeKind::Error),
                }
            }
            Command::AdjustQuantity { code, quantity } => {
                match self.state.with_ledger(|l| l.adjust_quantity(&code, quantity)) {
                    Ok(()) => self.coordinator.persist_mutation().await,
                    Err(e) => self.state.show_message(e.to_string(), NoticeKind::Error),
                }
            }
            Command::SetFilter { query } => {
                self.state.set_filter(query);
            }
            Command::ChangeWeek { week } => {
                if !(MIN_WEEK..=MAX_WEEK).contains(&week) {
                    self.state.show_message(
                        format!("Week must be between {} and {}", MIN_WEEK, MAX_WEEK),
                        NoticeKind::Error,
                    );
                } else {
                    self.coordinator.load_week(week).await;
                }
            }
            Command::ResetWeek => {
                let empty = self.state.with_ledger(|l| l.reset());
                self.state.set_ledger(empty);
                self.state
                    .show_message("Week data cleared", NoticeKind::Info);
                self.coordinator.persist_mutation().await;
            }
            Command::ImportCsv { content } => {
                let report = self.state.with_ledger(|l| import_csv(l, &content));
                let kind = if report.changed() {
                    NoticeKind::Success
                } else {
                    NoticeKind::Info
                };
                self.state.show_message(report.summary(), kind);
                if report.changed() {
                    self.coordinator.persist_mutation().await;
                }
            }
            Command::ExportCsv => {
                // El archivo queda pendiente para que el boot layer lo baje
                let ledger = self.state.get_ledger();
                if ledger.is_empty() {
                    self.state
                        .show_message("No data to export", NoticeKind::Info);
                } else {
                    *self.pending_export.borrow_mut() = Some(CsvExport {
                        filename: export_filename(ledger.week_id),
                        content: export_csv(&ledger),
                    });
                    self.state
                        .show_message("CSV file exported", NoticeKind::Success);
                }
            }
            Command::SignIn { email, password } => {
                self.coordinator.sign_in(&email, &password).await;
            }
            Command::SignUp { email, password } => {
                self.coordinator.sign_up(&email, &password).await;
            }
            Command::SignInFederated { id_token } => {
                self.coordinator.sign_in_federated(&id_token).await;
            }
            Command::SignOut => {
                self.coordinator.sign_out().await;
            }
            Command::SetStrategy { strategy } => {
                self.state.set_strategy(strategy);
                self.state.show_message(
                    format!("Merge strategy set to {}", strategy.as_str()),
                    NoticeKind::Info,
                );
            }
        }
        self.state.notify_subscribers();
    }

    /// Snapshot del estado para render (listado ya filtrado)
    pub fn view_state(&self) -> ViewState {
        let filter = self.state.get_filter();
        let ledger = self.state.get_ledger();
        let entries: Vec<EntryView> = ledger
            .filter(&filter)
            .into_iter()
            .map(|(entry, status)| EntryView {
                code: entry.code.clone(),
                quantity: entry.quantity,
                status,
            })
            .collect();
        let (active_count, deleted_count) = ledger.filter_stats(&filter);

        ViewState {
            week: self.state.get_week(),
            signed_in: self.state.auth.is_signed_in(),
            email: self.state.auth.get_user().and_then(|u| u.email),
            status: self.state.sync.get_status(),
            strategy: self.state.get_strategy(),
            filter,
            entries,
            active_count,
            deleted_count,
            notice: self.state.take_notice(),
        }
    }
}
