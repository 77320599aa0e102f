use crate::api::{ApiError, Backend};
use crate::filter::{self, Query};
use crate::form::{AdminForm, Mutation};
use crate::model::ErrorRecord;
use crate::store::{CatalogStore, LoadState};
use crate::translate::Translations;
use crate::ui::password_overlay::{PasswordInputOverlay, PasswordInputResult};
use crate::view::{self, ResultsView, TableRow};
use crate::worker::{Request, Response};
use std::time::Instant;

/// Which view is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Catalog,
    Admin,
}

/// Input mode for the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Which half of the admin view receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminFocus {
    Table,
    Form,
}

/// Blocking popups; they swallow input until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Alert(String),
    ConfirmDelete { code: String },
}

/// Rows taken by header, search bar, borders and status bar.
pub const LIST_OVERHEAD: u16 = 9;
/// Lines per rendered catalog card.
pub const CARD_HEIGHT: u16 = 4;

/// Main application state.
pub struct App {
    pub should_quit: bool,
    pub view: View,
    pub show_help: bool,

    pub store: CatalogStore,
    pub translations: Option<Translations>,

    // Catalog view state
    pub query: Query,
    pub input_mode: InputMode,
    pub filtered_indices: Vec<usize>,
    pub results: ResultsView,
    pub rendered_at: Instant,
    pub list_selected: usize,
    pub page_size: usize,

    // Admin view state
    pub writable: bool,
    pub authenticated: bool,
    /// Catalog location shown in the login prompt
    pub target: String,
    pub table: Vec<TableRow>,
    pub table_selected: usize,
    pub admin_focus: AdminFocus,
    pub form: AdminForm,
    pub dialog: Option<Dialog>,
    pub login: Option<PasswordInputOverlay>,

    // Requests waiting to be spawned
    outbox: Vec<Request>,
    pub in_flight: usize,

    pub status_msg: String,
}

impl App {
    pub fn new(translations: Option<Translations>, writable: bool) -> Self {
        Self {
            should_quit: false,
            view: View::Catalog,
            show_help: false,

            store: CatalogStore::new(),
            translations,

            query: Query::default(),
            input_mode: InputMode::Normal,
            filtered_indices: Vec::new(),
            results: ResultsView::Loading,
            rendered_at: Instant::now(),
            list_selected: 0,
            page_size: 5,

            writable,
            authenticated: false,
            target: String::new(),
            table: Vec::new(),
            table_selected: 0,
            admin_focus: AdminFocus::Form,
            form: AdminForm::new(),
            dialog: None,
            login: None,

            outbox: Vec::new(),
            in_flight: 0,

            status_msg: "Loading error codes...".to_string(),
        }
    }

    /// Queue the initial catalog load.
    pub fn init(&mut self) {
        self.reload();
    }

    fn request(&mut self, request: Request) {
        self.in_flight += 1;
        self.outbox.push(request);
    }

    /// Drain requests for the worker.
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Full-set refresh.
    pub fn reload(&mut self) {
        self.store.mark_loading();
        if self.filtered_indices.is_empty() {
            self.results = ResultsView::Loading;
        }
        self.request(Request::Load);
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Apply a worker response, queueing any follow-up request.
    pub fn handle_response(&mut self, response: Response) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match response {
            Response::Loaded(result) => {
                self.store.apply(result);
                self.refresh_views();
            }
            Response::Mutated { mutation, result } => self.on_mutated(mutation, result),
            Response::LoggedIn(result) => match result {
                Ok(()) => {
                    tracing::info!("admin session opened");
                    self.authenticated = true;
                    self.login = None;
                    self.view = View::Admin;
                    self.status_msg = "Logged in".to_string();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "login failed");
                    if let Some(overlay) = self.login.as_mut() {
                        overlay.set_error(e.to_string());
                    }
                }
            },
            Response::LoggedOut(result) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "logout request failed");
                }
                self.authenticated = false;
                self.form.reset();
                self.view = View::Catalog;
                self.status_msg = "Logged out".to_string();
            }
        }
    }

    fn on_mutated(&mut self, mutation: Mutation, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                if !matches!(mutation, Mutation::Delete { .. }) {
                    self.form.reset();
                    self.admin_focus = AdminFocus::Table;
                }
                self.status_msg = format!("Error code {}: {} done", mutation.code(), mutation.verb());
                self.reload();
            }
            Err(e) if e.is_unauthorized() => {
                self.authenticated = false;
                self.login = Some(self.login_overlay("Admin password:").with_notice(format!("Session expired ({e})")));
            }
            Err(e) => {
                let message = match mutation {
                    Mutation::Delete { .. } => format!("Failed to delete: {}", e.user_message()),
                    _ => format!("An error occurred: {}", e.user_message()),
                };
                self.dialog = Some(Dialog::Alert(message));
            }
        }
    }

    /// Rebuild catalog results and admin table from the store.
    pub fn refresh_views(&mut self) {
        let state = self.store.state().clone();
        match state {
            LoadState::Failed(_) => {
                self.filtered_indices.clear();
                let results = view::load_failed(self.translations.as_ref());
                if let ResultsView::Failed(message) = &results {
                    self.status_msg = message.clone();
                }
                self.results = results;
                self.table.clear();
                self.table_selected = 0;
            }
            LoadState::Loading => {}
            LoadState::Ready => {
                self.apply_filter();
                self.table = view::table_rows(self.store.records());
                self.table_selected = self.table_selected.min(self.table.len().saturating_sub(1));
            }
        }
    }

    /// Re-run the filter and rebuild the cards.
    pub fn apply_filter(&mut self) {
        if let LoadState::Failed(_) = self.store.state() {
            return;
        }
        let records = self.store.records();
        self.filtered_indices = filter::filter_indices(records, &self.query, self.translations.as_ref());
        let visible: Vec<&ErrorRecord> = self.filtered_indices.iter().map(|&i| &records[i]).collect();
        self.results = view::build_results(&visible, self.translations.as_ref());
        self.rendered_at = Instant::now();
        self.list_selected = 0;

        self.status_msg = format!(
            "{} of {} error codes for \"{}\"{}",
            self.filtered_indices.len(),
            records.len(),
            if self.query.text.is_empty() { "all" } else { &self.query.text },
            match &self.query.platform {
                Some(p) => format!(" on {}", p),
                None => String::new(),
            }
        );
    }

    /// Step through the platform facets; `None` (all platforms) sits
    /// between the last and the first facet.
    pub fn cycle_platform(&mut self, forward: bool) {
        let facets = self.store.facets();
        if facets.is_empty() {
            self.query.platform = None;
            return;
        }
        let current = self
            .query
            .platform
            .as_ref()
            .and_then(|p| facets.iter().position(|f| f == p));
        let next = match (current, forward) {
            (None, true) => Some(0),
            (None, false) => Some(facets.len() - 1),
            (Some(i), true) if i + 1 < facets.len() => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            _ => None,
        };
        self.query.platform = next.map(|i| facets[i].clone());
        self.apply_filter();
    }

    pub fn update_page_size(&mut self, terminal_height: u16) {
        let rows = terminal_height.saturating_sub(LIST_OVERHEAD) / CARD_HEIGHT;
        self.page_size = (rows as usize).max(1);
    }

    pub fn list_next(&mut self) {
        if self.list_selected + 1 < self.results.len() {
            self.list_selected += 1;
        }
    }

    pub fn list_prev(&mut self) {
        self.list_selected = self.list_selected.saturating_sub(1);
    }

    pub fn list_page_down(&mut self) {
        let last = self.results.len().saturating_sub(1);
        self.list_selected = (self.list_selected + self.page_size).min(last);
    }

    pub fn list_page_up(&mut self) {
        self.list_selected = self.list_selected.saturating_sub(self.page_size);
    }

    pub fn table_next(&mut self) {
        if self.table_selected + 1 < self.table.len() {
            self.table_selected += 1;
        }
    }

    pub fn table_prev(&mut self) {
        self.table_selected = self.table_selected.saturating_sub(1);
    }

    /// Switch to the admin view, asking for the password first if needed.
    pub fn open_admin(&mut self) {
        if !self.writable {
            self.status_msg = "This catalog source is read-only".to_string();
            return;
        }
        if self.authenticated {
            self.view = View::Admin;
        } else {
            self.login = Some(self.login_overlay("Admin password:"));
        }
    }

    /// Log in before the TUI starts. Read-only sources have no session,
    /// so the password is ignored for them.
    pub async fn pre_login<B: Backend>(&mut self, backend: &B, password: &str) -> Result<(), ApiError> {
        if !self.writable {
            tracing::warn!(source = %self.target, "read-only catalog source, skipping login");
            return Ok(());
        }
        match backend.login(password).await {
            Ok(()) => {
                tracing::info!("admin session opened");
                self.authenticated = true;
                self.view = View::Admin;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "login rejected");
                Err(e)
            }
        }
    }

    fn login_overlay(&self, prompt: &str) -> PasswordInputOverlay {
        PasswordInputOverlay::new(prompt.to_string()).with_target(&self.target)
    }

    pub fn handle_login_result(&mut self, result: PasswordInputResult) {
        match result {
            PasswordInputResult::Submit(password) => self.request(Request::Login { password }),
            PasswordInputResult::Cancel => {
                self.login = None;
            }
        }
    }

    pub fn logout(&mut self) {
        self.request(Request::Logout);
    }

    pub fn selected_code(&self) -> Option<&str> {
        self.table.get(self.table_selected).map(|r| r.code.as_str())
    }

    /// Load the selected row into the form for editing.
    pub fn edit_selected(&mut self) {
        let Some(code) = self.selected_code().map(str::to_string) else {
            return;
        };
        self.edit(&code);
    }

    pub fn edit(&mut self, code: &str) {
        if let Some(record) = self.store.find(code) {
            self.form.begin_edit(record);
            self.admin_focus = AdminFocus::Form;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.form.reset();
    }

    pub fn submit_form(&mut self) {
        match self.form.submit() {
            Ok(mutation) => self.request(Request::Mutate(mutation)),
            Err(message) => self.dialog = Some(Dialog::Alert(message)),
        }
    }

    /// Ask for confirmation before deleting the selected row.
    pub fn request_delete(&mut self) {
        if let Some(code) = self.selected_code().map(str::to_string) {
            self.dialog = Some(Dialog::ConfirmDelete { code });
        }
    }

    pub fn answer_confirmation(&mut self, confirmed: bool) {
        if let Some(Dialog::ConfirmDelete { code }) = self.dialog.take() {
            if confirmed {
                self.request(Request::Mutate(Mutation::Delete { code }));
            } else {
                tracing::debug!(%code, "delete declined");
            }
        }
    }

    pub fn dismiss_dialog(&mut self) {
        self.dialog = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeBackend, PASSWORD};
    use crate::form::{Field, FormMode};
    use crate::worker::perform;
    use std::collections::HashMap;

    fn seed() -> Vec<ErrorRecord> {
        vec![
            ErrorRecord::new("42", "Pump failure", "Sensor fault", "Check wiring; restart", "Linux,Windows"),
            ErrorRecord::new("7", "Eingeschlossen", "Hindernis", "Befreien", "P10, P25"),
            ErrorRecord::new("100", "Rad blockiert rechts", "Haar", "Reinigen", "P25"),
        ]
    }

    /// Run queued requests (and their follow-ups) to completion.
    async fn drive(app: &mut App, backend: &FakeBackend) {
        loop {
            let requests = app.take_requests();
            if requests.is_empty() {
                break;
            }
            for request in requests {
                let response = perform(backend, request).await;
                app.handle_response(response);
            }
        }
    }

    async fn loaded(backend: &FakeBackend) -> App {
        let mut app = App::new(None, true);
        app.authenticated = true;
        app.init();
        drive(&mut app, backend).await;
        app
    }

    fn table_codes(app: &App) -> Vec<String> {
        app.table.iter().map(|r| r.code.clone()).collect()
    }

    #[tokio::test]
    async fn test_initial_load_renders_everything_sorted_table() {
        let backend = FakeBackend::with(seed());
        let app = loaded(&backend).await;
        assert_eq!(app.results.len(), 3);
        assert_eq!(table_codes(&app), vec!["7", "42", "100"]);
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_failed_load_shows_inline_error() {
        let backend = FakeBackend::with(seed());
        *backend.fail_list.lock().unwrap() = true;
        let app = loaded(&backend).await;
        assert_eq!(app.results, ResultsView::Failed(view::LOAD_FAILED.to_string()));
        assert!(app.table.is_empty());
    }

    #[tokio::test]
    async fn test_search_and_facet_narrow_results() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;

        app.query.text = "rad".to_string();
        app.apply_filter();
        assert_eq!(app.filtered_indices.len(), 1);

        app.query.text.clear();
        app.cycle_platform(true);
        assert_eq!(app.query.platform.as_deref(), Some("Linux"));
        assert_eq!(app.results.len(), 1);

        app.query.text = "zzz".to_string();
        app.apply_filter();
        assert_eq!(app.results, ResultsView::Empty);
    }

    #[tokio::test]
    async fn test_platform_cycle_wraps_through_all() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;
        assert_eq!(app.store.facets().len(), 4);

        app.cycle_platform(false);
        assert_eq!(app.query.platform.as_deref(), Some("P25"));
        app.cycle_platform(true);
        assert_eq!(app.query.platform, None);
        assert_eq!(app.results.len(), 3);

        for _ in 0..3 {
            app.cycle_platform(true);
        }
        assert_eq!(app.query.platform.as_deref(), Some("P10"));
        assert_eq!(app.results.len(), 1);
    }

    #[tokio::test]
    async fn test_translations_fold_into_search() {
        let backend = FakeBackend::with(seed());
        let t = Translations::from_map(HashMap::from([("Eingeschlossen".to_string(), "Trapped".to_string())]));
        let mut app = App::new(Some(t), true);
        app.init();
        drive(&mut app, &backend).await;

        app.query.text = "trapped".to_string();
        app.apply_filter();
        assert_eq!(app.filtered_indices.len(), 1);
    }

    #[tokio::test]
    async fn test_create_adds_record_and_resets_form() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;

        app.form.set(Field::Code, "99");
        app.form.set(Field::HmiMessage, "Test Fehler");
        app.form.set(Field::Cause, "Test Ursache");
        app.form.set(Field::Action, "Test Aktion");
        app.form.set(Field::Platforms, "P99");
        app.submit_form();
        drive(&mut app, &backend).await;

        assert!(table_codes(&app).contains(&"99".to_string()));
        assert_eq!(app.form.mode(), &FormMode::Create);
        assert_eq!(app.form.value(Field::Code), "");
        assert!(app.dialog.is_none());
        assert_eq!(backend.calls(), vec!["GET", "POST 99", "GET"]);
    }

    #[tokio::test]
    async fn test_edit_then_cancel_leaves_backend_untouched() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;

        app.edit("42");
        assert_eq!(app.form.mode(), &FormMode::Editing { code: "42".to_string() });
        assert_eq!(app.form.value(Field::Cause), "Sensor fault");
        app.form.set(Field::Cause, "changed");
        app.cancel_edit();
        drive(&mut app, &backend).await;

        assert_eq!(app.form.mode(), &FormMode::Create);
        assert_eq!(backend.snapshot(), seed());
        assert!(backend.calls().iter().all(|c| !c.starts_with("PUT")));
    }

    #[tokio::test]
    async fn test_edit_submit_updates_by_original_code() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;

        app.table_selected = 1; // "42" after sorting
        app.edit_selected();
        app.form.set(Field::Action, "Replace pump");
        app.submit_form();
        drive(&mut app, &backend).await;

        let stored = backend.snapshot().into_iter().find(|r| r.code == "42").unwrap();
        assert_eq!(stored.action, "Replace pump");
        assert_eq!(app.store.find("42").unwrap().action, "Replace pump");
        assert_eq!(app.form.mode(), &FormMode::Create);
    }

    #[tokio::test]
    async fn test_failed_submit_alerts_and_keeps_input() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;

        app.form.set(Field::Code, "42");
        app.form.set(Field::HmiMessage, "Duplicate");
        app.submit_form();
        drive(&mut app, &backend).await;

        assert_eq!(
            app.dialog,
            Some(Dialog::Alert("An error occurred: Error code 42 already exists.".to_string()))
        );
        assert_eq!(app.form.value(Field::HmiMessage), "Duplicate");
        assert_eq!(app.form.value(Field::Code), "42");
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;

        app.table_selected = 0; // "7"
        app.request_delete();
        assert_eq!(app.dialog, Some(Dialog::ConfirmDelete { code: "7".to_string() }));
        app.answer_confirmation(false);
        drive(&mut app, &backend).await;
        assert!(app.dialog.is_none());
        assert!(table_codes(&app).contains(&"7".to_string()));
        assert!(backend.calls().iter().all(|c| !c.starts_with("DELETE")));

        app.request_delete();
        app.answer_confirmation(true);
        drive(&mut app, &backend).await;
        assert!(!table_codes(&app).contains(&"7".to_string()));
        assert!(backend.snapshot().iter().all(|r| r.code != "7"));
    }

    #[tokio::test]
    async fn test_failed_delete_alerts_and_keeps_state() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;

        app.dialog = Some(Dialog::ConfirmDelete { code: "555".to_string() });
        app.answer_confirmation(true);
        drive(&mut app, &backend).await;

        assert_eq!(
            app.dialog,
            Some(Dialog::Alert("Failed to delete: Error code 555 not found.".to_string()))
        );
        assert_eq!(app.table.len(), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_mutation_opens_login() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;
        *backend.logged_in.lock().unwrap() = false;

        app.form.set(Field::Code, "99");
        app.submit_form();
        drive(&mut app, &backend).await;
        let overlay = app.login.as_ref().unwrap();
        assert!(overlay.notice().unwrap().starts_with("Session expired"));
        assert_eq!(overlay.failed_attempts(), 0);
        assert!(!app.authenticated);
        assert_eq!(app.form.value(Field::Code), "99");

        app.handle_login_result(PasswordInputResult::Submit(PASSWORD.to_string()));
        drive(&mut app, &backend).await;
        assert!(app.authenticated);
        assert!(app.login.is_none());
        assert_eq!(app.view, View::Admin);
    }

    #[tokio::test]
    async fn test_wrong_password_keeps_overlay_open() {
        let backend = FakeBackend::with(seed());
        let mut app = App::new(None, true);
        app.open_admin();
        assert_eq!(app.view, View::Catalog);
        assert!(app.login.is_some());

        app.handle_login_result(PasswordInputResult::Submit("nope".to_string()));
        drive(&mut app, &backend).await;
        assert_eq!(app.login.as_ref().unwrap().failed_attempts(), 1);
        assert!(!app.authenticated);
    }

    #[tokio::test]
    async fn test_logout_returns_to_catalog() {
        let backend = FakeBackend::with(seed());
        let mut app = loaded(&backend).await;
        app.view = View::Admin;
        app.logout();
        drive(&mut app, &backend).await;
        assert_eq!(app.view, View::Catalog);
        assert!(!app.authenticated);
    }

    #[tokio::test]
    async fn test_pre_login_opens_admin() {
        let backend = FakeBackend::with(seed());
        *backend.logged_in.lock().unwrap() = false;
        let mut app = App::new(None, true);
        app.pre_login(&backend, PASSWORD).await.unwrap();
        assert!(app.authenticated);
        assert_eq!(app.view, View::Admin);

        let mut app = App::new(None, true);
        assert!(matches!(
            app.pre_login(&backend, "wrong").await,
            Err(ApiError::LoginRejected)
        ));
        assert!(!app.authenticated);
    }

    #[tokio::test]
    async fn test_pre_login_skipped_for_read_only_source() {
        let backend = FakeBackend::with(seed());
        let mut app = App::new(None, false);
        app.pre_login(&backend, PASSWORD).await.unwrap();
        assert!(!app.authenticated);
        assert_eq!(app.view, View::Catalog);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_login_prompt_names_target() {
        let mut app = App::new(None, true);
        app.target = "http://127.0.0.1:5001".to_string();
        app.open_admin();
        assert_eq!(app.login.as_ref().unwrap().target(), Some("http://127.0.0.1:5001"));
    }

    #[test]
    fn test_read_only_source_has_no_admin() {
        let mut app = App::new(None, false);
        app.open_admin();
        assert_eq!(app.view, View::Catalog);
        assert!(app.login.is_none());
    }

    #[test]
    fn test_list_navigation_is_bounded() {
        let mut app = App::new(None, false);
        app.store.replace(seed());
        app.refresh_views();
        app.update_page_size(LIST_OVERHEAD + CARD_HEIGHT * 2);
        assert_eq!(app.page_size, 2);

        app.list_page_down();
        assert_eq!(app.list_selected, 2);
        app.list_next();
        assert_eq!(app.list_selected, 2);
        app.list_page_up();
        assert_eq!(app.list_selected, 0);
        app.list_prev();
        assert_eq!(app.list_selected, 0);
    }
}
