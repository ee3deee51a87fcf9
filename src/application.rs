use std::time::Duration;

use crate::components::task_row::render_table;
use crate::config::ClientConfig;
use crate::message::Message;
use crate::pages::task_form::{FormSubmission, TaskForm};
use crate::pages::task_list::TaskListPage;
use crate::query::{PageReset, TaskQueries};
use crate::remote::{TaskApiClient, TaskApiError};

/// The task manager view: list, form and toast over one set of queries.
pub struct TaskManager {
    queries: TaskQueries,
    list: TaskListPage,
    form: TaskForm,
}

impl TaskManager {
    pub fn new(config: &ClientConfig) -> Result<Self, TaskApiError> {
        let client = TaskApiClient::new(&config.api_url)?;
        Ok(Self::with_queries(config, TaskQueries::new(client)))
    }

    pub fn with_queries(config: &ClientConfig, queries: TaskQueries) -> Self {
        Self {
            queries,
            list: TaskListPage::new(
                config.sentinel_threshold,
                Duration::from_millis(config.toast_timeout_ms),
            ),
            form: TaskForm::new(),
        }
    }

    pub fn list(&self) -> &TaskListPage {
        &self.list
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn queries(&self) -> &TaskQueries {
        &self.queries
    }

    pub async fn update(&mut self, message: Message) {
        match message {
            Message::Load => {
                let page = self.list.begin_load();
                self.load_page(page).await;
            }

            Message::Retry => {
                self.queries.invalidate(self.list.page());
                let page = self.list.begin_load();
                self.load_page(page).await;
            }

            Message::Sentinel(entry) => {
                if let Some(next) = self.list.on_sentinel(entry) {
                    self.load_page(next).await;
                }
            }

            Message::EditTask(id) => match self.list.find(&id).cloned() {
                Some(task) => self.form.load(&task),
                None => log::warn!("Edit requested for unknown task {}", id),
            },

            Message::DeleteTask(id) => {
                match self.queries.remove(&id, self.list.page()).await {
                    Ok(PageReset) => {
                        if self.form.editing() == Some(id.as_str()) {
                            self.form.reset();
                        }
                        self.list.toast_slot().success("Task deleted successfully");
                        self.list.reset_to_first_page();
                        let page = self.list.begin_load();
                        self.load_page(page).await;
                    }
                    Err(e) => {
                        log::warn!("Delete of {} failed: {}", id, e);
                        self.list.toast_slot().failure("Failed to delete task");
                    }
                }
            }

            Message::Form(field) => self.form.set(field),

            Message::FormBlur(field) => self.form.blur(&field),

            Message::SubmitForm => self.submit().await,

            Message::ResetForm => self.form.reset(),

            Message::DismissToast => self.list.toast_slot().dismiss(),
        }
    }

    async fn submit(&mut self) {
        let submission = match self.form.submit() {
            Ok(s) => s,
            Err(errors) => {
                log::debug!("Form rejected: {:?}", errors);
                return;
            }
        };
        let page = self.list.page();

        match submission {
            FormSubmission::Create(payload) => match self.queries.create(&payload, page).await {
                Ok(_) => {
                    self.form.reset();
                    self.list.toast_slot().success("Task created successfully");
                    self.refresh().await;
                }
                Err(e) => {
                    log::warn!("Create failed: {}", e);
                    self.list.toast_slot().failure("Failed to create task");
                }
            },
            FormSubmission::Update { id, fields } => {
                match self.queries.update(&id, &fields, page).await {
                    Ok(task) => {
                        self.list.on_task_updated(task);
                        self.form.reset();
                        self.list.toast_slot().success("Task updated successfully");
                        self.refresh().await;
                    }
                    Err(e) => {
                        log::warn!("Update of {} failed: {}", id, e);
                        self.list.toast_slot().failure("Failed to update task");
                    }
                }
            }
        }
    }

    /// Re-read the current page after a write invalidated it.
    async fn refresh(&mut self) {
        let page = self.list.begin_load();
        self.load_page(page).await;
    }

    async fn load_page(&mut self, page: u32) {
        let result = self.queries.query(page).await;
        let revision = self.list.revision();
        if !self.list.on_page_loaded(page, &result) {
            return;
        }
        if self.list.revision() != revision {
            log::info!(
                "Page {} loaded, {} tasks listed",
                page,
                self.list.tasks().len()
            );
        } else {
            log::debug!("Page {} loaded, list unchanged", page);
        }
    }

    /// Plain-text rendering of the current view.
    pub fn view(&self) -> String {
        let mut out = String::new();
        if let Some(toast) = self.list.toast() {
            let marker = if toast.is_success() { "ok" } else { "error" };
            out.push_str(&format!("[{}] {}\n\n", marker, toast.message));
        }
        if self.list.is_loading() {
            out.push_str("Loading...\n");
            return out;
        }
        match self.list.load_error() {
            Some(error) => out.push_str(error),
            None => out.push_str(&render_table(&self.list.rows())),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pagination::IntersectionEntry;
    use crate::core::task::Priority;
    use crate::pages::task_form::FormField;
    use crate::pages::task_list::LIST_END;
    use crate::remote::client::tests::PAGE_ONE;
    use mockito::{Matcher, Server, ServerGuard};

    const PAGE_TWO: &str = r#"[
        {"id":"2","title":"Task 2","description":"Description 2","status":"IN_PROGRESS","priority":"MEDIUM",
         "dueDate":"2025-04-20T00:00:00.000Z","createdAt":"2025-03-05T00:00:00.000Z","updatedAt":"2025-03-07T00:00:00.000Z"},
        {"id":"3","title":"Task 3","status":"COMPLETED","priority":"LOW",
         "dueDate":"2025-05-01T00:00:00.000Z","createdAt":"2025-03-10T00:00:00.000Z","updatedAt":"2025-03-10T00:00:00.000Z"}
    ]"#;

    const PAGE_ONE_AFTER_DELETE: &str = r#"[
        {"id":"2","title":"Task 2","description":"Description 2","status":"IN_PROGRESS","priority":"MEDIUM",
         "dueDate":"2025-04-20T00:00:00.000Z","createdAt":"2025-03-05T00:00:00.000Z","updatedAt":"2025-03-07T00:00:00.000Z"}
    ]"#;

    fn manager(server: &ServerGuard) -> TaskManager {
        let config = ClientConfig {
            api_url: format!("{}/tasks", server.url()),
            ..ClientConfig::default()
        };
        TaskManager::new(&config).unwrap()
    }

    fn page(n: u32) -> Matcher {
        Matcher::UrlEncoded("page".into(), n.to_string())
    }

    fn ids(app: &TaskManager) -> Vec<&str> {
        app.list().tasks().iter().map(|t| t.id.as_str()).collect()
    }

    #[tokio::test]
    async fn scrolling_merges_pages_without_duplicates() {
        let mut server = Server::new_async().await;
        let _one = server
            .mock("GET", "/tasks")
            .match_query(page(1))
            .with_body(PAGE_ONE)
            .create_async()
            .await;
        let _two = server
            .mock("GET", "/tasks")
            .match_query(page(2))
            .with_body(PAGE_TWO)
            .create_async()
            .await;
        let _three = server
            .mock("GET", "/tasks")
            .match_query(page(3))
            .with_body("[]")
            .create_async()
            .await;

        let mut app = manager(&server);
        app.update(Message::Load).await;
        assert_eq!(ids(&app), ["1", "2"]);

        app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 1.0))).await;
        assert_eq!(ids(&app), ["1", "2", "3"]);

        app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 0.0))).await;
        app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 1.0))).await;
        assert_eq!(app.list().page(), 3);
        assert!(!app.list().has_next_page());
        assert_eq!(ids(&app), ["1", "2", "3"]);

        // Exhausted: further scrolling does nothing.
        app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 0.0))).await;
        app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 1.0))).await;
        assert_eq!(app.list().page(), 3);
    }

    #[tokio::test]
    async fn delete_resets_to_a_fresh_first_page() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/tasks")
            .match_query(page(1))
            .with_body(PAGE_ONE)
            .expect(1)
            .create_async()
            .await;
        let _two = server
            .mock("GET", "/tasks")
            .match_query(page(2))
            .with_body(PAGE_TWO)
            .create_async()
            .await;
        let _delete = server.mock("DELETE", "/tasks/1").with_status(204).create_async().await;

        let mut app = manager(&server);
        app.update(Message::Load).await;
        app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 1.0))).await;
        assert_eq!(app.list().page(), 2);
        first.assert_async().await;
        first.remove_async().await;

        let refreshed = server
            .mock("GET", "/tasks")
            .match_query(page(1))
            .with_body(PAGE_ONE_AFTER_DELETE)
            .expect(1)
            .create_async()
            .await;

        app.update(Message::DeleteTask("1".into())).await;
        refreshed.assert_async().await;
        assert_eq!(app.list().page(), 1);
        assert_eq!(ids(&app), ["2"]);
        assert_eq!(
            app.list().toast().map(|t| t.message),
            Some("Task deleted successfully".to_string())
        );
    }

    #[tokio::test]
    async fn failed_create_shows_toast_and_adds_nothing() {
        let mut server = Server::new_async().await;
        let _one = server
            .mock("GET", "/tasks")
            .match_query(page(1))
            .with_body(PAGE_ONE)
            .create_async()
            .await;
        let _post = server
            .mock("POST", "/tasks")
            .with_status(400)
            .with_body("Invalid task data")
            .create_async()
            .await;

        let mut app = manager(&server);
        app.update(Message::Load).await;
        app.update(Message::Form(FormField::Title("New Task".into()))).await;
        app.update(Message::Form(FormField::Priority(Priority::Medium))).await;
        app.update(Message::Form(FormField::DueDate("2025-05-01".into()))).await;
        app.update(Message::SubmitForm).await;

        let toast = app.list().toast().unwrap();
        assert!(!toast.is_success());
        assert_eq!(toast.message, "Failed to create task");
        assert_eq!(ids(&app), ["1", "2"]);
        // The form keeps its input for another try.
        assert_eq!(app.form().title, "New Task");
    }

    #[tokio::test]
    async fn invalid_form_never_hits_the_network() {
        let mut server = Server::new_async().await;
        let post = server.mock("POST", "/tasks").expect(0).create_async().await;

        let mut app = manager(&server);
        app.update(Message::Form(FormField::Title(" ".into()))).await;
        app.update(Message::SubmitForm).await;
        post.assert_async().await;
        assert!(app.form().errors().title.is_some());
        assert!(app.form().errors().due_date.is_some());
        assert!(app.list().toast().is_none());
    }

    #[tokio::test]
    async fn edit_and_update_refreshes_row() {
        let mut server = Server::new_async().await;
        let one = server
            .mock("GET", "/tasks")
            .match_query(page(1))
            .with_body(PAGE_ONE)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", "/tasks/2")
            .match_body(Matcher::PartialJson(serde_json::json!({"title": "Task 2 renamed"})))
            .with_body(
                r#"{"id":"2","title":"Task 2 renamed","description":"Description 2","status":"IN_PROGRESS",
                    "priority":"MEDIUM","dueDate":"2025-04-20T00:00:00.000Z",
                    "createdAt":"2025-03-05T00:00:00.000Z","updatedAt":"2025-03-12T00:00:00.000Z"}"#,
            )
            .create_async()
            .await;

        let mut app = manager(&server);
        app.update(Message::Load).await;
        app.update(Message::EditTask("2".into())).await;
        assert_eq!(app.form().submit_label(), "Update Task");
        app.update(Message::Form(FormField::Title("Task 2 renamed".into()))).await;

        // The server now serves the renamed task on page 1.
        one.remove_async().await;
        let _renamed = server
            .mock("GET", "/tasks")
            .match_query(page(1))
            .with_body(PAGE_ONE.replace("\"Task 2\"", "\"Task 2 renamed\""))
            .create_async()
            .await;
        app.update(Message::SubmitForm).await;

        assert_eq!(app.list().find("2").unwrap().title, "Task 2 renamed");
        assert_eq!(ids(&app), ["1", "2"]);
        assert!(!app.form().is_editing());
        assert_eq!(
            app.list().toast().map(|t| t.message),
            Some("Task updated successfully".to_string())
        );
    }

    #[tokio::test]
    async fn read_failure_renders_inline_error() {
        let mut server = Server::new_async().await;
        let _one = server
            .mock("GET", "/tasks")
            .match_query(page(1))
            .with_status(500)
            .with_body("Server error")
            .create_async()
            .await;

        let mut app = manager(&server);
        app.update(Message::Load).await;
        assert_eq!(
            app.view(),
            "Error loading tasks: Fetch Task failed: 500 Internal Server Error"
        );
    }
}
