use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};

use super::{Operation, TaskApiError};
use crate::core::task::{CreateTask, Task, UpdateTask};

pub const DEFAULT_API_URL: &str = "http://localhost:3001/tasks";

/// Client for the remote task collection.
#[derive(Debug, Clone)]
pub struct TaskApiClient {
    base_url: String,
    http: Client,
}

impl TaskApiClient {
    pub fn new(base_url: &str) -> Result<Self, TaskApiError> {
        let http = Client::builder()
            .build()
            .map_err(|e| TaskApiError::Client(Arc::new(e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// GET one page of tasks. Pages start at 1; an empty page means there is
    /// nothing further.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<Task>, TaskApiError> {
        let op = Operation::Fetch;
        let url = format!("{}?page={}", self.base_url, page);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TaskApiError::transport(op, &url, e))?;

        let resp = check(resp, op).await?;
        let tasks: Vec<Task> = resp
            .json()
            .await
            .map_err(|e| TaskApiError::transport(op, &url, e))?;
        log::debug!("Fetched page {}: {} tasks", page, tasks.len());
        Ok(tasks)
    }

    /// POST a new task; the server fills in id and timestamps.
    pub async fn create(&self, task: &CreateTask) -> Result<Task, TaskApiError> {
        let op = Operation::Add;
        let url = self.base_url.clone();
        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(task)
            .send()
            .await
            .map_err(|e| TaskApiError::transport(op, &url, e))?;

        let resp = check(resp, op).await?;
        let created: Task = resp
            .json()
            .await
            .map_err(|e| TaskApiError::transport(op, &url, e))?;
        log::info!("Created task {}: {}", created.id, created.title);
        Ok(created)
    }

    /// PUT only the fields present in `fields`.
    pub async fn update(&self, id: &str, fields: &UpdateTask) -> Result<Task, TaskApiError> {
        let op = Operation::Update;
        let url = self.task_url(id);
        let resp = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(fields)
            .send()
            .await
            .map_err(|e| TaskApiError::transport(op, &url, e))?;

        let resp = check(resp, op).await?;
        let updated: Task = resp
            .json()
            .await
            .map_err(|e| TaskApiError::transport(op, &url, e))?;
        log::info!("Updated task {}", updated.id);
        Ok(updated)
    }

    /// DELETE a task. Any success status counts; the body is not read.
    pub async fn remove(&self, id: &str) -> Result<(), TaskApiError> {
        let op = Operation::Delete;
        let url = self.task_url(id);
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| TaskApiError::transport(op, &url, e))?;

        check(resp, op).await?;
        log::info!("Deleted task {}", id);
        Ok(())
    }
}

/// Pass success responses through. Otherwise drain the body, log one
/// diagnostic record and turn the response into `RequestFailed`.
async fn check(resp: Response, op: Operation) -> Result<Response, TaskApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    let status_text = status.canonical_reason().unwrap_or_default().to_string();
    let body = resp.text().await.unwrap_or_default();

    log::error!(
        "{} failed: url={} method={} status={} status_text={:?} response_body={:?} timestamp={}",
        op,
        url,
        op.method(),
        status.as_u16(),
        status_text,
        body,
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    );

    Err(TaskApiError::RequestFailed {
        operation: op,
        status: status.as_u16(),
        status_text,
        url,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::task::{Priority, TaskStatus};
    use chrono::NaiveDate;
    use mockito::{Matcher, Server};
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    /// Records log lines per thread so parallel tests don't see each other.
    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
        }
        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger;
    static INSTALL: Once = Once::new();

    pub(crate) fn capture_logs() {
        INSTALL.call_once(|| {
            let _ = log::set_logger(&CAPTURE);
            log::set_max_level(log::LevelFilter::Trace);
        });
        CAPTURED.with(|c| c.borrow_mut().clear());
    }

    pub(crate) fn captured_errors() -> Vec<String> {
        CAPTURED.with(|c| {
            c.borrow()
                .iter()
                .filter(|(level, _)| *level == log::Level::Error)
                .map(|(_, line)| line.clone())
                .collect()
        })
    }

    pub(crate) const PAGE_ONE: &str = r#"[
        {"id":"1","title":"Task 1","description":"Description 1","status":"TODO","priority":"HIGH",
         "dueDate":"2025-04-15T00:00:00.000Z","createdAt":"2025-03-01T00:00:00.000Z","updatedAt":"2025-03-01T00:00:00.000Z"},
        {"id":"2","title":"Task 2","description":"Description 2","status":"IN_PROGRESS","priority":"MEDIUM",
         "dueDate":"2025-04-20T00:00:00.000Z","createdAt":"2025-03-05T00:00:00.000Z","updatedAt":"2025-03-07T00:00:00.000Z"}
    ]"#;

    fn new_task() -> CreateTask {
        CreateTask {
            title: "New Task".into(),
            description: Some("New Description".into()),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn fetch_page_sends_page_query() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/tasks")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PAGE_ONE)
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        let tasks = client.fetch_page(1).await.unwrap();
        m.assert_async().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "1");
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn fetch_page_failure_logs_once() {
        capture_logs();
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(500)
            .with_body("Server error")
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        let err = client.fetch_page(1).await.unwrap_err();
        assert_eq!(err.to_string(), "Fetch Task failed: 500 Internal Server Error");
        match &err {
            TaskApiError::RequestFailed { url, .. } => assert!(url.ends_with("/tasks?page=1")),
            other => panic!("unexpected error: {:?}", other),
        }

        let errors = captured_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("method=GET"));
        assert!(errors[0].contains("status=500"));
        assert!(errors[0].contains("Server error"));
        assert!(errors[0].contains("timestamp="));
    }

    #[tokio::test]
    async fn create_posts_json_body() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/tasks")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "title": "New Task",
                "description": "New Description",
                "status": "TODO",
                "priority": "MEDIUM",
                "dueDate": "2025-05-01T00:00:00.000Z"
            })))
            .with_status(201)
            .with_body(
                r#"{"id":"3","title":"New Task","description":"New Description","status":"TODO",
                    "priority":"MEDIUM","dueDate":"2025-05-01T00:00:00.000Z",
                    "createdAt":"2025-03-10T00:00:00.000Z","updatedAt":"2025-03-10T00:00:00.000Z"}"#,
            )
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        let created = client.create(&new_task()).await.unwrap();
        m.assert_async().await;
        assert_eq!(created.id, "3");
        assert_eq!(created.to_create(), new_task());
    }

    #[tokio::test]
    async fn create_failure_message() {
        capture_logs();
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/tasks")
            .with_status(400)
            .with_body("Invalid task data")
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        let err = client.create(&new_task()).await.unwrap_err();
        assert_eq!(err.to_string(), "Add Task failed: 400 Bad Request");
        assert_eq!(captured_errors().len(), 1);
    }

    #[tokio::test]
    async fn update_sends_only_given_fields() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("PUT", "/tasks/1")
            .match_body(Matcher::Json(serde_json::json!({
                "title": "Updated Task",
                "status": "COMPLETED",
                "priority": "LOW"
            })))
            .with_status(200)
            .with_body(
                r#"{"id":"1","title":"Updated Task","description":"Original Description","status":"COMPLETED",
                    "priority":"LOW","dueDate":"2025-04-15T00:00:00.000Z",
                    "createdAt":"2025-03-01T00:00:00.000Z","updatedAt":"2025-03-11T00:00:00.000Z"}"#,
            )
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks/", server.url())).unwrap();
        let fields = UpdateTask {
            title: Some("Updated Task".into()),
            status: Some(TaskStatus::Completed),
            priority: Some(Priority::Low),
            ..Default::default()
        };
        let updated = client.update("1", &fields).await.unwrap();
        m.assert_async().await;
        assert_eq!(updated.title, "Updated Task");
        assert_eq!(updated.description.as_deref(), Some("Original Description"));
    }

    #[tokio::test]
    async fn update_failure_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("PUT", "/tasks/1")
            .with_status(404)
            .with_body("Task not found")
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        let fields = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let err = client.update("1", &fields).await.unwrap_err();
        assert_eq!(err.to_string(), "Update Task failed: 404 Not Found");
    }

    #[tokio::test]
    async fn remove_accepts_empty_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", "/tasks/1")
            .with_status(204)
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        client.remove("1").await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn remove_failure_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/1")
            .with_status(404)
            .with_body("Task not found")
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        let err = client.remove("1").await.unwrap_err();
        assert_eq!(err.to_string(), "Delete Task failed: 404 Not Found");
    }

    #[tokio::test]
    async fn malformed_body_is_a_transport_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = TaskApiClient::new(&format!("{}/tasks", server.url())).unwrap();
        let err = client.fetch_page(2).await.unwrap_err();
        assert!(matches!(err, TaskApiError::Transport { operation: Operation::Fetch, .. }));
        assert!(err.to_string().starts_with("Fetch Task failed:"));
    }
}
