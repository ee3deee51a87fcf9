use chrono::NaiveDate;

use crate::core::task::{CreateTask, Priority, Task, TaskStatus, UpdateTask, due_date_label};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 100;

/// An edit to one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Title(String),
    Description(String),
    Status(TaskStatus),
    Priority(Priority),
    /// Raw `YYYY-MM-DD` text from the date input.
    DueDate(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub title: Option<String>,
    pub due_date: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.due_date.is_none()
    }
}

/// What a valid form turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Create(CreateTask),
    Update { id: String, fields: UpdateTask },
}

pub fn validate_title(value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if value.trim().is_empty() {
        Err("Task title is required".into())
    } else if len < TITLE_MIN_CHARS {
        Err(format!("Title must be at least {} characters", TITLE_MIN_CHARS))
    } else if len > TITLE_MAX_CHARS {
        Err(format!("Title must be less than {} characters", TITLE_MAX_CHARS))
    } else {
        Ok(())
    }
}

pub fn validate_due_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Due date is required".into());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "Due date must be a valid date".into())
}

/// Create/edit form for a single task.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: String,
    errors: FormErrors,
    editing: Option<String>,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Id of the task being edited, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() { "Update Task" } else { "Add Task" }
    }

    /// Switch to edit mode with the task's current values.
    pub fn load(&mut self, task: &Task) {
        let fields = task.to_create();
        self.title = fields.title;
        self.description = fields.description.unwrap_or_default();
        self.status = fields.status;
        self.priority = fields.priority;
        self.due_date = due_date_label(fields.due_date);
        self.errors = FormErrors::default();
        self.editing = Some(task.id.clone());
    }

    /// Back to an empty create form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set(&mut self, field: FormField) {
        match field {
            FormField::Title(v) => self.title = v,
            FormField::Description(v) => self.description = v,
            FormField::Status(v) => self.status = v,
            FormField::Priority(v) => self.priority = v,
            FormField::DueDate(v) => self.due_date = v,
        }
    }

    /// Field left focus: re-check just that field.
    pub fn blur(&mut self, field: &FormField) {
        match field {
            FormField::Title(_) => self.errors.title = validate_title(&self.title).err(),
            FormField::DueDate(_) => {
                self.errors.due_date = validate_due_date(&self.due_date).err();
            }
            _ => {}
        }
    }

    /// Check every field. Both errors are reported together.
    pub fn validate(&mut self) -> bool {
        self.errors.title = validate_title(&self.title).err();
        self.errors.due_date = validate_due_date(&self.due_date).err();
        self.errors.is_empty()
    }

    /// Validate and build the request. Nothing here touches the network.
    pub fn submit(&mut self) -> Result<FormSubmission, FormErrors> {
        if !self.validate() {
            return Err(self.errors.clone());
        }
        let due_date = validate_due_date(&self.due_date).map_err(|e| FormErrors {
            title: None,
            due_date: Some(e),
        })?;

        let payload = CreateTask {
            title: self.title.clone(),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
            status: self.status,
            priority: self.priority,
            due_date,
        };

        Ok(match &self.editing {
            Some(id) => {
                let mut fields = UpdateTask::from(payload);
                // Always send the description so it can be cleared.
                fields.description = Some(self.description.clone());
                FormSubmission::Update {
                    id: id.clone(),
                    fields,
                }
            }
            None => FormSubmission::Create(payload),
        })
    }
}
