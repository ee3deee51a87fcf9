use crate::core::task::{Task, due_date_label};

pub const COLUMNS: [&str; 6] = [
    "Title",
    "Description",
    "Status",
    "Priority",
    "Due Date",
    "Actions",
];

/// Row actions, keyed by task id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Edit(String),
    Delete(String),
}

/// Display strings for one task in the list table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: &'static str,
    pub priority: &'static str,
    pub due_date: String,
}

impl TaskRow {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status.label(),
            priority: task.priority.label(),
            due_date: due_date_label(task.due_date),
        }
    }

    pub fn edit(&self) -> RowAction {
        RowAction::Edit(self.id.clone())
    }

    pub fn delete(&self) -> RowAction {
        RowAction::Delete(self.id.clone())
    }

    pub fn cells(&self) -> [&str; 5] {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.status,
            self.priority,
            self.due_date.as_str(),
        ]
    }
}

pub fn task_rows(tasks: &[Task]) -> Vec<TaskRow> {
    tasks.iter().map(TaskRow::from_task).collect()
}

/// Plain-text table, columns padded to the widest cell.
pub fn render_table(rows: &[TaskRow]) -> String {
    let headers = &COLUMNS[..5];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = line(headers);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&line(&row.cells()[..]));
    }
    out
}
