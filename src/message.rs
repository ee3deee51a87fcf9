use crate::components::task_row::RowAction;
use crate::core::pagination::IntersectionEntry;
use crate::pages::task_form::FormField;

#[derive(Debug, Clone)]
pub enum Message {
    // Loading
    Load,
    Retry,
    Sentinel(IntersectionEntry),

    // Row actions
    EditTask(String),
    DeleteTask(String),

    // Form
    Form(FormField),
    FormBlur(FormField),
    SubmitForm,
    ResetForm,

    // Toast
    DismissToast,
}

impl From<RowAction> for Message {
    fn from(action: RowAction) -> Self {
        match action {
            RowAction::Edit(id) => Message::EditTask(id),
            RowAction::Delete(id) => Message::DeleteTask(id),
        }
    }
}
