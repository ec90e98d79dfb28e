//! Formatting helpers for the To Do tools
//!
//! Turns Graph payloads into the plain-text summaries returned to the client.

use super::model::{ChecklistItem, Collection, TaskList, TodoTask};

/// Format task lists as `- {name} (id: {id})` lines
pub fn format_task_lists(lists: &Collection<TaskList>) -> String {
    if lists.value.is_empty() {
        return "No task lists found.".to_string();
    }
    lists
        .value
        .iter()
        .map(|list| format!("- {} (id: {})", list.display_name, list.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format tasks one per line
///
/// # Arguments
/// * `tasks` - Collection returned by the tasks endpoint
/// * `include_completed` - Keep tasks whose status is `completed`
///
/// # Returns
/// `- {title} [{status}, due: {date}, importance: {importance}] (id: {id})` lines,
/// where the due and importance parts only appear when relevant
pub fn format_tasks(tasks: &Collection<TodoTask>, include_completed: bool) -> String {
    let visible: Vec<&TodoTask> = tasks
        .value
        .iter()
        .filter(|task| include_completed || !task.is_completed())
        .collect();

    if visible.is_empty() {
        return "No tasks found.".to_string();
    }

    visible
        .into_iter()
        .map(|task| {
            let due = task
                .due_date_time
                .as_ref()
                .map(|d| format!(", due: {}", d.date()))
                .unwrap_or_default();
            let importance = if task.importance != "normal" {
                format!(", importance: {}", task.importance)
            } else {
                String::new()
            };
            format!(
                "- {} [{}{}{}] (id: {})",
                task.title, task.status, due, importance, task.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single task with its checklist as a multi-line block
pub fn format_task_detail(task: &TodoTask, checklist: &[ChecklistItem]) -> String {
    let mut lines = vec![
        format!("# {}", task.title),
        format!("Status: {}", task.status),
        format!("Importance: {}", task.importance),
    ];

    if let Some(ref due) = task.due_date_time {
        lines.push(format!("Due: {}", due.date()));
    }
    lines.push(format!(
        "Reminder: {}",
        if task.is_reminder_on { "on" } else { "off" }
    ));
    if !task.categories.is_empty() {
        lines.push(format!("Categories: {}", task.categories.join(", ")));
    }
    lines.push(format!("Created: {}", task.created_date_time));
    lines.push(format!("Modified: {}", task.last_modified_date_time));

    if let Some(body) = task.body_text() {
        lines.push(String::new());
        lines.push(body.to_string());
    }

    if !checklist.is_empty() {
        lines.push(String::new());
        lines.push("Checklist:".to_string());
        for item in checklist {
            let mark = if item.is_checked { "x" } else { " " };
            lines.push(format!("  [{}] {}", mark, item.display_name));
        }
    }

    lines.join("\n")
}
