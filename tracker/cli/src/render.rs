//! Plain-text rendering of tasks and settings

use std::fmt::Write;

use tracker_core::{Task, ThemePreference};

/// One line per task: checkbox, priority, title, description, due date, id
pub fn task_line(task: &Task) -> String {
    let mark = if task.is_completed { "x" } else { " " };
    let mut line = format!("[{mark}] {:<6} {}", task.priority.label(), task.title);
    let description = task.description_or_empty().trim();
    if !description.is_empty() {
        let _ = write!(line, ": {description}");
    }
    if let Some(due) = &task.due_date {
        let _ = write!(line, "  (due {due})");
    }
    let _ = write!(line, "  #{}", task.id);
    line
}

/// Whole list, or a placeholder when empty
pub fn task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks\n".to_string();
    }
    tasks.iter().fold(String::new(), |mut out, task| {
        out.push_str(&task_line(task));
        out.push('\n');
        out
    })
}

/// Theme setting as shown by `tracker theme`
pub fn theme_line(pref: &ThemePreference) -> String {
    if pref.use_system_theme {
        let remembered = if pref.dark_mode { "dark" } else { "light" };
        format!("system (explicit choice: {remembered})")
    } else if pref.dark_mode {
        "dark".to_string()
    } else {
        "light".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracker_core::TaskPriority;

    fn task(title: &str, done: bool, due: Option<&str>) -> Task {
        Task {
            id: "t1".to_string(),
            title: title.to_string(),
            is_completed: done,
            priority: TaskPriority::High,
            due_date: due.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_task_line() {
        let line = task_line(&task("Buy milk", false, Some("2025-06-01")));
        assert!(line.starts_with("[ ] "));
        assert!(line.contains("Buy milk"));
        assert!(line.contains("(due 2025-06-01)"));
        assert!(line.ends_with("#t1"));

        assert!(task_line(&task("Done", true, None)).starts_with("[x] "));
    }

    #[test]
    fn test_task_line_shows_description() {
        let mut with_notes = task("Buy milk", false, None);
        with_notes.description = Some("2 litres, oat".to_string());
        assert!(task_line(&with_notes).contains("Buy milk: 2 litres, oat"));

        with_notes.description = Some("   ".to_string());
        assert!(!task_line(&with_notes).contains(':'));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(task_table(&[]), "No tasks\n");
        assert_eq!(task_table(&[task("a", false, None)]).lines().count(), 1);
    }

    #[test]
    fn test_theme_line() {
        assert_eq!(theme_line(&ThemePreference::default()), "system (explicit choice: light)");
        assert_eq!(
            theme_line(&ThemePreference {
                dark_mode: true,
                use_system_theme: false
            }),
            "dark"
        );
    }
}
