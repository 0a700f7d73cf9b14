use colored::Colorize;
use notekeeper_application::AppView;
use notekeeper_core::SessionState;

/// Renders one screen of the app as printable lines.
pub fn render_view(view: &AppView) -> Vec<String> {
    let mut lines = Vec::new();

    match &view.session {
        SessionState::Authenticated { session } => {
            lines.push("Welcome".bright_magenta().bold().to_string());
            lines.push(session.email.bright_white().to_string());
            lines.push(String::new());

            if view.notes.is_empty() {
                lines.push("No notes yet. Add one with /add <text>".bright_black().to_string());
            }
            for (index, note) in view.notes.iter().enumerate() {
                let created = note
                    .created_at
                    .map(|t| format!(" ({})", t.format("%Y-%m-%d %H:%M")))
                    .unwrap_or_default();
                lines.push(format!(
                    "{} {}{}",
                    format!("{:>3}.", index + 1).bright_black(),
                    note.text,
                    created.bright_black()
                ));
            }
        }
        SessionState::Transitioning => {
            lines.push("Working...".yellow().to_string());
        }
        SessionState::Unauthenticated => {
            let form = &view.form;
            lines.push(form.mode.label().bright_magenta().bold().to_string());
            let email = if form.email.is_empty() {
                "(not set)".bright_black().to_string()
            } else {
                form.email.clone()
            };
            lines.push(format!("Email:    {email}"));
            let password = if form.password.is_empty() {
                "(not set)".bright_black().to_string()
            } else {
                "*".repeat(form.password.chars().count())
            };
            lines.push(format!("Password: {password}"));
            lines.push(form.mode.toggle_hint().blue().to_string());
        }
    }

    if let Some(pending) = &view.pending_error {
        lines.push(String::new());
        lines.push(
            format!("{} failed: {}", pending.action, pending.message())
                .red()
                .to_string(),
        );
        lines.push("(/dismiss to clear)".bright_black().to_string());
    }

    lines
}
