use kvitok_client::ClientError;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        "The command did not complete.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
    ];
    if let Some(path) = error
        .data
        .as_ref()
        .and_then(|data| data.get("path"))
        .and_then(|path| path.as_str())
    {
        lines.push(format!("  Field:    {path}"));
    }
    if let Some(committed) = error
        .data
        .as_ref()
        .and_then(|data| data.get("committed_reports"))
        .and_then(|reports| reports.as_array())
    {
        lines.push(format!(
            "  Stored:   {} earlier receipt(s) were saved before the failure.",
            committed.len()
        ));
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}
