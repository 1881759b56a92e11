use colored::{ColoredString, Colorize};
use zonekit::{Action, Operation};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print one scheduled action
pub fn action(action: &Action) {
    println!("  {} {}", marker(&action.operation), action);
}

fn marker(operation: &Operation) -> ColoredString {
    match operation {
        Operation::Add { .. } | Operation::Enable { .. } => "+".green(),
        Operation::Remove { .. } | Operation::Disable { .. } => "-".red(),
        Operation::SetTarget { .. } => "~".yellow(),
    }
}

/// Render a list for a key-value line
pub fn list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonekit::{RuleEntry, ScalarToggle, ZoneTarget};

    #[test]
    fn test_marker_per_operation() {
        colored::control::set_override(false);
        let add = Operation::Add {
            entry: RuleEntry::Service("http".into()),
            timeout: None,
        };
        let disable = Operation::Disable {
            toggle: ScalarToggle::Masquerade,
        };
        let target = Operation::SetTarget {
            from: ZoneTarget::Default,
            to: ZoneTarget::Drop,
        };
        assert_eq!(marker(&add).to_string(), "+");
        assert_eq!(marker(&disable).to_string(), "-");
        assert_eq!(marker(&target).to_string(), "~");
    }

    #[test]
    fn test_list() {
        assert_eq!(list(&[]), "(none)");
        assert_eq!(list(&["ssh".into(), "http".into()]), "ssh, http");
    }
}
