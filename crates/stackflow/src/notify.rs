use colored::Colorize;
use stackflow_cloud::Notifier;

/// Prints progress lines to the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("  {} {}", "•".blue(), message);
    }
}
