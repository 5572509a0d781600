pub mod console;
pub mod email;
pub mod manager;
pub mod notifier;

pub use console::ConsoleNotifier;
pub use email::{EmailNotifier, MailMessage, MailTransport, SmtpConfig, SmtpMailTransport};
pub use manager::{FanOutReport, NotificationManager};
pub use notifier::{Notifier, NotifyError};
