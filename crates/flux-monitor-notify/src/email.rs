use async_trait::async_trait;
use flux_monitor_types::Alarm;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::notifier::{Notifier, NotifyError};

/// SMTP 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// 待发送的邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// 邮件投递接口
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &MailMessage) -> Result<(), NotifyError>;
}

/// 基于 lettre 的 SMTP 投递
pub struct SmtpMailTransport {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {}", config.from, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Config(e.to_string()))?
            .port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            from,
            mailer: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, mail: &MailMessage) -> Result<(), NotifyError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {}", mail.to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// 邮件通知器
pub struct EmailNotifier {
    recipient: String,
    transport: Arc<dyn MailTransport>,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl EmailNotifier {
    pub fn new(recipient: impl Into<String>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            recipient: recipient.into(),
            transport,
        }
    }

    /// 使用 SMTP 投递；收件人地址在构建时校验
    pub fn smtp(config: &SmtpConfig, recipient: impl Into<String>) -> Result<Self, NotifyError> {
        let recipient = recipient.into();
        recipient
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("{}: {}", recipient, e)))?;

        let transport = SmtpMailTransport::new(config)?;
        Ok(Self::new(recipient, Arc::new(transport)))
    }

    pub fn format_mail(&self, alarm: &Alarm) -> MailMessage {
        MailMessage {
            to: self.recipient.clone(),
            subject: format!("[ALARM] {} - {}", alarm.severity, alarm.service_name),
            body: format!(
                "Service: {}\nMetric: {}\nValue: {}\nMessage: {}\nTime: {}\n",
                alarm.service_name,
                alarm.dimension,
                alarm.value,
                alarm.message,
                alarm.raised_at.to_rfc3339()
            ),
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, alarm: &Alarm) -> Result<(), NotifyError> {
        let mail = self.format_mail(alarm);
        self.transport.deliver(&mail).await?;
        debug!(to = %mail.to, subject = %mail.subject, "Alarm email delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flux_monitor_types::{Dimension, Severity};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<MailMessage>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, mail: &MailMessage) -> Result<(), NotifyError> {
            self.sent.lock().await.push(mail.clone());
            Ok(())
        }
    }

    struct RejectingTransport;

    #[async_trait]
    impl MailTransport for RejectingTransport {
        async fn deliver(&self, _mail: &MailMessage) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("connection refused".to_string()))
        }
    }

    fn sample_alarm() -> Alarm {
        let raised_at = Utc.with_ymd_and_hms(2025, 8, 23, 12, 0, 0).unwrap();
        Alarm::new("order-service", Dimension::Memory, 72.5, Severity::Warning, raised_at)
    }

    #[tokio::test]
    async fn test_email_content() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = EmailNotifier::new("ops@example.com", transport.clone());

        notifier.notify(&sample_alarm()).await.unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");
        assert_eq!(sent[0].subject, "[ALARM] WARNING - order-service");
        assert!(sent[0].body.contains("Service: order-service\n"));
        assert!(sent[0].body.contains("Metric: MEMORY\n"));
        assert!(sent[0].body.contains("Value: 72.5\n"));
        assert!(sent[0]
            .body
            .contains("Message: WARNING level reached for MEMORY: 72.50\n"));
        assert!(sent[0].body.contains("Time: 2025-08-23T12:00:00+00:00"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let notifier = EmailNotifier::new("ops@example.com", Arc::new(RejectingTransport));

        let err = notifier.notify(&sample_alarm()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let config = SmtpConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: "not an address".to_string(),
        };

        assert!(matches!(
            SmtpMailTransport::new(&config),
            Err(NotifyError::Address(_))
        ));
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let config = SmtpConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: "monitor@example.com".to_string(),
        };

        let err = tokio_test::assert_err!(EmailNotifier::smtp(&config, "ops at example"));
        match err {
            NotifyError::Address(message) => assert!(message.starts_with("ops at example")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
