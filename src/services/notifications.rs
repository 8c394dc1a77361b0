use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use crate::config::SmtpConfig;
use crate::entities::work_order;
use crate::errors::ServiceError;

/// Sends the signing-confirmation email over SMTP.
///
/// Constructed once at startup and shared; delivery failures are returned to
/// the caller, which logs and swallows them — mail never blocks a signature.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(cfg: &SmtpConfig) -> Result<Self, ServiceError> {
        let mut builder = match cfg.tls.to_ascii_lowercase().as_str() {
            "implicit" => AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
                .map_err(|e| ServiceError::InvalidInput(format!("Invalid SMTP host: {}", e)))?,
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
                .map_err(|e| ServiceError::InvalidInput(format!("Invalid SMTP host: {}", e)))?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host),
        };

        builder = builder
            .port(cfg.port)
            .timeout(Some(std::time::Duration::from_secs(10)));

        if let (Some(username), Some(password)) = (cfg.username.clone(), cfg.password.clone()) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let from: Mailbox = cfg
            .from
            .parse()
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid SMTP from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Render and send the confirmation for a freshly signed work order.
    #[instrument(skip(self, order), fields(ticket = %order.work_order_number), err)]
    pub async fn send_confirmation(
        &self,
        order: &work_order::Model,
        signer_name: Option<&str>,
        to: &str,
    ) -> Result<(), ServiceError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| ServiceError::MailError(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("維修單確認 - {}", order.work_order_number))
            .header(ContentType::TEXT_HTML)
            .body(render_confirmation_html(order, signer_name))
            .map_err(|e| ServiceError::MailError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ServiceError::MailError(e.to_string()))?;

        info!("confirmation email sent");
        Ok(())
    }
}

/// The localized confirmation body, interpolating the work order's fields.
/// Rows for absent fields are omitted entirely.
pub fn render_confirmation_html(order: &work_order::Model, signer_name: Option<&str>) -> String {
    let mut rows = String::new();
    let mut push_row = |label: &str, value: &str| {
        rows.push_str(&format!(
            "<div class=\"info-row\"><div class=\"info-label\">{}</div><div class=\"info-value\">{}</div></div>",
            label,
            escape_html(value)
        ));
    };

    push_row("維修單號：", &order.work_order_number);
    push_row("日期：", &order.date);
    if let Some(site) = order.site_name.as_deref() {
        push_row("案場：", site);
    }
    let location: Vec<&str> = [
        order.building.as_deref(),
        order.floor.as_deref(),
        order.unit.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !location.is_empty() {
        push_row("位置：", &location.join(" / "));
    }
    if let Some(reason) = order.reason.as_deref() {
        push_row("維修原因：", reason);
    }
    if let Some(worker) = order.worker_name.as_deref() {
        push_row("工務人員：", worker);
    }
    if order.amount > 0.0 {
        push_row("金額：", &format!("NT$ {}", order.amount));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-TW">
<head>
<meta charset="UTF-8">
<title>維修單確認</title>
</head>
<body>
<div class="container">
  <div class="header">
    <h1>維修單確認通知</h1>
    <p>您的維修單已完成確認</p>
  </div>
  <div class="signature-info">
    <p><strong>簽名人員：</strong> {signer}</p>
    <p><strong>確認時間：</strong> {signed_at}</p>
    <p><strong>狀態：</strong> 已確認</p>
  </div>
  <div class="work-order-info">
    <h3>維修單詳細資料</h3>
    {rows}
  </div>
  <div class="footer">
    <p>此為系統自動發送的確認信件，請勿直接回覆</p>
  </div>
</div>
</body>
</html>
"#,
        signer = escape_html(signer_name.unwrap_or("未提供")),
        signed_at = Utc::now().format("%Y-%m-%d %H:%M:%S"),
        rows = rows,
    )
}

pub(crate) fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::work_order::WorkOrderStatus;
    use chrono::Utc;

    fn order() -> work_order::Model {
        work_order::Model {
            id: 1,
            work_order_number: "WO20240101001".into(),
            date: "2024-01-01".into(),
            site_name: Some("Site A".into()),
            building: Some("A棟".into()),
            floor: Some("3F".into()),
            unit: None,
            reason: Some("漏水".into()),
            worker_name: Some("王小明".into()),
            amount: 500.0,
            status: WorkOrderStatus::Confirmed,
            unique_link: "token".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn body_interpolates_order_fields() {
        let html = render_confirmation_html(&order(), Some("陳先生"));
        assert!(html.contains("WO20240101001"));
        assert!(html.contains("Site A"));
        assert!(html.contains("A棟 / 3F"));
        assert!(html.contains("漏水"));
        assert!(html.contains("NT$ 500"));
        assert!(html.contains("陳先生"));
    }

    #[test]
    fn absent_fields_are_omitted() {
        let mut order = order();
        order.site_name = None;
        order.amount = 0.0;
        let html = render_confirmation_html(&order, None);
        assert!(!html.contains("案場"));
        assert!(!html.contains("金額"));
        assert!(html.contains("未提供"));
    }

    #[test]
    fn values_are_html_escaped() {
        let mut order = order();
        order.reason = Some("<script>alert(1)</script>".into());
        let html = render_confirmation_html(&order, None);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
