use crate::config::LedgerConfig;
use crate::events::{EventKind, EventState, Notification, ReconciliationEngine};
use crate::messaging::postback::{parse_postback, MOTIONEYE_TAG};
use crate::messaging::MotionMessages;
use anyhow::Result;
use log::{debug, info};
use serde_json::Value;

const DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// A webhook body, after deciding who sent it
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    /// motionEye notification
    Camera(Notification),
    /// A chat user pressed a button (or typed) in the channel
    Callback { text: String, postback: Option<String> },
    Ignored,
}

impl InboundPayload {
    pub fn classify(body: &Value) -> Self {
        if is_truthy(&body["motioneye"]) {
            return InboundPayload::Camera(Notification::from_payload(body));
        }

        let content = &body["content"];
        if body["type"] == "message" && content["type"] == "text" {
            return InboundPayload::Callback {
                text: content["text"].as_str().unwrap_or_default().to_string(),
                postback: content["postback"]
                    .as_str()
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            };
        }

        InboundPayload::Ignored
    }
}

/// JSON truthiness: null, false, 0 and "" are false
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Leading integer of `text`, like `parseInt(text, 10)`
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    text[..sign_len + digits].parse().ok()
}

/// Connects the webhook to the ledger and the chat channel
#[derive(Clone)]
pub struct Relay {
    engine: ReconciliationEngine,
    ledger: LedgerConfig,
    root: String,
    messages: MotionMessages,
}

impl Relay {
    pub fn new(engine: ReconciliationEngine, ledger: LedgerConfig, root: String, messages: MotionMessages) -> Self {
        Self {
            engine,
            ledger,
            root,
            messages,
        }
    }

    pub async fn handle(&self, body: &Value) -> Result<()> {
        match InboundPayload::classify(body) {
            InboundPayload::Camera(notification) => self.on_camera(&notification).await,
            InboundPayload::Callback { text, postback } => {
                self.on_callback(&text, postback.as_deref()).await
            }
            InboundPayload::Ignored => {
                debug!("Ignoring webhook payload");
                Ok(())
            }
        }
    }

    async fn on_camera(&self, notification: &Notification) -> Result<()> {
        if self.engine.apply(&self.ledger, notification).await? == EventKind::Started {
            self.messages.motion_detected(notification.event_number).await?;
        }
        Ok(())
    }

    async fn on_callback(&self, text: &str, postback: Option<&str>) -> Result<()> {
        let Some(postback) = postback.map(parse_postback) else {
            debug!("Callback without postback: {}", text);
            return Ok(());
        };
        if postback.tag != MOTIONEYE_TAG {
            debug!("Ignoring postback tag {}", postback.tag);
            return Ok(());
        }
        let Some(event_number) = postback.values.first().and_then(|v| leading_integer(v)) else {
            debug!("Postback without event number: {:?}", postback.values);
            return Ok(());
        };

        let state = self.engine.query(&self.ledger, &self.root, event_number).await?;
        info!("Query for event {}: {:?}", event_number, state);
        match state {
            EventState::Uploading => {
                self.messages.text(&format!("(uploading)\n[{}]", text)).await
            }
            EventState::Missing => self.messages.text(&format!("(no data)\n[{}]", text)).await,
            EventState::Ready {
                jpg_url,
                mp4_url,
                datetime,
            } => {
                let subtitle = datetime
                    .map(|d| d.format(DATETIME_FORMAT).to_string())
                    .unwrap_or_default();
                self.messages
                    .event_files(&format!("[{}]", text), &subtitle, &jpg_url, &mp4_url)
                    .await
            }
        }
    }
}
