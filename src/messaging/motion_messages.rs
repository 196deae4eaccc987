use super::channel::ChatChannel;
use super::content::{Action, Content, CoverData, ListElement};
use super::postback::{build_postback, MOTIONEYE_TAG};
use anyhow::Result;
use log::info;
use std::sync::Arc;

const MOTION_DETECTED_TEXT: &str = "Motion detected";
const VIDEO_LABEL: &str = "Video";

/// Helper for sending motion-related messages to the channel
#[derive(Clone)]
pub struct MotionMessages {
    channel: Arc<ChatChannel>,
}

impl MotionMessages {
    pub fn new(channel: Arc<ChatChannel>) -> Self {
        Self { channel }
    }

    /// Button prompting the user to fetch the files of `event_number`
    pub async fn motion_detected(&self, event_number: i64) -> Result<()> {
        self.channel.send(&motion_detected_content(event_number)).await?;
        info!("Published motion notification for event {}", event_number);
        Ok(())
    }

    /// Card with the snapshot as cover and a link to the movie
    pub async fn event_files(&self, title: &str, subtitle: &str, jpg_url: &str, mp4_url: &str) -> Result<()> {
        self.channel
            .send(&event_files_content(title, subtitle, jpg_url, mp4_url))
            .await
    }

    pub async fn text(&self, text: &str) -> Result<()> {
        self.channel.send(&Content::text(text)).await
    }
}

pub fn motion_detected_content(event_number: i64) -> Content {
    Content::ButtonTemplate {
        content_text: MOTION_DETECTED_TEXT.to_string(),
        actions: vec![Action::Message {
            label: format!("#{}", event_number),
            text: None,
            postback: Some(build_postback(MOTIONEYE_TAG, &[event_number])),
        }],
    }
}

pub fn event_files_content(title: &str, subtitle: &str, jpg_url: &str, mp4_url: &str) -> Content {
    Content::ListTemplate {
        cover_data: Some(CoverData {
            background_image_url: Some(jpg_url.to_string()),
            title: title.to_string(),
            subtitle: None,
        }),
        elements: vec![ListElement {
            title: subtitle.to_string(),
            subtitle: None,
            action: Some(Action::Uri {
                label: VIDEO_LABEL.to_string(),
                uri: mp4_url.to_string(),
            }),
        }],
        actions: vec![],
    }
}
