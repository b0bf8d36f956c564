//! Structured lifecycle events and the sinks that receive them.
//!
//! One event per lifecycle transition of a work item (`start` from the watcher, `finish` from the
//! results collector) plus the health timer's `started` and `heartbeat` markers.

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::engine::tools::as_secs_f64;
use crate::utils::config::PackagePaths;
use crate::{ResultItem, WorkItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Detail,
    Health,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Finish,
    Started,
    Heartbeat,
}

#[derive(Clone, Debug, Serialize)]
pub struct Event {
    pub event_type: EventType,
    pub event: EventKind,
    pub util_cmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queued_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_work_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_work_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transforms: Option<Vec<String>>,
    pub message: String,
}

impl Event {
    fn bare(event_type: EventType, event: EventKind, util_cmd: &str, message: String) -> Self {
        Self {
            event_type,
            event,
            util_cmd: util_cmd.to_string(),
            id: None,
            path: None,
            valid: None,
            start: None,
            queued_secs: None,
            worker: None,
            begin_work_secs: None,
            end_work_secs: None,
            finish_secs: None,
            destination: None,
            transforms: None,
            message,
        }
    }

    fn with_work(mut self, work: &WorkItem) -> Self {
        self.id = Some(work.id);
        self.path = Some(work.path.clone());
        self.valid = Some(work.valid);
        self.start = Some(work.start.to_rfc3339());
        self.queued_secs = Some(as_secs_f64(work.queued));
        self
    }

    /// Emitted by the watcher when an item is queued.
    pub fn start(util_cmd: &str, work: &WorkItem) -> Self {
        let message = format!(
            "{util_cmd} start:: id: {}; path: {}",
            work.id,
            work.path.display()
        );
        Self::bare(EventType::Detail, EventKind::Start, util_cmd, message).with_work(work)
    }

    /// Emitted by the results collector; `finish` is measured from the item's start to now.
    pub fn finish(util_cmd: &str, result: &ResultItem) -> Self {
        let finish = Utc::now() - result.work.start;
        let destination = result
            .destination
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());
        let message = format!(
            "{util_cmd} finish:: id: {}; finish: {:.3}s; destination: {}; worker: {}",
            result.work.id,
            as_secs_f64(finish),
            destination,
            result.worker
        );
        let mut event =
            Self::bare(EventType::Detail, EventKind::Finish, util_cmd, message).with_work(&result.work);
        event.worker = Some(result.worker);
        event.begin_work_secs = Some(as_secs_f64(result.begin_work));
        event.end_work_secs = Some(as_secs_f64(result.end_work));
        event.finish_secs = Some(as_secs_f64(finish));
        event.destination = result.destination.clone();
        event.transforms = Some(result.transforms.clone());
        event
    }

    pub fn started(util_cmd: &str, up_secs: f64) -> Self {
        let message = format!("Successfully (re)started (up {up_secs} secs)");
        Self::bare(EventType::Health, EventKind::Started, util_cmd, message)
    }

    pub fn heartbeat(util_cmd: &str) -> Self {
        Self::bare(
            EventType::Health,
            EventKind::Heartbeat,
            util_cmd,
            "health check: up".to_string(),
        )
    }
}

/// Receives every event. Called from component threads; keep it fast.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Writes one JSON line per event through `log` (target `<pkg>::events`).
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &Event) {
        let target = PackagePaths::get().event_target();
        match serde_json::to_string(event) {
            Ok(json) => log::info!(target: target, "{}", json),
            Err(e) => log::warn!("unserializable event ({}): {}", e, event.message),
        }
    }
}

/// Forwards events to a channel, for library callers that consume events themselves.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<Event>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<Event>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &Event) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(event.clone());
    }
}
