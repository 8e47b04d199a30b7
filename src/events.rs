use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::schema::FunnelStage;

/// Progress of a radar run, for callers that want to show a spinner or log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadarEvent {
    GeneratingPrompts { product: String },
    PromptsReady { count: usize },
    Querying {
        index: usize,
        total: usize,
        stage: FunnelStage,
        prompt: String,
    },
    AnswerFailed { index: usize, reason: String },
    Completed { answered: usize, failed: usize },
}

pub(crate) async fn send_event(sender: Option<&Sender<RadarEvent>>, event: RadarEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event).await;
    }
}
