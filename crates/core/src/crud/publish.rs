use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::model::Record;

/// A change made through the blueprint actions
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "verb", rename_all = "lowercase")]
pub enum RecordEvent {
	Created {
		model: String,
		record: Value,
	},
	Updated {
		model: String,
		id: Value,
		values: Record,
		previous: Record,
	},
	Destroyed {
		model: String,
		id: Value,
		previous: Record,
	},
}

/// Fans record events out to realtime subscribers
#[derive(Clone, Debug)]
pub struct Publisher {
	tx: broadcast::Sender<RecordEvent>,
}

impl Publisher {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self {
			tx,
		}
	}

	/// Publishes an event, returning the number of subscribers reached
	pub fn publish(&self, event: RecordEvent) -> usize {
		// Sending only fails when nobody is listening
		self.tx.send(event).unwrap_or(0)
	}

	pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
		self.tx.subscribe()
	}
}
