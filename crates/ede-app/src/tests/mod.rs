mod input;

use std::sync::Arc;
use std::time::Duration;

use ede_api::testing::ScriptedClient;
use ede_config::Config;
use ede_core::EntityKind;
use kanal::AsyncReceiver;
use serde_json::{Value, json};

use crate::events::ConsoleEvent;
use crate::view::{ConsoleView, Flow};

pub const WORDS: &str = "/api/v1/admin/words";

/// A view wired to a scripted backend, with its event and output streams
/// held by the test instead of the console tasks
pub struct Harness {
    pub view: ConsoleView,
    pub client: Arc<ScriptedClient>,
    pub events: AsyncReceiver<ConsoleEvent>,
    pub output: AsyncReceiver<String>,
}

impl Harness {
    pub fn new(entity: EntityKind, location: &str, client: ScriptedClient) -> Self {
        let config = Config::default();
        let client = Arc::new(client);
        let (events_tx, events) = kanal::unbounded_async();
        let (output_tx, output) = kanal::unbounded_async();

        let view = ConsoleView::new(
            &config,
            entity.schema(&config),
            location,
            format!("/admin/{entity}"),
            client.clone(),
            events_tx,
            output_tx,
        );

        Self {
            view,
            client,
            events,
            output,
        }
    }

    /// Start the view and apply its first page
    pub async fn started(mut self) -> Self {
        self.view.start(false).await;
        self.pump(1).await;
        self
    }

    pub async fn command(&mut self, command: ede_types::UiCommand) -> Flow {
        self.view.handle(ConsoleEvent::Command(command)).await
    }

    /// Feed the next `n` events produced by spawned work back into the view
    pub async fn pump(&mut self, n: usize) {
        for _ in 0..n {
            let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for a view event")
                .expect("event channel closed");
            self.view.handle(event).await;
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(Some(line)) = self.output.try_recv() {
            lines.push(line);
        }
        lines
    }
}

pub fn words_page(ids: &[u64], total: u64) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "word": format!("word{id}"),
                "language": "yo",
                "translation": "thing",
                "is_active": true,
            })
        })
        .collect();
    json!({ "items": items, "total": total })
}
