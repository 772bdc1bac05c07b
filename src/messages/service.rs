use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, info};

use crate::{
    AppResult, AppState,
    clock::Clock,
    models::{Message, MessageDraft, NewMessage},
    store::{Collection, Filter, FindOptions, Store, StoreExt},
    validate::validate_message,
};

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for MessageService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.clock.clone())
    }
}

impl MessageService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Messages `user` may see, oldest first.
    ///
    /// With a positive `limit` only the `limit` most recent messages by
    /// `time` are considered, and visibility is applied after that cut, so
    /// fewer than `limit` may come back.
    pub async fn list(&self, user: Option<&str>, limit: Option<u64>) -> AppResult<Vec<Message>> {
        let limit = limit.filter(|&limit| limit > 0);
        let options = match limit {
            Some(limit) => FindOptions::latest("time", limit),
            None => FindOptions::default(),
        };

        let fetched: Vec<Message> = self
            .store
            .find_as(Collection::Messages, Filter::all(), options)
            .await?;
        let fetched_count = fetched.len();

        let mut visible: Vec<Message> = fetched
            .into_iter()
            .filter(|msg| msg.is_visible_to(user))
            .collect();
        if limit.is_some() {
            visible.reverse();
        }

        debug!(?user, ?limit, fetched = fetched_count, visible = visible.len(), "listed messages");
        Ok(visible)
    }

    /// Stores a message from `sender`. Whatever `from` and `time` the body
    /// carries are replaced.
    pub async fn post(&self, sender: Option<&str>, body: NewMessage) -> AppResult<Message> {
        let draft = MessageDraft::stamp(body, sender, self.clock.clock_time());
        let mut message = validate_message(&draft)?;

        let id = self.store.insert_as(Collection::Messages, &message).await?;
        message.id = Some(id);

        info!(from = %message.from, to = %message.to, kind = ?message.kind, "message posted");
        Ok(message)
    }
}
