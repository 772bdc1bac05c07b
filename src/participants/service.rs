use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, info};

use crate::{
    AppError, AppResult, AppState,
    clock::Clock,
    models::{Message, NewParticipant, Participant},
    store::{Collection, Filter, FindOptions, Store, StoreExt},
    validate::validate_participant,
};

#[derive(Clone)]
pub struct ParticipantService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for ParticipantService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.clock.clone())
    }
}

impl ParticipantService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn list(&self) -> AppResult<Vec<Participant>> {
        let participants: Vec<Participant> = self
            .store
            .find_as(Collection::Users, Filter::all(), FindOptions::default())
            .await?;
        debug!(count = participants.len(), "listed participants");

        Ok(participants)
    }

    /// Registers a new participant and announces them to the room.
    ///
    /// The two inserts are not atomic: if the announcement fails the
    /// participant stays registered. Two concurrent registrations of the
    /// same name can both pass the duplicate check.
    pub async fn register(&self, payload: &NewParticipant) -> AppResult<Participant> {
        let name = validate_participant(payload)?;

        if self
            .store
            .find_one(Collection::Users, Filter::eq("name", name.as_str()))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(name));
        }

        let mut participant = Participant::new(name, self.clock.epoch_millis());
        let id = self.store.insert_as(Collection::Users, &participant).await?;
        participant.id = Some(id);

        let announcement = Message::join_announcement(&participant.name, self.clock.clock_time());
        self.store.insert_as(Collection::Messages, &announcement).await?;

        info!(name = %participant.name, "participant joined");
        Ok(participant)
    }
}
