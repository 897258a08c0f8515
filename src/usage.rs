//! Usage-edge publishing: turn a reference list into graph-edge update
//! events grouped by referred-entity type.
//!
//! Publishing is full-replace, never incremental: every event carries the
//! complete current reference set for its type plus the
//! `delete_old_referred_by_records` flag, trading event-bus traffic for
//! tolerance of at-least-once delivery. Downstream consumers assume full
//! replacement per type per publish; do not optimize this to deltas.

use anyhow::Context;
use indexmap::IndexMap;

use crate::core::{EntityReference, EntityType};
use crate::external::{EventBus, UsageEvent};

/// Publishes who-depends-on-whom edges for a referrer.
pub struct UsagePublisher<'a> {
    bus: &'a dyn EventBus,
}

impl<'a> UsagePublisher<'a> {
    /// Wrap an event-bus transport.
    pub fn new(bus: &'a dyn EventBus) -> Self {
        Self { bus }
    }

    /// Publish the complete reference set of `referrer`.
    ///
    /// Always emits a delete-all-prior-edges event first; a failure there is
    /// logged and swallowed (the event is idempotent and the next publish
    /// repeats it). With an empty reference list that is all. Otherwise one
    /// create event per referred-entity type follows, in first-seen order;
    /// failures on the create path propagate to the caller.
    pub async fn publish(
        &self,
        referrer: &EntityReference,
        references: &[EntityReference],
    ) -> anyhow::Result<()> {
        let account_id = referrer.identifier_ref.account_id.clone();
        let delete_all = UsageEvent {
            account_id: account_id.clone(),
            referrer: referrer.clone(),
            referred_entities: Vec::new(),
            delete_old_referred_by_records: true,
            entity_type_key: None,
        };
        if let Err(err) = self.bus.publish(delete_all).await {
            tracing::warn!(
                referrer = %referrer.identifier_ref.identifier,
                error = %err,
                "failed to publish delete-edges event, continuing"
            );
        }

        if references.is_empty() {
            return Ok(());
        }

        let mut groups: IndexMap<EntityType, Vec<EntityReference>> = IndexMap::new();
        for reference in references {
            groups.entry(reference.entity_type).or_default().push(reference.clone());
        }
        for (entity_type, referred_entities) in groups {
            tracing::debug!(
                referrer = %referrer.identifier_ref.identifier,
                entity_type = %entity_type,
                count = referred_entities.len(),
                "publishing usage edges"
            );
            let event = UsageEvent {
                account_id: account_id.clone(),
                referrer: referrer.clone(),
                referred_entities,
                delete_old_referred_by_records: true,
                entity_type_key: Some(entity_type),
            };
            self.bus
                .publish(event)
                .await
                .with_context(|| format!("publishing {entity_type} usage edges failed"))?;
        }
        Ok(())
    }
}
