use chrono::{DateTime, Utc};

/// Audit timestamps carried by every persisted entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuditStamp {
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Implemented by entities that carry `created_at` / `modified_at` columns.
pub trait Audited {
    fn audit(&self) -> AuditStamp;
    fn apply_audit(&mut self, stamp: AuditStamp);
}

/// Stamp an entity that is about to be inserted for the first time.
/// Both timestamps are set to the current UTC instant.
pub fn stamp_insert<E: Audited>(entity: &mut E) {
    let now = Utc::now();
    entity.apply_audit(AuditStamp {
        created_at: now,
        modified_at: now,
    });
}

/// Stamp an entity that is about to be updated. `modified_at` becomes the
/// current UTC instant; `created_at` is taken from the prior snapshot so a
/// stale or zeroed in-memory value can never overwrite the original.
pub fn stamp_update<E: Audited>(entity: &mut E, prior: &E) {
    entity.apply_audit(AuditStamp {
        created_at: prior.audit().created_at,
        modified_at: Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Probe {
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    }

    impl Audited for Probe {
        fn audit(&self) -> AuditStamp {
            AuditStamp {
                created_at: self.created_at,
                modified_at: self.modified_at,
            }
        }

        fn apply_audit(&mut self, stamp: AuditStamp) {
            self.created_at = stamp.created_at;
            self.modified_at = stamp.modified_at;
        }
    }

    fn zeroed() -> Probe {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        Probe {
            created_at: epoch,
            modified_at: epoch,
        }
    }

    #[test]
    fn insert_sets_both_timestamps() {
        let before = Utc::now();
        let mut probe = zeroed();
        stamp_insert(&mut probe);

        assert!(probe.created_at >= before);
        assert_eq!(probe.created_at, probe.modified_at);
    }

    #[test]
    fn update_preserves_created_at_from_prior_snapshot() {
        let mut prior = zeroed();
        stamp_insert(&mut prior);
        let original_created = prior.created_at;

        // Caller hands over an entity with a garbage created_at, as a stale
        // in-memory copy would.
        let mut updated = zeroed();
        stamp_update(&mut updated, &prior);

        assert_eq!(updated.created_at, original_created);
        assert!(updated.modified_at >= prior.modified_at);
    }

    #[test]
    fn repeated_updates_never_decrease_modified_at() {
        let mut entity = zeroed();
        stamp_insert(&mut entity);

        let mut last = entity.modified_at;
        for _ in 0..3 {
            let prior = Probe {
                created_at: entity.created_at,
                modified_at: entity.modified_at,
            };
            stamp_update(&mut entity, &prior);
            assert!(entity.modified_at >= last);
            assert_eq!(entity.created_at, prior.created_at);
            last = entity.modified_at;
        }
    }
}
