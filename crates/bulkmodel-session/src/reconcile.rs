//! Post-bulk reconciliation of the tracking set.
//!
//! After a bulk write, the context's view of the written entities is
//! stale. These helpers update it in one pass with automatic change
//! detection suspended, so reconciling n entities never triggers n full
//! scans of the tracking set.

use crate::{AutoDetectChangesGuard, EntityState, PersistenceContext};
use bulkmodel_core::{Model, Result};

/// Mark every entity as [`EntityState::Unchanged`], making its current
/// values the baseline.
///
/// Entities that were not tracked are attached. An empty input is a no-op
/// that still toggles and restores auto-detect.
#[allow(clippy::result_large_err)]
#[tracing::instrument(
    level = "debug",
    skip(ctx, entities),
    fields(model = std::any::type_name::<M>(), count = tracing::field::Empty)
)]
pub fn mark_unchanged<'e, P, M, I>(ctx: &mut P, entities: I) -> Result<()>
where
    P: PersistenceContext,
    M: Model + 'e,
    I: IntoIterator<Item = &'e M>,
{
    let mut guard = AutoDetectChangesGuard::new(ctx);
    let mut count = 0usize;
    for entity in entities {
        guard.set_entity_state(entity, EntityState::Unchanged)?;
        count += 1;
    }
    tracing::Span::current().record("count", count);
    tracing::debug!(count, "Marked entities unchanged");
    Ok(())
}

/// Remove every entity from the tracking set.
///
/// Stops at the first entity that cannot be detached (for example one that
/// was never tracked); entities before it stay detached.
#[allow(clippy::result_large_err)]
#[tracing::instrument(
    level = "debug",
    skip(ctx, entities),
    fields(model = std::any::type_name::<M>(), count = tracing::field::Empty)
)]
pub fn detach<'e, P, M, I>(ctx: &mut P, entities: I) -> Result<()>
where
    P: PersistenceContext,
    M: Model + 'e,
    I: IntoIterator<Item = &'e M>,
{
    let mut guard = AutoDetectChangesGuard::new(ctx);
    let mut count = 0usize;
    for entity in entities {
        guard.detach(entity)?;
        count += 1;
    }
    tracing::Span::current().record("count", count);
    tracing::debug!(count, "Detached entities");
    Ok(())
}
