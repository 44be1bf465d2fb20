//! Priority queue ordering engine.
//!
//! Maintains a strict total order over the sessions with
//! `is_in_priority_queue == true`, sorted by `(priority ascending,
//! priority_order ascending, id ascending)`. Ordering within a band uses
//! fractional indexing: a reorder assigns the midpoint of its neighbors'
//! orders, so a single drag costs one write instead of renumbering the
//! whole queue. Repeated bisection eventually exhausts float precision,
//! which `renormalize_priority_queue` repairs by re-spacing every order.

use crate::error::Result;
use crate::session::{
    BackendSession, DEFAULT_PRIORITY_BAND, MIN_ORDER_GAP, ORDER_STEP, StoreEvent,
};
use crate::store::EntityStore;
use chrono::Utc;
use std::sync::Arc;

/// Fractional-index ordering operations over the entity store's priority
/// queue. Pure coordination; all I/O goes through the store's repositories
/// under the shared write gate.
pub struct PriorityQueueEngine {
    store: Arc<EntityStore>,
}

impl PriorityQueueEngine {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Adds a session to the priority queue at the end of its band.
    ///
    /// The new order is the band's current maximum plus [`ORDER_STEP`]
    /// (0.0 for an empty band). If the session is already queued it is
    /// re-appended to the end of the target band, which moves it; callers
    /// that want a pure no-op must check `is_in_priority_queue` first.
    /// Silent no-op for an unknown session id.
    pub async fn add_to_priority_queue(&self, session_id: &str, band: Option<i32>) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let Some(mut session) = self.store.session(session_id).await? else {
            return Ok(());
        };

        let band = band.unwrap_or(DEFAULT_PRIORITY_BAND);
        let max_order = self
            .store
            .priority_queue()
            .await?
            .iter()
            .filter(|s| s.priority == band && s.id != session.id)
            .map(|s| s.priority_order)
            .fold(None::<f64>, |max, order| {
                Some(max.map_or(order, |m| m.max(order)))
            });

        session.is_in_priority_queue = true;
        session.priority = band;
        session.priority_order = match max_order {
            Some(max) => max + ORDER_STEP,
            None => 0.0,
        };
        session.priority_queued_at = Some(Utc::now());

        self.store.session_repository().save(&session).await?;
        self.store.emit(StoreEvent::PriorityQueueChanged);
        Ok(())
    }

    /// Removes a session from the priority queue, resetting its priority
    /// fields to their defaults. No-op if the session is not queued.
    pub async fn remove_from_priority_queue(&self, session_id: &str) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let Some(mut session) = self.store.session(session_id).await? else {
            return Ok(());
        };
        if !session.is_in_priority_queue {
            return Ok(());
        }

        session.clear_priority_queue_fields();
        self.store.session_repository().save(&session).await?;
        self.store.emit(StoreEvent::PriorityQueueChanged);
        Ok(())
    }

    /// Moves a queued session to a different priority band.
    ///
    /// Only the band changes; `priority_order` keeps its fractional
    /// position in the new band. Resulting ties against same-band members
    /// resolve through the id tie-break and are not renormalized here.
    pub async fn change_priority(&self, session_id: &str, new_band: i32) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let Some(mut session) = self.store.session(session_id).await? else {
            return Ok(());
        };
        if !session.is_in_priority_queue || session.priority == new_band {
            return Ok(());
        }

        session.priority = new_band;
        self.store.session_repository().save(&session).await?;
        self.store.emit(StoreEvent::PriorityQueueChanged);
        Ok(())
    }

    /// Reorders a queued session between two visual-list neighbors.
    ///
    /// The new `priority_order` is the midpoint of the neighbors' orders;
    /// a `None` upper neighbor means "new first element"
    /// (`lower - ORDER_STEP`), a `None` lower neighbor means "new last
    /// element" (`upper + ORDER_STEP`). The band never changes on reorder.
    ///
    /// Degenerate inputs fall back to leaving the order unchanged: both
    /// neighbors `None`, an unqueued moving session, a named neighbor that
    /// is not actually in the queue, or named neighbors that are not
    /// adjacent queue entries. Adjacency is judged against the queue with
    /// the moving session itself taken out, so re-dropping a session
    /// between its own current neighbors is valid.
    pub async fn reorder_session(
        &self,
        moving_id: &str,
        upper_id: Option<&str>,
        lower_id: Option<&str>,
    ) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        if upper_id.is_none() && lower_id.is_none() {
            return Ok(());
        }

        let queue = self.store.priority_queue().await?;
        let Some(mut moving) = queue.iter().find(|s| s.id == moving_id).cloned() else {
            return Ok(());
        };

        let others: Vec<&BackendSession> =
            queue.iter().filter(|s| s.id != moving_id).collect();
        let position_of = |id: Option<&str>| -> Option<Option<usize>> {
            match id {
                None => Some(None),
                Some(id) => others.iter().position(|s| s.id == id).map(Some),
            }
        };
        // A named neighbor missing from the queue invalidates the request.
        let (Some(upper), Some(lower)) = (position_of(upper_id), position_of(lower_id)) else {
            return Ok(());
        };

        moving.priority_order = match (upper, lower) {
            (Some(upper), Some(lower)) if lower == upper + 1 => {
                (others[upper].priority_order + others[lower].priority_order) / 2.0
            }
            (None, Some(lower)) if lower == 0 => others[lower].priority_order - ORDER_STEP,
            (Some(upper), None) if upper == others.len() - 1 => {
                others[upper].priority_order + ORDER_STEP
            }
            // Stale neighbors (entries that are no longer adjacent) mean
            // the caller's view of the queue is outdated.
            _ => return Ok(()),
        };

        self.store.session_repository().save(&moving).await?;
        self.store.emit(StoreEvent::PriorityQueueChanged);
        Ok(())
    }

    /// Returns true when any two adjacent orders within a band are closer
    /// than [`MIN_ORDER_GAP`], i.e. further bisection would lose float
    /// precision.
    pub async fn needs_renormalization(&self) -> Result<bool> {
        let queue = self.store.priority_queue().await?;
        Ok(Self::adjacent_gap_too_small(&queue))
    }

    /// Re-assigns every queued session's `priority_order` to canonical
    /// [`ORDER_STEP`]-spaced values per band, preserving relative order.
    ///
    /// The full sorted queue is read once and written back in a single
    /// batch under the write gate, so a concurrent reorder can never
    /// interleave with the renormalization pass.
    pub async fn renormalize_priority_queue(&self) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let queue = self.store.priority_queue().await?;
        if queue.is_empty() {
            return Ok(());
        }

        let mut renumbered: Vec<BackendSession> = Vec::with_capacity(queue.len());
        let mut current_band: Option<i32> = None;
        let mut index_in_band: u32 = 0;
        for mut session in queue {
            if current_band != Some(session.priority) {
                current_band = Some(session.priority);
                index_in_band = 0;
            }
            session.priority_order = f64::from(index_in_band) * ORDER_STEP;
            index_in_band += 1;
            renumbered.push(session);
        }

        self.store.session_repository().save_all(&renumbered).await?;
        self.store.emit(StoreEvent::PriorityQueueChanged);
        Ok(())
    }

    /// Appends a session to the simple FIFO queue. No-op if already
    /// enqueued or unknown.
    pub async fn enqueue(&self, session_id: &str) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let Some(mut session) = self.store.session(session_id).await? else {
            return Ok(());
        };
        if session.is_in_queue {
            return Ok(());
        }

        let next_position = self
            .store
            .all_sessions()
            .await?
            .iter()
            .filter(|s| s.is_in_queue)
            .map(|s| s.queue_position)
            .max()
            .map_or(0, |max| max + 1);

        session.is_in_queue = true;
        session.queue_position = next_position;
        self.store.session_repository().save(&session).await?;
        self.store.emit(StoreEvent::QueueChanged);
        Ok(())
    }

    /// Removes a session from the FIFO queue and compacts the positions of
    /// the sessions behind it.
    pub async fn dequeue(&self, session_id: &str) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let Some(mut session) = self.store.session(session_id).await? else {
            return Ok(());
        };
        if !session.is_in_queue {
            return Ok(());
        }

        let removed_position = session.queue_position;
        session.is_in_queue = false;
        session.queue_position = 0;

        let mut updates = vec![session];
        for mut other in self.store.all_sessions().await? {
            if other.id != session_id && other.is_in_queue && other.queue_position > removed_position
            {
                other.queue_position -= 1;
                updates.push(other);
            }
        }

        self.store.session_repository().save_all(&updates).await?;
        self.store.emit(StoreEvent::QueueChanged);
        Ok(())
    }

    fn adjacent_gap_too_small(sorted_queue: &[BackendSession]) -> bool {
        sorted_queue.windows(2).any(|pair| {
            pair[0].priority == pair[1].priority
                && (pair[1].priority_order - pair[0].priority_order).abs() < MIN_ORDER_GAP
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_store;

    async fn engine_with_sessions(ids: &[&str]) -> (PriorityQueueEngine, Arc<EntityStore>) {
        let (store, repos) = memory_store();
        for id in ids {
            repos.seed_session(BackendSession::new(*id, "/tmp")).await;
        }
        (PriorityQueueEngine::new(store.clone()), store)
    }

    async fn queue_ids(store: &EntityStore) -> Vec<String> {
        store
            .priority_queue()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    #[tokio::test]
    async fn test_add_to_empty_queue_assigns_defaults() {
        let (engine, store) = engine_with_sessions(&["s", "t"]).await;

        engine.add_to_priority_queue("s", None).await.unwrap();
        let s = store.session("s").await.unwrap().unwrap();
        assert!(s.is_in_priority_queue);
        assert_eq!(s.priority, DEFAULT_PRIORITY_BAND);
        assert_eq!(s.priority_order, 0.0);
        assert!(s.priority_queued_at.is_some());

        engine.add_to_priority_queue("t", None).await.unwrap();
        let t = store.session("t").await.unwrap().unwrap();
        assert_eq!(t.priority_order, 1000.0);
        assert_eq!(queue_ids(&store).await, vec!["s", "t"]);
    }

    #[tokio::test]
    async fn test_re_add_moves_to_end_of_band() {
        let (engine, store) = engine_with_sessions(&["a", "b"]).await;
        engine.add_to_priority_queue("a", None).await.unwrap();
        engine.add_to_priority_queue("b", None).await.unwrap();

        engine.add_to_priority_queue("a", None).await.unwrap();

        assert_eq!(queue_ids(&store).await, vec!["b", "a"]);
        let a = store.session("a").await.unwrap().unwrap();
        assert_eq!(a.priority_order, 2000.0);
    }

    #[tokio::test]
    async fn test_remove_resets_fields_and_is_idempotent() {
        let (engine, store) = engine_with_sessions(&["a"]).await;
        engine.add_to_priority_queue("a", Some(3)).await.unwrap();

        engine.remove_from_priority_queue("a").await.unwrap();
        engine.remove_from_priority_queue("a").await.unwrap();

        let a = store.session("a").await.unwrap().unwrap();
        assert!(!a.is_in_priority_queue);
        assert_eq!(a.priority, DEFAULT_PRIORITY_BAND);
        assert_eq!(a.priority_order, 0.0);
        assert!(a.priority_queued_at.is_none());
    }

    #[tokio::test]
    async fn test_reorder_midpoint_between_neighbors() {
        // Concrete scenario: A(0), B(1000), C(2000), all one band.
        let (engine, store) = engine_with_sessions(&["a", "b", "c"]).await;
        engine.add_to_priority_queue("a", Some(5)).await.unwrap();
        engine.add_to_priority_queue("b", Some(5)).await.unwrap();
        engine.add_to_priority_queue("c", Some(5)).await.unwrap();

        engine
            .reorder_session("c", Some("a"), Some("b"))
            .await
            .unwrap();

        let c = store.session("c").await.unwrap().unwrap();
        assert_eq!(c.priority_order, 500.0);
        assert_eq!(queue_ids(&store).await, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_reorder_to_extremes() {
        let (engine, store) = engine_with_sessions(&["a", "b", "c"]).await;
        for id in ["a", "b", "c"] {
            engine.add_to_priority_queue(id, None).await.unwrap();
        }

        // Move c to the front, then a to the back.
        engine.reorder_session("c", None, Some("a")).await.unwrap();
        engine.reorder_session("a", Some("b"), None).await.unwrap();

        assert_eq!(queue_ids(&store).await, vec!["c", "b", "a"]);
        let c = store.session("c").await.unwrap().unwrap();
        assert_eq!(c.priority_order, -1000.0);
    }

    #[tokio::test]
    async fn test_reorder_preserves_membership_and_band() {
        let (engine, store) = engine_with_sessions(&["a", "b", "c"]).await;
        for id in ["a", "b", "c"] {
            engine.add_to_priority_queue(id, Some(7)).await.unwrap();
        }

        engine
            .reorder_session("a", Some("b"), Some("c"))
            .await
            .unwrap();

        let queue = store.priority_queue().await.unwrap();
        assert_eq!(queue.len(), 3);
        assert!(queue.iter().all(|s| s.priority == 7));
        let mut ids: Vec<String> = queue.into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_degenerate_reorders_are_noops() {
        let (engine, store) = engine_with_sessions(&["a", "b", "x"]).await;
        engine.add_to_priority_queue("a", None).await.unwrap();
        engine.add_to_priority_queue("b", None).await.unwrap();

        // Both neighbors nil.
        engine.reorder_session("a", None, None).await.unwrap();
        // Moving session not queued.
        engine.reorder_session("x", Some("a"), Some("b")).await.unwrap();
        // Named neighbor not queued.
        engine.reorder_session("b", Some("x"), None).await.unwrap();

        assert_eq!(queue_ids(&store).await, vec!["a", "b"]);
        let a = store.session("a").await.unwrap().unwrap();
        assert_eq!(a.priority_order, 0.0);
    }

    #[tokio::test]
    async fn test_non_adjacent_neighbors_are_noops() {
        let (engine, store) = engine_with_sessions(&["a", "b", "c", "m"]).await;
        for id in ["a", "b", "c", "m"] {
            engine.add_to_priority_queue(id, None).await.unwrap();
        }

        // a and c are not adjacent (b sits between them).
        engine
            .reorder_session("m", Some("a"), Some("c"))
            .await
            .unwrap();
        // b is not the first entry, so it cannot gain a "new first"
        // predecessor.
        engine.reorder_session("m", None, Some("b")).await.unwrap();
        // b is not the last entry either.
        engine.reorder_session("m", Some("b"), None).await.unwrap();

        let m = store.session("m").await.unwrap().unwrap();
        assert_eq!(m.priority_order, 3000.0);
        assert_eq!(queue_ids(&store).await, vec!["a", "b", "c", "m"]);
    }

    #[tokio::test]
    async fn test_reorder_between_own_current_neighbors() {
        let (engine, store) = engine_with_sessions(&["a", "b", "c"]).await;
        for id in ["a", "b", "c"] {
            engine.add_to_priority_queue(id, None).await.unwrap();
        }

        // Dropping b back between its own neighbors is a valid reorder.
        engine
            .reorder_session("b", Some("a"), Some("c"))
            .await
            .unwrap();

        let b = store.session("b").await.unwrap().unwrap();
        assert_eq!(b.priority_order, 1000.0);
        assert_eq!(queue_ids(&store).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_change_priority_keeps_order_value() {
        let (engine, store) = engine_with_sessions(&["a", "b"]).await;
        engine.add_to_priority_queue("a", Some(10)).await.unwrap();
        engine.add_to_priority_queue("b", Some(10)).await.unwrap();

        engine.change_priority("b", 1).await.unwrap();

        let b = store.session("b").await.unwrap().unwrap();
        assert_eq!(b.priority, 1);
        assert_eq!(b.priority_order, 1000.0);
        assert_eq!(queue_ids(&store).await, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_needs_renormalization_after_repeated_bisection() {
        let (engine, store) = engine_with_sessions(&["a", "b", "m"]).await;
        engine.add_to_priority_queue("a", None).await.unwrap();
        engine.add_to_priority_queue("b", None).await.unwrap();
        engine.add_to_priority_queue("m", None).await.unwrap();

        assert!(!engine.needs_renormalization().await.unwrap());

        // Repeatedly drag the trailing session between the leading pair,
        // halving the head gap each time until it collapses below the
        // epsilon.
        for _ in 0..64 {
            let queue = store.priority_queue().await.unwrap();
            let upper = queue[0].id.clone();
            let lower = queue[1].id.clone();
            let moving = queue[2].id.clone();
            engine
                .reorder_session(&moving, Some(&upper), Some(&lower))
                .await
                .unwrap();
            if engine.needs_renormalization().await.unwrap() {
                return;
            }
        }
        panic!("bisection never dropped below MIN_ORDER_GAP");
    }

    #[tokio::test]
    async fn test_renormalization_preserves_relative_order() {
        let (engine, store) = engine_with_sessions(&["a", "b", "c", "d"]).await;
        engine.add_to_priority_queue("a", Some(2)).await.unwrap();
        engine.add_to_priority_queue("b", Some(2)).await.unwrap();
        engine.add_to_priority_queue("c", Some(8)).await.unwrap();
        engine.add_to_priority_queue("d", Some(8)).await.unwrap();
        engine
            .reorder_session("b", None, Some("a"))
            .await
            .unwrap();
        engine
            .reorder_session("d", Some("c"), None)
            .await
            .unwrap();

        let before = queue_ids(&store).await;
        engine.renormalize_priority_queue().await.unwrap();
        let after = queue_ids(&store).await;

        assert_eq!(before, after);
        // Each band restarts at 0.0 with ORDER_STEP spacing.
        let queue = store.priority_queue().await.unwrap();
        let orders: Vec<f64> = queue.iter().map(|s| s.priority_order).collect();
        assert_eq!(orders, vec![0.0, 1000.0, 0.0, 1000.0]);
    }

    #[tokio::test]
    async fn test_fifo_enqueue_and_dequeue_compacts() {
        let (engine, store) = engine_with_sessions(&["a", "b", "c"]).await;
        engine.enqueue("a").await.unwrap();
        engine.enqueue("b").await.unwrap();
        engine.enqueue("c").await.unwrap();

        engine.dequeue("b").await.unwrap();

        let a = store.session("a").await.unwrap().unwrap();
        let b = store.session("b").await.unwrap().unwrap();
        let c = store.session("c").await.unwrap().unwrap();
        assert_eq!((a.is_in_queue, a.queue_position), (true, 0));
        assert_eq!((b.is_in_queue, b.queue_position), (false, 0));
        assert_eq!((c.is_in_queue, c.queue_position), (true, 1));
    }

    #[tokio::test]
    async fn test_unknown_session_is_silent_noop() {
        let (engine, store) = engine_with_sessions(&[]).await;
        engine.add_to_priority_queue("ghost", None).await.unwrap();
        engine.remove_from_priority_queue("ghost").await.unwrap();
        assert!(queue_ids(&store).await.is_empty());
    }
}
