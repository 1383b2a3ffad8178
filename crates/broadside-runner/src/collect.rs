//! Bounded order collection.
//!
//! All captains are asked at once. Each answer is raced against the order
//! timeout; a captain that runs out of time is dropped mid-thought and its
//! ship falls back to default orders.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;

use broadside_core::events::CombatEvent;
use broadside_core::orders::OrderSet;
use broadside_core::state::BattleSnapshot;
use broadside_core::types::ShipId;

use crate::captain::{Captain, CaptainView};

/// A captain at the helm of one ship.
pub struct Seat {
    pub ship: ShipId,
    pub captain: Box<dyn Captain>,
}

impl Seat {
    pub fn new(ship: ShipId, captain: impl Captain + 'static) -> Self {
        Self {
            ship,
            captain: Box::new(captain),
        }
    }
}

/// Ask every seat for orders. Only answered seats appear in the result, in
/// seat order.
pub async fn collect_orders(
    seats: &mut [Seat],
    checkpoint: u32,
    snapshot: Arc<BattleSnapshot>,
    events: Arc<[CombatEvent]>,
    limit: Duration,
) -> Vec<(ShipId, OrderSet)> {
    let asks = seats.iter_mut().map(|seat| {
        let view = CaptainView {
            ship: seat.ship,
            checkpoint,
            snapshot: Arc::clone(&snapshot),
            events: Arc::clone(&events),
        };
        async move {
            let answer = timeout(limit, seat.captain.orders(&view)).await;
            (seat.ship, seat.captain.name().to_string(), answer)
        }
    });

    let mut collected = Vec::new();
    for (ship, captain, answer) in join_all(asks).await {
        match answer {
            Ok(Some(orders)) => collected.push((ship, orders)),
            Ok(None) => tracing::debug!(%ship, %captain, checkpoint, "captain passed"),
            Err(_) => {
                tracing::warn!(%ship, %captain, checkpoint, ?limit, "captain timed out")
            }
        }
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use broadside_core::enums::FireMode;
    use broadside_core::state::BattleSnapshot;

    use crate::captain::{HoldCaptain, ScriptedCaptain};

    /// Thinks for a minute before answering.
    struct SlowCaptain;

    #[async_trait]
    impl Captain for SlowCaptain {
        fn name(&self) -> &str {
            "slow"
        }

        async fn orders(&mut self, _view: &CaptainView) -> Option<OrderSet> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Some(OrderSet {
                fire_mode: FireMode::FireAtWill,
                ..OrderSet::default()
            })
        }
    }

    fn empty_snapshot() -> Arc<BattleSnapshot> {
        Arc::new(BattleSnapshot {
            tick: 0,
            time_s: 0.0,
            ships: Vec::new(),
            projectiles: Vec::new(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_captain_is_omitted() {
        let quick = OrderSet {
            fire_mode: FireMode::KineticOnly,
            ..OrderSet::default()
        };
        let mut seats = vec![
            Seat::new(ShipId(0), SlowCaptain),
            Seat::new(ShipId(1), ScriptedCaptain::new(vec![quick.clone()])),
            Seat::new(ShipId(2), HoldCaptain),
        ];
        let started = tokio::time::Instant::now();
        let orders = collect_orders(
            &mut seats,
            1,
            empty_snapshot(),
            Arc::from(Vec::new()),
            Duration::from_millis(500),
        )
        .await;

        assert_eq!(orders, vec![(ShipId(1), quick)], "Only the prompt answer counts");
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "Collection is bounded by the timeout, took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_patient_timeout_accepts_slow_answer() {
        let mut seats = vec![Seat::new(ShipId(0), SlowCaptain)];
        let orders = collect_orders(
            &mut seats,
            1,
            empty_snapshot(),
            Arc::from(Vec::new()),
            Duration::from_secs(120),
        )
        .await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].1.fire_mode, FireMode::FireAtWill);
    }
}
