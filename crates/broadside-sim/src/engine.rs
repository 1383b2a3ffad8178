//! Battle engine: the orchestrator of the combat kernel.
//!
//! `BattleEngine` owns the ship arena, the hecs projectile world, the event
//! log and the seeded RNG. Captains submit orders between checkpoints; each
//! `run_checkpoint` folds them in and runs the fixed-rate tick loop until
//! the next checkpoint or the end of the battle. Completely headless and
//! deterministic: same seed and same orders give the same log.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use hecs::World;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use broadside_core::catalog::Catalog;
use broadside_core::components::ShipState;
use broadside_core::config::BattleConfig;
use broadside_core::constants::DT;
use broadside_core::enums::{BattleOutcome, BattlePhase, ShipStatus, Side};
use broadside_core::error::{CombatError, EngineFault, Result};
use broadside_core::events::{CombatEvent, EventLog, EventPayload, PendingEvent};
use broadside_core::orders::{Order, OrderSet};
use broadside_core::setup::BattleSetup;
use broadside_core::state::BattleSnapshot;
use broadside_core::types::{ShipId, SimTime, Vec3};

use crate::systems;
use crate::systems::fire_control::Armory;
use crate::systems::physics::ThrustCommand;
use crate::world_setup;

/// What one `run_checkpoint` call did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointReport {
    /// Checkpoint number, starting at 1.
    pub checkpoint: u32,
    pub ticks_run: u64,
    pub events_appended: usize,
    pub phase: BattlePhase,
}

/// The combat engine. Owns the world and all battle state.
pub struct BattleEngine {
    catalog: Arc<Catalog>,
    config: BattleConfig,
    world: World,
    ships: Vec<ShipState>,
    time: SimTime,
    phase: BattlePhase,
    rng: ChaCha8Rng,
    events: EventLog,
    pending: Vec<PendingEvent>,
    snapshots: Vec<BattleSnapshot>,
    submitted: BTreeMap<ShipId, OrderSet>,
    checkpoint: u32,
    next_projectile_id: u64,
    surrendered: BTreeSet<Side>,
    draw_offers: BTreeSet<Side>,
    commands: Vec<ThrustCommand>,
    prev_positions: Vec<Vec3>,
    despawn_buffer: Vec<hecs::Entity>,
}

impl BattleEngine {
    /// Validate the inputs, build the fleets and log the battle start.
    pub fn new(catalog: Arc<Catalog>, config: BattleConfig, setup: BattleSetup) -> Result<Self> {
        catalog.validate()?;
        config.validate()?;
        setup.validate()?;
        let ships = world_setup::build_fleet(&setup, &catalog)?;

        let mut engine = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            catalog,
            config,
            world: World::new(),
            time: SimTime::default(),
            phase: BattlePhase::AwaitingOrders,
            events: EventLog::default(),
            pending: Vec::new(),
            snapshots: Vec::new(),
            submitted: BTreeMap::new(),
            checkpoint: 0,
            next_projectile_id: 1,
            surrendered: BTreeSet::new(),
            draw_offers: BTreeSet::new(),
            commands: Vec::with_capacity(ships.len()),
            prev_positions: Vec::with_capacity(ships.len()),
            despawn_buffer: Vec::new(),
            ships,
        };

        tracing::info!(
            ships = engine.ships.len(),
            seed = engine.config.seed,
            "battle started"
        );
        engine.pending.push(PendingEvent::new(EventPayload::BattleStarted {
            ships: engine.ships.len() as u32,
            seed: engine.config.seed,
        }));
        engine.flush()?;
        engine.record_snapshot();
        Ok(engine)
    }

    /// Replace a ship's orders for the next checkpoint.
    pub fn submit_orders(&mut self, ship: ShipId, orders: OrderSet) -> Result<()> {
        self.check_order_target(ship)?;
        self.submitted.insert(ship, orders);
        Ok(())
    }

    /// Fold a single order into a ship's orders for the next checkpoint.
    pub fn submit_order(&mut self, ship: ShipId, order: Order) -> Result<()> {
        self.check_order_target(ship)?;
        self.submitted.entry(ship).or_default().apply(order);
        Ok(())
    }

    fn check_order_target(&self, ship: ShipId) -> Result<()> {
        if self.outcome().is_some() {
            return Err(CombatError::BattleOver);
        }
        if ship.index() >= self.ships.len() {
            return Err(CombatError::UnknownShip(ship));
        }
        Ok(())
    }

    /// Apply pending orders and simulate up to the next checkpoint.
    pub fn run_checkpoint(&mut self) -> Result<CheckpointReport> {
        if self.outcome().is_some() {
            return Err(CombatError::BattleOver);
        }
        let start_len = self.events.len();
        self.checkpoint += 1;
        self.intake_orders();
        self.flush()?;

        let mut ticks_run = 0;
        for _ in 0..self.config.ticks_per_checkpoint() {
            self.tick()?;
            ticks_run += 1;
            if self.outcome().is_some() {
                break;
            }
        }

        if self.outcome().is_none() {
            self.phase = BattlePhase::AwaitingOrders;
            tracing::debug!(
                checkpoint = self.checkpoint,
                tick = self.time.tick,
                "checkpoint reached"
            );
            self.pending.push(PendingEvent::new(EventPayload::CheckpointReached {
                checkpoint: self.checkpoint,
            }));
            self.flush()?;
        }

        Ok(CheckpointReport {
            checkpoint: self.checkpoint,
            ticks_run,
            events_appended: self.events.len() - start_len,
            phase: self.phase,
        })
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Checkpoints run so far.
    pub fn checkpoint(&self) -> u32 {
        self.checkpoint
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn ships(&self) -> &[ShipState] {
        &self.ships
    }

    pub fn ship(&self, id: ShipId) -> Option<&ShipState> {
        self.ships.get(id.index())
    }

    pub fn events(&self) -> &[CombatEvent] {
        self.events.as_slice()
    }

    /// Events with sequence number `>= seq`.
    pub fn events_since(&self, seq: u64) -> &[CombatEvent] {
        self.events.since(seq)
    }

    /// Sampled state trace.
    pub fn snapshots(&self) -> &[BattleSnapshot] {
        &self.snapshots
    }

    /// Current state, built on demand.
    pub fn snapshot(&self) -> BattleSnapshot {
        systems::snapshot::build_snapshot(&self.world, &self.ships, &self.catalog, &self.time)
    }

    /// Get a read-only reference to the projectile world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fold submitted orders into every ship's standing orders.
    fn intake_orders(&mut self) {
        self.draw_offers.clear();

        for index in 0..self.ships.len() {
            let id = self.ships[index].id;
            let submitted = self.submitted.remove(&id);
            if !self.ships[index].in_action() {
                self.ships[index].orders = OrderSet::default();
                continue;
            }
            let mut orders = match submitted {
                Some(orders) => orders,
                None => {
                    self.pending
                        .push(PendingEvent::new(EventPayload::OrdersMissing).on(id));
                    OrderSet::default()
                }
            };

            let side = self.ships[index].side;
            let ships = &self.ships;
            let issues = orders.sanitize(|target| {
                ships
                    .get(target.index())
                    .is_some_and(|t| t.side != side && t.in_action())
            });
            for issue in issues {
                tracing::warn!(ship = %id, ?issue, "order degraded to default");
                self.pending
                    .push(PendingEvent::new(EventPayload::OrderDefaulted { issue }).on(id));
            }

            let ship = &mut self.ships[index];
            if orders.radiators_extended != ship.thermal.radiators_extended {
                ship.thermal.radiators_extended = orders.radiators_extended;
                let payload = if orders.radiators_extended {
                    EventPayload::RadiatorsExtended
                } else {
                    EventPayload::RadiatorsRetracted
                };
                self.pending.push(PendingEvent::new(payload).by(id));
            }
            if orders.maneuver != ship.orders.maneuver || orders.throttle != ship.orders.throttle {
                self.pending.push(
                    PendingEvent::new(EventPayload::ManeuverChanged {
                        kind: orders.maneuver,
                        throttle: orders.throttle,
                    })
                    .by(id),
                );
            }
            if orders.surrender && self.surrendered.insert(side) {
                tracing::info!(ship = %id, ?side, "surrender");
                self.pending
                    .push(PendingEvent::new(EventPayload::Surrendered { side }).by(id));
            }
            if orders.propose_draw && self.draw_offers.insert(side) {
                self.pending
                    .push(PendingEvent::new(EventPayload::DrawProposed { side }).by(id));
            }
            ship.orders = orders;
        }
    }

    /// Advance the battle by one tick.
    fn tick(&mut self) -> Result<()> {
        self.prev_positions.clear();
        self.prev_positions
            .extend(self.ships.iter().map(|s| s.body.position));
        self.time.advance();
        let tick = self.time.tick;
        let elapsed = self.time.elapsed_secs;
        let dt = DT;

        self.phase = BattlePhase::PhysicsAdvancing;
        // 1. Maneuver control
        systems::maneuver::run(&self.ships, elapsed, &self.config, dt, &mut self.commands);
        // 2. Ship physics, then drive and reactor heat
        systems::physics::run(&mut self.ships, &self.commands, tick, dt, &mut self.pending)?;
        systems::thermal::accrue_operating_heat(&mut self.ships, dt);
        // 3. Torpedo guidance
        systems::torpedo::run(&mut self.world, &self.ships, &self.catalog, dt, &mut self.pending);
        // 4. Projectile motion
        systems::physics::advance_projectiles(&mut self.world, dt);
        // 5. Fire control
        let mut armory = Armory {
            world: &mut self.world,
            catalog: &self.catalog,
            config: &self.config,
            rng: &mut self.rng,
            next_projectile_id: &mut self.next_projectile_id,
            events: &mut self.pending,
        };
        systems::fire_control::run(&mut self.ships, &mut armory, dt);
        // 6. Point defense
        let laser_shots = systems::point_defense::run(
            &mut self.world,
            &mut self.ships,
            &self.catalog,
            &self.config,
            dt,
            &mut self.pending,
            &mut self.despawn_buffer,
        );

        // 7. Impact detection and resolution
        self.phase = BattlePhase::ImpactResolution;
        systems::impact::run(
            &mut self.world,
            &mut self.ships,
            &self.prev_positions,
            &laser_shots,
            &self.catalog,
            &self.config,
            &mut self.rng,
            &mut self.pending,
            &mut self.despawn_buffer,
        );

        // 8. Thermal update
        self.phase = BattlePhase::ThermalUpdate;
        systems::thermal::run(&mut self.ships, &self.config, dt, &mut self.pending);

        // 9. Victory check
        self.phase = BattlePhase::VictoryCheck;
        let outcome = systems::victory::evaluate(
            &self.ships,
            &self.surrendered,
            &self.draw_offers,
            elapsed,
            &self.config,
        );

        // 10. Cleanup
        systems::cleanup::run(
            &mut self.world,
            &self.ships,
            &self.catalog,
            &mut self.pending,
            &mut self.despawn_buffer,
        );

        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
        self.flush()?;

        // 11. Snapshot sampling
        if tick % self.config.ticks_per_snapshot() == 0 || self.outcome().is_some() {
            self.record_snapshot();
        }
        Ok(())
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        let destroyed = self
            .ships
            .iter()
            .filter(|s| s.status == ShipStatus::Destroyed)
            .count();
        tracing::info!(
            tick = self.time.tick,
            ?outcome,
            destroyed,
            "battle ended"
        );
        self.phase = BattlePhase::Ended(outcome);
        self.pending
            .push(PendingEvent::new(EventPayload::BattleEnded { outcome }));
    }

    /// Stamp staged events into the log at the current time.
    fn flush(&mut self) -> Result<()> {
        let now = self.time.elapsed_secs;
        if !self.pending.is_empty() && now < self.events.last_time() {
            return Err(EngineFault::TimeRegression {
                last: self.events.last_time(),
                next: now,
            }
            .into());
        }
        for event in self.pending.drain(..) {
            self.events.push(self.time.tick, now, event);
        }
        Ok(())
    }

    fn record_snapshot(&mut self) {
        if self
            .snapshots
            .last()
            .is_some_and(|last| last.tick == self.time.tick)
        {
            return;
        }
        let snapshot = self.snapshot();
        self.snapshots.push(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario;

    fn duel_engine() -> BattleEngine {
        let duel = scenario::duel();
        BattleEngine::new(Arc::new(Catalog::standard()), duel.config, duel.setup).unwrap()
    }

    #[test]
    fn test_flush_stamps_in_staging_order() {
        let mut engine = duel_engine();
        let first_seq = engine.events().len() as u64;
        for _ in 0..5 {
            engine.time.advance();
        }
        engine
            .pending
            .push(PendingEvent::new(EventPayload::OrdersMissing).on(ShipId(1)));
        engine
            .pending
            .push(PendingEvent::new(EventPayload::OrdersMissing).on(ShipId(0)));
        engine.flush().unwrap();

        assert!(engine.pending.is_empty());
        let stamped = engine.events_since(first_seq);
        assert_eq!(stamped.len(), 2);
        assert_eq!(stamped[0].seq, first_seq);
        assert_eq!(stamped[1].seq, first_seq + 1);
        assert_eq!(stamped[0].target, Some(ShipId(1).into()), "Staging order is kept");
        assert_eq!(stamped[1].target, Some(ShipId(0).into()));
        for event in stamped {
            assert_eq!(event.tick, 5);
            assert!((event.time_s - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_flush_rejects_time_regression() {
        let mut engine = duel_engine();
        for _ in 0..10 {
            engine.time.advance();
        }
        engine
            .pending
            .push(PendingEvent::new(EventPayload::OrdersMissing).on(ShipId(0)));
        engine.flush().unwrap();
        let logged = engine.events().len();

        engine.time = SimTime {
            tick: 3,
            elapsed_secs: 0.3,
        };
        engine
            .pending
            .push(PendingEvent::new(EventPayload::OrdersMissing).on(ShipId(1)));
        let err = engine.flush().unwrap_err();
        assert!(
            matches!(err, CombatError::Fault(EngineFault::TimeRegression { .. })),
            "Unexpected error: {err}"
        );
        assert_eq!(engine.events().len(), logged, "Nothing stamped out of order");
    }

    #[test]
    fn test_negative_mass_halts_checkpoint() {
        let mut engine = duel_engine();
        engine.ships[0].mass.propellant_kg = -1.0;
        let err = engine.run_checkpoint().unwrap_err();
        assert!(
            matches!(
                err,
                CombatError::Fault(EngineFault::NegativeMass { tick: 1, ship: ShipId(0), .. })
            ),
            "Unexpected error: {err}"
        );
        assert!(engine.outcome().is_none(), "An engine fault is not a combat outcome");
    }
}
