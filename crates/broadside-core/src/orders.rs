//! Orders sent from the decision layer to the combat engine.
//!
//! Orders are folded into an `OrderSet` per ship per checkpoint. An order set
//! never carries over to the next checkpoint; a ship without one coasts under
//! MAINTAIN with weapons at HOLD_FIRE.

use serde::{Deserialize, Serialize};

use crate::enums::{FireMode, ManeuverKind};
use crate::types::{ShipId, Vec3};

/// A single order from a captain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Order {
    /// Set the maneuver directive.
    Maneuver {
        kind: ManeuverKind,
        #[serde(default)]
        throttle: f64,
        #[serde(default)]
        target: Option<ShipId>,
        #[serde(default)]
        heading: Option<Vec3>,
    },
    /// Set the weapons directive.
    Weapons {
        mode: FireMode,
        #[serde(default)]
        target: Option<ShipId>,
    },
    /// Extend or retract radiators.
    Radiators { extended: bool },
    /// Strike colors for this ship's side.
    Surrender,
    /// Offer a draw for this ship's side.
    ProposeDraw,
    /// Anything the decision layer sent that we do not understand.
    #[serde(other)]
    Unknown,
}

/// The complete directive for one ship for one checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSet {
    pub maneuver: ManeuverKind,
    /// Drive throttle, 0.0 to 1.0.
    pub throttle: f64,
    pub maneuver_target: Option<ShipId>,
    /// World-frame direction for HEADING.
    pub heading: Option<Vec3>,
    pub fire_mode: FireMode,
    pub weapons_target: Option<ShipId>,
    pub radiators_extended: bool,
    pub surrender: bool,
    pub propose_draw: bool,
}

impl Default for OrderSet {
    fn default() -> Self {
        Self {
            maneuver: ManeuverKind::Maintain,
            throttle: 0.0,
            maneuver_target: None,
            heading: None,
            fire_mode: FireMode::HoldFire,
            weapons_target: None,
            radiators_extended: false,
            surrender: false,
            propose_draw: false,
        }
    }
}

/// A field of an order set that had to be degraded to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderIssue {
    ThrottleNotFinite,
    ThrottleOutOfRange { requested: f64 },
    InvalidManeuverTarget { target: ShipId },
    InvalidWeaponsTarget { target: ShipId },
    MissingManeuverTarget { kind: ManeuverKind },
    InvalidHeading,
    UnknownManeuver,
    UnknownFireMode,
}

impl OrderSet {
    /// Fold a sequence of orders; later orders overwrite earlier ones.
    pub fn from_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut set = Self::default();
        for order in orders {
            set.apply(order);
        }
        set
    }

    /// Apply one order to this set.
    pub fn apply(&mut self, order: Order) {
        match order {
            Order::Maneuver {
                kind,
                throttle,
                target,
                heading,
            } => {
                self.maneuver = kind;
                self.throttle = throttle;
                self.maneuver_target = target;
                self.heading = heading;
            }
            Order::Weapons { mode, target } => {
                self.fire_mode = mode;
                self.weapons_target = target;
            }
            Order::Radiators { extended } => self.radiators_extended = extended,
            Order::Surrender => self.surrender = true,
            Order::ProposeDraw => self.propose_draw = true,
            Order::Unknown => {}
        }
    }

    /// Degrade invalid fields to their defaults and report what changed.
    ///
    /// `valid_target` answers whether a ship id is a live enemy of the
    /// ordering ship.
    pub fn sanitize(&mut self, valid_target: impl Fn(ShipId) -> bool) -> Vec<OrderIssue> {
        let mut issues = Vec::new();

        if self.maneuver == ManeuverKind::Unrecognized {
            issues.push(OrderIssue::UnknownManeuver);
            self.maneuver = ManeuverKind::Maintain;
        }
        if self.fire_mode == FireMode::Unrecognized {
            issues.push(OrderIssue::UnknownFireMode);
            self.fire_mode = FireMode::HoldFire;
        }

        if !self.throttle.is_finite() {
            issues.push(OrderIssue::ThrottleNotFinite);
            self.throttle = 0.0;
        } else if !(0.0..=1.0).contains(&self.throttle) {
            issues.push(OrderIssue::ThrottleOutOfRange {
                requested: self.throttle,
            });
            self.throttle = self.throttle.clamp(0.0, 1.0);
        }

        if let Some(target) = self.maneuver_target {
            if !valid_target(target) {
                issues.push(OrderIssue::InvalidManeuverTarget { target });
                self.maneuver_target = None;
            }
        }
        if let Some(target) = self.weapons_target {
            if !valid_target(target) {
                issues.push(OrderIssue::InvalidWeaponsTarget { target });
                self.weapons_target = None;
            }
        }

        match self.maneuver {
            ManeuverKind::Intercept | ManeuverKind::Padlock if self.maneuver_target.is_none() => {
                issues.push(OrderIssue::MissingManeuverTarget {
                    kind: self.maneuver,
                });
                self.maneuver = ManeuverKind::Maintain;
            }
            ManeuverKind::Heading => {
                let usable = self
                    .heading
                    .is_some_and(|h| h.is_finite() && h.length_squared() > 1e-12);
                if !usable {
                    issues.push(OrderIssue::InvalidHeading);
                    self.maneuver = ManeuverKind::Maintain;
                    self.heading = None;
                }
            }
            _ => {}
        }

        issues
    }
}
