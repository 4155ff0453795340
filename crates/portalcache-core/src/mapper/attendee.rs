use crate::api::wire::{AttendeeWire, ScenarioWire};
use crate::models::{Attendee, Scenario};

fn scenario_from_wire(wire: ScenarioWire) -> Scenario {
    Scenario {
        id: wire.id,
        order: wire.order,
        label: wire.display_text,
        available_time: wire.available_time,
        expire_time: wire.expire_time,
        used: wire.used,
        disabled: wire.disabled.filter(|reason| !reason.trim().is_empty()),
        attributes: wire.attr,
    }
}

/// Attendees are never stored, so there is no row form. Scenarios are
/// ordered by their `order` field.
pub fn attendee_from_wire(wire: AttendeeWire) -> Attendee {
    let mut scenarios: Vec<Scenario> = wire.scenarios.into_iter().map(scenario_from_wire).collect();
    scenarios.sort_by_key(|s| s.order);

    Attendee {
        event_id: wire.event_id,
        token: wire.token,
        user_id: wire.user_id.map(|id| id.canonical()).unwrap_or_default(),
        role: wire.role,
        first_use_timestamp: wire.first_use.unwrap_or(0),
        scenarios,
    }
}
