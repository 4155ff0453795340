use crate::api::wire::{EventConfigWire, EventWire, FeatureWire, TimeWindowWire, WifiWire};
use crate::cache::{EntityKind, EventConfigRow, EventRow, StoredRow};
use crate::models::{Event, EventConfig, Feature, FeatureKind, LocalizedText, TimeWindow, WifiNetwork};

use super::{parse_instant, unexpected, MapperError};

// ===== Event list =====

pub fn event_from_wire(wire: EventWire) -> Event {
    Event {
        id: wire.id,
        name: wire.name,
        logo_url: wire.logo_url,
        is_logo_tinted: wire.logo_tinted,
    }
}

pub fn event_to_row(event: &Event) -> StoredRow {
    StoredRow::Event(EventRow {
        id: event.id.clone(),
        name_en: event.name.en.clone(),
        name_zh: event.name.zh.clone(),
        logo_url: event.logo_url.clone(),
        is_logo_tinted: event.is_logo_tinted,
    })
}

pub fn event_from_row(row: StoredRow) -> Result<Event, MapperError> {
    match row {
        StoredRow::Event(row) => Ok(Event {
            id: row.id,
            name: LocalizedText::new(row.name_en, row.name_zh),
            logo_url: row.logo_url,
            is_logo_tinted: row.is_logo_tinted,
        }),
        other => Err(unexpected(EntityKind::Event, &other)),
    }
}

pub fn events_from_rows(rows: Vec<StoredRow>) -> Result<Vec<Event>, MapperError> {
    rows.into_iter().map(event_from_row).collect()
}

// ===== Features =====

fn feature_from_record(record: FeatureWire) -> Feature {
    let networks = record
        .wifi
        .unwrap_or_default()
        .into_iter()
        .map(|w| WifiNetwork {
            ssid: w.ssid,
            password: w.password,
        })
        .collect();

    Feature {
        kind: FeatureKind::from_name(&record.feature, networks),
        label: record.display_text,
        icon: record.icon,
        url: record.url,
        visible_roles: record.visible_roles,
    }
}

fn feature_to_record(feature: &Feature) -> FeatureWire {
    let wifi = match &feature.kind {
        FeatureKind::Wifi { networks } => Some(
            networks
                .iter()
                .map(|n| WifiWire {
                    ssid: n.ssid.clone(),
                    password: n.password.clone(),
                })
                .collect(),
        ),
        _ => None,
    };

    FeatureWire {
        feature: feature.kind.name().to_string(),
        display_text: feature.label.clone(),
        icon: feature.icon.clone(),
        url: feature.url.clone(),
        visible_roles: feature.visible_roles.clone(),
        wifi,
    }
}

// ===== Event config =====

fn window_from_wire(field: &'static str, wire: Option<TimeWindowWire>) -> Result<Option<TimeWindow>, MapperError> {
    wire.map(|w| {
        Ok(TimeWindow {
            start: parse_instant(field, &w.start)?,
            end: parse_instant(field, &w.end)?,
        })
    })
    .transpose()
}

fn window_from_columns(
    field: &'static str,
    start: Option<String>,
    end: Option<String>,
) -> Result<Option<TimeWindow>, MapperError> {
    match (start, end) {
        (Some(start), Some(end)) => window_from_wire(field, Some(TimeWindowWire { start, end })),
        (None, None) => Ok(None),
        _ => Err(MapperError::IncompleteWindow(field)),
    }
}

fn window_to_columns(window: Option<TimeWindow>) -> (Option<String>, Option<String>) {
    match window {
        Some(w) => (Some(w.start.to_rfc3339()), Some(w.end.to_rfc3339())),
        None => (None, None),
    }
}

pub fn config_from_wire(wire: EventConfigWire) -> Result<EventConfig, MapperError> {
    Ok(EventConfig {
        id: wire.id,
        name: wire.name,
        logo_url: wire.logo_url,
        date_range: window_from_wire("event_date", wire.date)?,
        website: wire.website,
        features: wire.features.into_iter().map(feature_from_record).collect(),
        publish_window: window_from_wire("publish", wire.publish)?,
    })
}

pub fn config_to_row(config: &EventConfig) -> Result<StoredRow, MapperError> {
    let records: Vec<FeatureWire> = config.features.iter().map(feature_to_record).collect();
    let features = serde_json::to_string(&records).map_err(|source| MapperError::InvalidColumn {
        column: "features",
        source,
    })?;
    let (date_start, date_end) = window_to_columns(config.date_range);
    let (publish_start, publish_end) = window_to_columns(config.publish_window);

    Ok(StoredRow::EventConfig(EventConfigRow {
        id: config.id.clone(),
        name_en: config.name.en.clone(),
        name_zh: config.name.zh.clone(),
        logo_url: config.logo_url.clone(),
        date_start,
        date_end,
        website: config.website.clone(),
        publish_start,
        publish_end,
        features,
    }))
}

pub fn config_from_row(row: StoredRow) -> Result<EventConfig, MapperError> {
    let row = match row {
        StoredRow::EventConfig(row) => row,
        other => return Err(unexpected(EntityKind::EventConfig, &other)),
    };

    let records: Vec<FeatureWire> = serde_json::from_str(&row.features)
        .map_err(|source| MapperError::InvalidColumn {
            column: "features",
            source,
        })?;

    Ok(EventConfig {
        id: row.id,
        name: LocalizedText::new(row.name_en, row.name_zh),
        logo_url: row.logo_url,
        date_range: window_from_columns("event_date", row.date_start, row.date_end)?,
        website: row.website,
        features: records.into_iter().map(feature_from_record).collect(),
        publish_window: window_from_columns("publish", row.publish_start, row.publish_end)?,
    })
}
