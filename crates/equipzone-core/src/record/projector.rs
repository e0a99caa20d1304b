//! Device <-> record set projection
//!
//! A device's descriptive state is published at its name as:
//!
//! | Record | Content                                   |
//! |--------|-------------------------------------------|
//! | OPT    | larger message size advertisement only    |
//! | TXT    | place, as one opaque character-string     |
//! | HINFO  | model (cpu) and code (os)                 |
//! | LOC    | position with default size and precisions |
//!
//! Projection is pure; nothing here touches the network.

use super::{Record, RecordData, DEFAULT_UDP_PAYLOAD_SIZE};
use crate::device::Device;
use crate::geo::Loc;

/// Maps devices to the records describing them
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordProjector {
    ttl: u32,
}

impl RecordProjector {
    /// Projector stamping `ttl` on every produced record
    pub fn new(ttl: u32) -> Self {
        Self { ttl }
    }

    /// Extension record advertising larger message support
    pub fn extension(&self) -> Record {
        Record {
            name: ".".to_string(),
            ttl: 0,
            data: RecordData::Extension {
                udp_payload_size: DEFAULT_UDP_PAYLOAD_SIZE,
            },
        }
    }

    /// Place description
    ///
    /// The place is kept whole rather than split on spaces so that it
    /// survives a publish/transfer cycle unchanged.
    pub fn text(&self, device: &Device) -> Record {
        Record::new(&device.name, self.ttl, RecordData::Text(vec![device.place.clone()]))
    }

    /// Model and code
    pub fn classification(&self, device: &Device) -> Record {
        Record::new(
            &device.name,
            self.ttl,
            RecordData::Classification {
                model: device.model.clone(),
                code: device.code.clone(),
            },
        )
    }

    /// Position with default size and precisions
    pub fn location(&self, device: &Device) -> Record {
        Record::new(
            &device.name,
            self.ttl,
            RecordData::Location(Loc::from_position(device.position())),
        )
    }

    /// Full descriptive record set for a device
    pub fn project(&self, device: &Device) -> Vec<Record> {
        vec![
            self.extension(),
            self.text(device),
            self.classification(device),
            self.location(device),
        ]
    }

    /// Rebuild a device from the answers of individual lookups
    ///
    /// Returns `None` when no address record is present.
    pub fn decode(&self, records: &[Record]) -> Option<Device> {
        let mut device = records.iter().find_map(|r| match r.data {
            RecordData::Address(ip) => Some(Device::new(r.name.clone(), ip)),
            _ => None,
        })?;

        for record in records {
            apply_description(&mut device, &record.data);
        }

        Some(device)
    }
}

/// Copy descriptive content (place, model/code, position) into a device.
///
/// Returns whether the payload was descriptive.
pub(crate) fn apply_description(device: &mut Device, data: &RecordData) -> bool {
    match data {
        RecordData::Text(strings) => {
            device.place = strings.join(" ");
            true
        }
        RecordData::Classification { model, code } => {
            device.model = model.clone();
            device.code = code.clone();
            true
        }
        RecordData::Location(loc) => {
            device.set_location(loc.latitude, loc.longitude, loc.altitude);
            true
        }
        RecordData::Address(_)
        | RecordData::Pointer(_)
        | RecordData::Alias(_)
        | RecordData::Extension { .. }
        | RecordData::Unsupported { .. } => false,
    }
}
