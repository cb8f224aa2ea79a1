//! SETTINGS bookkeeping: one registry for the peer's advertised values
//! (ingress) and one for our own (egress).

use std::collections::BTreeMap;

use crate::frame::settings_id;

/// Mapping from settings identifier to value. Only explicitly set entries are
/// stored; lookups fall back to caller-supplied defaults. Iteration is in
/// identifier order, which keeps serialized SETTINGS frames deterministic.
#[derive(Debug, Clone, Default)]
pub struct SettingsRegistry {
    values: BTreeMap<u16, u32>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: u16, value: u32) {
        self.values.insert(id, value);
    }

    pub fn get(&self, id: u16) -> Option<u32> {
        self.values.get(&id).copied()
    }

    pub fn get_or(&self, id: u16, default: u32) -> u32 {
        self.get(id).unwrap_or(default)
    }

    /// Every explicitly set entry, in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
        self.values.iter().map(|(&id, &value)| (id, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validate a setting value received from the peer, per RFC 7540 Section
/// 6.5.2. Returns the HTTP/2 error code for a rejected value. Unknown
/// identifiers are always accepted.
pub fn validate_received(id: u16, value: u32) -> Result<(), u32> {
    use crate::frame::{error_code, MAX_FRAME_PAYLOAD, MAX_WINDOW_SIZE, MIN_MAX_FRAME_SIZE};
    match id {
        settings_id::ENABLE_PUSH if value > 1 => Err(error_code::PROTOCOL_ERROR),
        settings_id::INITIAL_WINDOW_SIZE if value > MAX_WINDOW_SIZE => {
            Err(error_code::PROTOCOL_ERROR)
        }
        settings_id::MAX_FRAME_SIZE
            if !(MIN_MAX_FRAME_SIZE..=MAX_FRAME_PAYLOAD).contains(&value) =>
        {
            Err(error_code::PROTOCOL_ERROR)
        }
        _ => Ok(()),
    }
}
