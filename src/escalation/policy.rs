use serde::Deserialize;

use crate::entities::alert::{AlarmLayer, TimeSlot};

/// Per-layer enable flags for one time slot. An unset flag falls back to the
/// default table below, so overrides stay sparse.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LayerFlags {
    #[serde(default)]
    pub layer1: Option<bool>,
    #[serde(default)]
    pub layer2: Option<bool>,
    #[serde(default)]
    pub layer3: Option<bool>,
}

impl LayerFlags {
    fn get(&self, layer: AlarmLayer) -> Option<bool> {
        match layer {
            AlarmLayer::Layer1 => self.layer1,
            AlarmLayer::Layer2 => self.layer2,
            AlarmLayer::Layer3 => self.layer3,
        }
    }
}

/// Sparse per-customer escalation overrides, stored as JSON on the customer
/// row. A missing slot key means "use the defaults for that slot".
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationOverrides {
    #[serde(default)]
    pub open_hours: Option<LayerFlags>,
    #[serde(default)]
    pub after_hours: Option<LayerFlags>,
    #[serde(default)]
    pub night: Option<LayerFlags>,
}

impl EscalationOverrides {
    /// Parse the customer's stored override JSON. Malformed JSON is treated
    /// as "no overrides" so one bad record cannot stall escalation.
    pub fn of(customer: &crate::entities::customer::Model) -> Option<Self> {
        let raw = customer.escalation_config.as_ref()?;
        match serde_json::from_value(raw.clone()) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!("Invalid escalation_config for customer {}: {}", customer.id, e);
                None
            }
        }
    }

    fn slot(&self, slot: TimeSlot) -> Option<&LayerFlags> {
        match slot {
            TimeSlot::OpenHours => self.open_hours.as_ref(),
            TimeSlot::AfterHours => self.after_hours.as_ref(),
            TimeSlot::Night => self.night.as_ref(),
        }
    }
}

/// Default layer-enable table:
///
/// | Slot        | Layer1 | Layer2 | Layer3 |
/// |-------------|--------|--------|--------|
/// | OPEN_HOURS  | on     | on     | on     |
/// | AFTER_HOURS | off    | on     | on     |
/// | NIGHT       | off    | off    | on     |
fn default_enabled(slot: TimeSlot, layer: AlarmLayer) -> bool {
    match (slot, layer) {
        (TimeSlot::OpenHours, _) => true,
        (TimeSlot::AfterHours, AlarmLayer::Layer1) => false,
        (TimeSlot::AfterHours, _) => true,
        (TimeSlot::Night, AlarmLayer::Layer3) => true,
        (TimeSlot::Night, _) => false,
    }
}

pub fn is_layer_enabled(
    slot: TimeSlot,
    layer: AlarmLayer,
    overrides: Option<&EscalationOverrides>,
) -> bool {
    overrides
        .and_then(|o| o.slot(slot))
        .and_then(|flags| flags.get(layer))
        .unwrap_or_else(|| default_enabled(slot, layer))
}

/// First enabled layer in order 1 -> 2 -> 3 for the resolved slot, so a
/// NIGHT-created alert enters directly at LAYER_3. Falls back to LAYER_3 if a
/// customer disabled every layer for the slot: someone always gets called.
pub fn initial_layer_for(slot: TimeSlot, overrides: Option<&EscalationOverrides>) -> AlarmLayer {
    for layer in [AlarmLayer::Layer1, AlarmLayer::Layer2, AlarmLayer::Layer3] {
        if is_layer_enabled(slot, layer, overrides) {
            return layer;
        }
    }
    AlarmLayer::Layer3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_policy() {
        use AlarmLayer::*;
        use TimeSlot::*;

        assert!(is_layer_enabled(OpenHours, Layer1, None));
        assert!(is_layer_enabled(OpenHours, Layer2, None));
        assert!(is_layer_enabled(OpenHours, Layer3, None));

        assert!(!is_layer_enabled(AfterHours, Layer1, None));
        assert!(is_layer_enabled(AfterHours, Layer2, None));
        assert!(is_layer_enabled(AfterHours, Layer3, None));

        assert!(!is_layer_enabled(Night, Layer1, None));
        assert!(!is_layer_enabled(Night, Layer2, None));
        assert!(is_layer_enabled(Night, Layer3, None));
    }

    #[test]
    fn initial_layer_skips_disabled_layers() {
        assert_eq!(initial_layer_for(TimeSlot::OpenHours, None), AlarmLayer::Layer1);
        assert_eq!(initial_layer_for(TimeSlot::AfterHours, None), AlarmLayer::Layer2);
        assert_eq!(initial_layer_for(TimeSlot::Night, None), AlarmLayer::Layer3);
    }

    #[test]
    fn override_can_re_enable_a_normally_off_layer() {
        let overrides: EscalationOverrides = serde_json::from_value(serde_json::json!({
            "night": { "layer1": true }
        }))
        .unwrap();

        assert!(is_layer_enabled(TimeSlot::Night, AlarmLayer::Layer1, Some(&overrides)));
        // unset flags keep their slot defaults
        assert!(!is_layer_enabled(TimeSlot::Night, AlarmLayer::Layer2, Some(&overrides)));
        assert!(is_layer_enabled(TimeSlot::Night, AlarmLayer::Layer3, Some(&overrides)));
        assert_eq!(
            initial_layer_for(TimeSlot::Night, Some(&overrides)),
            AlarmLayer::Layer1
        );
    }

    #[test]
    fn override_can_disable_a_layer() {
        let overrides: EscalationOverrides = serde_json::from_value(serde_json::json!({
            "openHours": { "layer2": false }
        }))
        .unwrap();

        assert!(!is_layer_enabled(TimeSlot::OpenHours, AlarmLayer::Layer2, Some(&overrides)));
        // other slots untouched
        assert!(is_layer_enabled(TimeSlot::AfterHours, AlarmLayer::Layer2, Some(&overrides)));
    }

    #[test]
    fn all_layers_disabled_still_yields_layer3() {
        let overrides: EscalationOverrides = serde_json::from_value(serde_json::json!({
            "openHours": { "layer1": false, "layer2": false, "layer3": false }
        }))
        .unwrap();

        assert_eq!(
            initial_layer_for(TimeSlot::OpenHours, Some(&overrides)),
            AlarmLayer::Layer3
        );
    }
}
