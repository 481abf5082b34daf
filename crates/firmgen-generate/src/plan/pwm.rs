//! Timer PWM channel planning: slot is the channel, bank is the timer.

use crate::error::PlanError;
use crate::plan::{handle_name, Assignment, IrqDirective};

const FAMILY: &str = "PWM";

pub(crate) fn plan(instances: &[String]) -> Result<Vec<Assignment>, PlanError> {
    let mut entries: Vec<Assignment> = Vec::with_capacity(instances.len());
    for instance in instances {
        let (timer, channel) = parse_channel(instance).ok_or_else(|| PlanError::InvalidInstance {
            family: FAMILY.to_string(),
            instance: instance.clone(),
        })?;
        if entries.iter().any(|e| e.bank == timer && e.slot == channel) {
            return Err(PlanError::DuplicateChannel {
                instance: instance.clone(),
            });
        }
        let handle = handle_name(&format!("TIM{timer}"));
        entries.push(Assignment {
            instance: instance.clone(),
            irq: Some(IrqDirective {
                vector: format!("TIM{timer}_IRQn"),
                activation: format!("HAL_TIM_PWM_Start(&{handle}, TIM_CHANNEL_{channel});"),
            }),
            dispatch: None,
            handle,
            slot: channel,
            bank: timer,
            configures: false,
        });
    }
    Ok(entries)
}

/// `TIM3_CH2` -> (3, 2).
fn parse_channel(instance: &str) -> Option<(u32, u32)> {
    let (timer, channel) = instance.strip_prefix("TIM")?.split_once("_CH")?;
    let timer = timer.parse().ok()?;
    let channel = channel.parse().ok()?;
    (1..=6).contains(&channel).then_some((timer, channel))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn slot_is_channel_bank_is_timer() {
        let entries = plan(&channels(&["TIM2_CH1", "TIM2_CH3", "TIM3_CH1"])).unwrap();
        let pairs: Vec<(u32, u32)> = entries.iter().map(|e| (e.slot, e.bank)).collect();
        assert_eq!(pairs, vec![(1, 2), (3, 2), (1, 3)]);
        assert_eq!(entries[0].handle, "htim2");
        assert_eq!(
            entries[1].irq.as_ref().unwrap().activation,
            "HAL_TIM_PWM_Start(&htim2, TIM_CHANNEL_3);"
        );
    }

    #[test]
    fn duplicate_channel_rejected() {
        let err = plan(&channels(&["TIM1_CH1", "TIM1_CH1"])).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateChannel { .. }));
    }

    #[test]
    fn invalid_names_rejected() {
        for bad in ["TIM1", "TIMx_CH1", "TIM1_CH9", "CAN1"] {
            assert!(
                matches!(plan(&channels(&[bad])).unwrap_err(), PlanError::InvalidInstance { .. }),
                "{bad}"
            );
        }
    }
}
