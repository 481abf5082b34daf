//! Shared filter-bank planning for bxCAN controllers.
//!
//! All controllers share one table of filter banks and each has two receive
//! FIFOs. The first controller owns bank 0 and configures the table; the
//! second starts at the secondary start bank and reuses that table through
//! its own handle. With two controllers they listen on different FIFOs.
//! From the third controller on, the first two share FIFO 0 and every
//! further controller takes FIFO 1 on its own bank above the extra-bank base.

use crate::error::PlanError;
use crate::plan::{handle_name, number_callbacks, Assignment, DispatchEntry, IrqDirective};

/// Filter banks in the shared table.
pub const CAN_FILTER_BANKS: u32 = 28;
/// First bank owned by the secondary controller.
pub const CAN_SECONDARY_START_BANK: u32 = 14;
/// First bank handed to controllers beyond the second.
pub const CAN_EXTRA_BANK_BASE: u32 = 15;

pub(crate) fn plan(instances: &[String]) -> Result<Vec<Assignment>, PlanError> {
    let mut entries = Vec::with_capacity(instances.len());
    for (i, instance) in instances.iter().enumerate() {
        let (slot, bank) = match (instances.len(), i) {
            (_, 0) => (0, 0),
            (2, 1) => (1, CAN_SECONDARY_START_BANK),
            (_, 1) => (0, CAN_SECONDARY_START_BANK),
            (_, n) => (1, CAN_EXTRA_BANK_BASE + (n as u32 - 2)),
        };
        if bank >= CAN_FILTER_BANKS {
            return Err(PlanError::BankExhausted {
                instance: instance.clone(),
                bank,
                available: CAN_FILTER_BANKS,
            });
        }
        entries.push(assignment(instance, slot, bank, i == 0));
    }
    number_callbacks(&mut entries);
    Ok(entries)
}

fn assignment(instance: &str, slot: u32, bank: u32, configures: bool) -> Assignment {
    let handle = handle_name(instance);
    Assignment {
        instance: instance.to_string(),
        irq: Some(IrqDirective {
            vector: format!("{instance}_RX{slot}_IRQn"),
            activation: format!(
                "HAL_CAN_ActivateNotification(&{handle}, CAN_IT_RX_FIFO{slot}_MSG_PENDING);"
            ),
        }),
        dispatch: Some(DispatchEntry {
            instance: instance.to_string(),
            slot,
            callback: format!("HAL_CAN_RxFifo{slot}MsgPendingCallback"),
            ordinal: 0,
        }),
        handle,
        slot,
        bank,
        configures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannerKind;

    fn can(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("CAN{i}")).collect()
    }

    fn pairs(entries: &[Assignment]) -> Vec<(u32, u32)> {
        entries.iter().map(|e| (e.slot, e.bank)).collect()
    }

    #[test]
    fn single_controller() {
        let entries = plan(&can(1)).unwrap();
        assert_eq!(pairs(&entries), vec![(0, 0)]);
        assert!(entries[0].configures);
        assert_eq!(entries[0].handle, "hcan1");
        let irq = entries[0].irq.as_ref().unwrap();
        assert_eq!(irq.vector, "CAN1_RX0_IRQn");
        assert_eq!(
            irq.activation,
            "HAL_CAN_ActivateNotification(&hcan1, CAN_IT_RX_FIFO0_MSG_PENDING);"
        );
    }

    #[test]
    fn two_controllers_split_fifos() {
        let entries = plan(&can(2)).unwrap();
        assert_eq!(pairs(&entries), vec![(0, 0), (1, CAN_SECONDARY_START_BANK)]);
        assert!(entries[0].configures);
        assert!(!entries[1].configures);
        let d = entries[1].dispatch.as_ref().unwrap();
        assert_eq!(d.callback, "HAL_CAN_RxFifo1MsgPendingCallback");
        assert_eq!(d.ordinal, 0);
    }

    #[test]
    fn three_controllers() {
        let entries = plan(&can(3)).unwrap();
        assert_eq!(pairs(&entries), vec![(0, 0), (0, 14), (1, 15)]);
        // Two entries on FIFO 0 share one callback.
        let ordinals: Vec<(String, usize)> = entries
            .iter()
            .map(|e| {
                let d = e.dispatch.as_ref().unwrap();
                (d.callback.clone(), d.ordinal)
            })
            .collect();
        assert_eq!(
            ordinals,
            vec![
                ("HAL_CAN_RxFifo0MsgPendingCallback".to_string(), 0),
                ("HAL_CAN_RxFifo0MsgPendingCallback".to_string(), 1),
                ("HAL_CAN_RxFifo1MsgPendingCallback".to_string(), 0),
            ]
        );
    }

    #[test]
    fn extra_banks_increase_until_exhausted() {
        let max = (CAN_FILTER_BANKS - CAN_EXTRA_BANK_BASE) as usize + 2;
        let entries = plan(&can(max)).unwrap();
        assert_eq!(entries.last().unwrap().bank, CAN_FILTER_BANKS - 1);
        let banks: Vec<u32> = entries[2..].iter().map(|e| e.bank).collect();
        assert!(banks.windows(2).all(|w| w[1] == w[0] + 1));

        let err = plan(&can(max + 1)).unwrap_err();
        assert!(matches!(err, PlanError::BankExhausted { bank: 28, .. }));
    }

    #[test]
    fn resource_pairs_unique_for_all_counts() {
        for n in 1..=15 {
            let plan = PlannerKind::SharedFilterBank.plan("CAN", &can(n)).unwrap();
            assert!(plan.resources_unique(), "{n} controllers");
            assert_eq!(plan.entries.len(), n);
        }
    }
}
