//! Property tests for nonce assignment and the operation status machine.

#![allow(clippy::unwrap_used)]

use blockdag_orchestrator::application::services::AccountNonce;
use blockdag_orchestrator::domain::entities::{ContractRef, PendingOperation};
use blockdag_orchestrator::domain::errors::ErrorKind;
use blockdag_orchestrator::domain::value_objects::{
    ContractName, OperationId, Receipt, TxStatus, UnsignedTransaction,
};
use ethers::types::{Address, Bytes, H256, U256};
use proptest::prelude::*;

const ALL_STATUSES: [TxStatus; 5] = [
    TxStatus::Built,
    TxStatus::Submitted,
    TxStatus::Confirmed,
    TxStatus::Failed,
    TxStatus::TimedOut,
];

// ============================================================================
// Nonce Assignment
// ============================================================================

proptest! {
    /// Nonces accepted by the node are strictly increasing, whatever the
    /// builder asked for and whichever broadcasts were rejected.
    #[test]
    fn accepted_nonces_strictly_increase(
        attempts in prop::collection::vec((0u64..50, any::<bool>()), 1..64)
    ) {
        let mut account = AccountNonce::default();
        let mut accepted: Vec<U256> = Vec::new();

        for (requested, broadcast_ok) in attempts {
            let nonce = account.assign(U256::from(requested));
            prop_assert!(nonce >= U256::from(requested));
            if let Some(last) = accepted.last() {
                prop_assert!(nonce > *last);
            }
            if broadcast_ok {
                account.advance_past(nonce);
                accepted.push(nonce);
            }
        }

        prop_assert!(accepted.windows(2).all(|w| w[0] < w[1]));
    }

    /// Consecutive submissions that all start from the node's view leave
    /// no gaps.
    #[test]
    fn sequential_successes_leave_no_gaps(start in 0u64..1_000, count in 1usize..32) {
        let mut account = AccountNonce::default();
        let mut used = Vec::with_capacity(count);
        for _ in 0..count {
            let nonce = account.assign(U256::from(start));
            account.advance_past(nonce);
            used.push(nonce);
        }
        let expected: Vec<U256> = (0..count as u64).map(|i| U256::from(start + i)).collect();
        prop_assert_eq!(used, expected);
    }

    /// Reporting an older nonce never moves the tracker backwards.
    #[test]
    fn tracker_is_monotonic(used in prop::collection::vec(0u64..100, 1..32)) {
        let mut account = AccountNonce::default();
        let mut high = None;
        for nonce in used {
            account.advance_past(U256::from(nonce));
            let next = account.next().unwrap();
            if let Some(previous) = high {
                prop_assert!(next >= previous);
            }
            high = Some(next);
        }
    }
}

// ============================================================================
// Status Machine
// ============================================================================

#[derive(Debug, Clone)]
enum Event {
    Submit,
    Receipt(bool),
    TimeOut,
    Resubmit,
    Fail,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Submit),
        any::<bool>().prop_map(Event::Receipt),
        Just(Event::TimeOut),
        Just(Event::Resubmit),
        Just(Event::Fail),
    ]
}

fn built() -> PendingOperation {
    let tx = UnsignedTransaction {
        from: Address::repeat_byte(0xaa),
        to: Address::repeat_byte(0xbb),
        data: Bytes::default(),
        value: U256::zero(),
        gas_limit: U256::from(150_000u64),
        gas_price: U256::from(1_000_000_000u64),
        nonce: U256::from(7u64),
        chain_id: 1043,
    };
    let contract = ContractRef {
        name: ContractName::new("token"),
        address: Address::repeat_byte(0xbb),
    };
    PendingOperation::new(OperationId::new("prop"), contract, "mine", vec![], tx)
}

fn apply(op: &mut PendingOperation, event: &Event, step: u64) {
    let hash = H256::from_low_u64_be(step + 1);
    // Illegal events are expected to be refused; only the state matters.
    let _ = match event {
        Event::Submit => op.mark_submitted(op.nonce(), hash),
        Event::Receipt(success) => op.apply_receipt(&Receipt {
            tx_hash: op.submitted_hash().unwrap_or(hash),
            success: *success,
            block_number: Some(step),
            gas_used: Some(U256::from(21_000u64)),
        }),
        Event::TimeOut => op.mark_timed_out(),
        Event::Resubmit => op.mark_resubmitted(op.gas_price() * U256::from(2u64), hash),
        Event::Fail => op.mark_failed(ErrorKind::SubmissionRejected, "rejected"),
    };
}

proptest! {
    /// Confirmed and failed operations never change status again.
    #[test]
    fn terminal_states_are_final(events in prop::collection::vec(event(), 0..40)) {
        let mut op = built();
        let mut terminal: Option<TxStatus> = None;

        for (step, event) in events.iter().enumerate() {
            apply(&mut op, event, step as u64);
            match terminal {
                Some(status) => prop_assert_eq!(op.status(), status),
                None if op.status().is_terminal() => terminal = Some(op.status()),
                None => {}
            }
        }
    }

    /// Every observed change of status is a legal transition.
    #[test]
    fn observed_transitions_are_legal(events in prop::collection::vec(event(), 0..40)) {
        let mut op = built();
        for (step, event) in events.iter().enumerate() {
            let before = op.status();
            apply(&mut op, event, step as u64);
            let after = op.status();
            if before != after {
                prop_assert!(before.can_transition_to(after), "{} -> {}", before, after);
            }
        }
    }
}

#[test]
fn terminal_statuses_have_no_successors() {
    for from in [TxStatus::Confirmed, TxStatus::Failed] {
        assert!(from.valid_transitions().is_empty());
        for to in ALL_STATUSES {
            assert!(!from.can_transition_to(to), "{from} -> {to}");
        }
    }
}

#[test]
fn valid_transitions_agree_with_can_transition_to() {
    for from in ALL_STATUSES {
        for to in ALL_STATUSES {
            assert_eq!(
                from.valid_transitions().contains(&to),
                from.can_transition_to(to),
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn timed_out_is_not_terminal() {
    assert!(!TxStatus::TimedOut.is_terminal());
    assert!(TxStatus::TimedOut.can_transition_to(TxStatus::Submitted));
}
