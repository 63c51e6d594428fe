use chrono::Utc;
use rust_decimal_macros::dec;
use stakecast_ledger::{SqliteLedger, SubmissionLedger};
use stakecast_models::decision::StakeSplit;
use stakecast_models::direction::PerDirection;
use stakecast_models::submission::{EpochState, LegAttempt, LegOutcome, SubmissionRecord};

fn failed_then_resubmitted(epoch: u64) -> SubmissionRecord {
    SubmissionRecord {
        epoch,
        target_slot: (epoch + 2) * 300,
        first_attempt: LegAttempt {
            stakes: StakeSplit {
                stake_up: dec!(3),
                stake_down: dec!(7),
            },
            outcomes: PerDirection::new(
                LegOutcome::Failed {
                    reason: "receipt status 0".to_string(),
                },
                LegOutcome::Confirmed { tx_hash: None },
            ),
        },
        resubmission: Some(LegAttempt {
            stakes: StakeSplit::uniform(dec!(0.0000000001)),
            outcomes: PerDirection::new(
                LegOutcome::Confirmed { tx_hash: None },
                LegOutcome::Confirmed { tx_hash: None },
            ),
        }),
        state: EpochState::Submitted,
        submitted_at: Utc::now(),
    }
}

#[test]
fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let path = path.to_str().unwrap();

    let rec = failed_then_resubmitted(41);
    {
        let mut ledger = SqliteLedger::open(path).unwrap();
        ledger.reserve(41, rec.target_slot).unwrap();
        ledger.complete(&rec).unwrap();
        // Interrupted mid-submission: reserved but never completed.
        ledger.reserve(42, 13_200).unwrap();
    }

    let mut ledger = SqliteLedger::open(path).unwrap();
    assert_eq!(ledger.epochs().unwrap(), vec![41, 42]);
    assert!(ledger.reserve(41, rec.target_slot).is_err());
    assert!(ledger.reserve(42, 13_200).is_err());

    let entry = ledger.get(41).unwrap().unwrap();
    assert_eq!(entry.record.as_ref(), Some(&rec));
    assert!(entry.record.unwrap().succeeded());

    let dangling = ledger.get(42).unwrap().unwrap();
    assert_eq!(dangling.state, EpochState::Submitting);
    assert!(!dangling.is_complete());

    assert_eq!(ledger.records().unwrap(), vec![rec]);
}

#[test]
fn two_connections_share_one_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let path = path.to_str().unwrap();

    let mut first = SqliteLedger::open(path).unwrap();
    let mut second = SqliteLedger::open(path).unwrap();

    first.reserve(8, 3000).unwrap();
    assert!(second.contains(8).unwrap());
    assert!(second.reserve(8, 3000).is_err());
}
