//! Tests for cogex-triggers: sequence cycling, annotation, dummy/live port
//! behaviour and the persisted report.

use cogex_timing::ManualTimer;
use cogex_triggers::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

type Ledger = TriggerLedger<RecordingPort, ManualTimer>;

fn config() -> LedgerConfig {
    LedgerConfig::new(TriggerVocabulary::new(["fixation", "stimulus", "response"]))
        .with_extra_fields(["acc", "key"])
}

fn dummy_ledger() -> Ledger {
    TriggerLedger::new(config(), ManualTimer::new()).unwrap()
}

fn live_ledger() -> (Ledger, RecordingPort) {
    let port = RecordingPort::new();
    let handle = port.clone();
    let ledger =
        TriggerLedger::open(config().with_dummy_mode(false), ManualTimer::new(), move || {
            Ok(port)
        })
        .unwrap();
    (ledger, handle)
}

fn test_dir() -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("cogex-triggers-test-{}-{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

struct BrokenPort;

impl OutputPort for BrokenPort {
    fn set_data(&mut self, _value: u8) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "cable unplugged"))
    }
}

/// Accepts trigger values but fails every clear.
struct StuckPort(RecordingPort);

impl OutputPort for StuckPort {
    fn set_data(&mut self, value: u8) -> io::Result<()> {
        if value == CLEAR_VALUE {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "clear rejected"));
        }
        self.0.set_data(value)
    }
}

// ===========================================================================
// Sequence numbers
// ===========================================================================

#[test]
fn sequence_numbers_cycle_after_limit() {
    let mut ledger = dummy_ledger();
    for _ in 0..61 {
        ledger.send_trigger("stimulus", None, false).unwrap();
    }

    let numbers: Vec<u8> = ledger.records().iter().map(|r| r.sequence_number()).collect();
    let expected: Vec<u8> = (1..=60).chain(std::iter::once(1)).collect();
    assert_eq!(numbers, expected);
    assert_eq!(ledger.next_sequence_number(), 2);
}

#[test]
fn past_records_keep_their_number_across_wraps() {
    let config = config().with_trigger_limit(3);
    let mut ledger: Ledger = TriggerLedger::new(config, ManualTimer::new()).unwrap();
    ledger.trigger("fixation").unwrap();
    ledger.trigger("stimulus").unwrap();
    let before = ledger.records()[..2].to_vec();

    for _ in 0..7 {
        ledger.trigger("response").unwrap();
    }

    assert_eq!(&ledger.records()[..2], before.as_slice());
    assert_eq!(ledger.records()[0].sequence_number(), 1);
    assert_eq!(ledger.records()[1].sequence_number(), 2);
    assert_eq!(ledger.records()[3].sequence_number(), 1);
}

#[test]
fn limit_of_255_wraps_without_overflow() {
    let config = config().with_trigger_limit(u8::MAX);
    let mut ledger: Ledger = TriggerLedger::new(config, ManualTimer::new()).unwrap();
    for _ in 0..256 {
        ledger.send_trigger("stimulus", None, false).unwrap();
    }
    assert_eq!(ledger.records()[254].sequence_number(), 255);
    assert_eq!(ledger.records()[255].sequence_number(), 1);
}

#[test]
fn unknown_trigger_type_fails_without_record() {
    let mut ledger = dummy_ledger();
    ledger.trigger("fixation").unwrap();

    let err = ledger.trigger("blink").unwrap_err();
    assert!(matches!(err, TriggerError::UnknownTriggerType(ref t) if t == "blink"));
    assert_eq!(ledger.records().len(), 1);
    assert_eq!(ledger.next_sequence_number(), 2);
    assert!(ledger
        .events()
        .with_level(LogLevel::Critical)
        .any(|e| e.message.contains("blink")));
}

// ===========================================================================
// Annotation
// ===========================================================================

#[test]
fn annotate_current_trial_tags_exactly_its_triggers() {
    let mut ledger = dummy_ledger();
    ledger.trigger("fixation").unwrap();

    ledger.start_trial();
    ledger.trigger("fixation").unwrap();
    ledger.trigger("stimulus").unwrap();
    ledger.trigger("response").unwrap();
    ledger
        .annotate_recent(Fields::new().with("acc", 1), -1)
        .unwrap();

    let records = ledger.records();
    assert!(records[0].get("acc").is_none());
    for record in &records[1..] {
        assert_eq!(record.get("acc"), Some(&FieldValue::Int(1)));
    }
    assert_eq!(ledger.trial_marker(), None);

    let err = ledger
        .annotate_recent(Fields::new().with("acc", 0), -1)
        .unwrap_err();
    assert!(matches!(err, TriggerError::NoActiveTrial));
}

#[test]
fn annotate_beyond_history_mutates_nothing() {
    let mut ledger = dummy_ledger();
    for _ in 0..3 {
        ledger.trigger("stimulus").unwrap();
    }
    let before = ledger.records().to_vec();

    let err = ledger
        .annotate_recent(Fields::new().with("acc", 1), 5)
        .unwrap_err();
    assert!(matches!(
        err,
        TriggerError::InsufficientHistory {
            requested: 5,
            available: 3
        }
    ));
    assert_eq!(ledger.records(), before.as_slice());
}

#[test]
fn annotate_overwrite_is_flagged_but_applied() {
    let mut ledger = dummy_ledger();
    ledger
        .send_trigger("response", Some(Fields::new().with("key", "a")), true)
        .unwrap();
    let criticals = ledger.events().with_level(LogLevel::Critical).count();

    ledger
        .annotate_recent(Fields::new().with("key", "b"), 1)
        .unwrap();

    assert_eq!(
        ledger.records()[0].get("key"),
        Some(&FieldValue::Text("b".into()))
    );
    assert_eq!(
        ledger.events().with_level(LogLevel::Critical).count(),
        criticals + 1
    );
}

#[test]
fn annotate_drops_unregistered_fields() {
    let mut ledger = dummy_ledger();
    ledger.trigger("stimulus").unwrap();
    ledger
        .annotate_recent(Fields::new().with("acc", 0).with("mood", "calm"), 1)
        .unwrap();

    let record = &ledger.records()[0];
    assert_eq!(record.get("acc"), Some(&FieldValue::Int(0)));
    assert!(record.get("mood").is_none());
}

// ===========================================================================
// Extra fields at emission
// ===========================================================================

#[test]
fn unregistered_field_is_dropped_with_warning() {
    let mut ledger = dummy_ledger();
    let warnings = ledger.events().with_level(LogLevel::Warning).count();

    ledger
        .send_trigger(
            "stimulus",
            Some(Fields::new().with("acc", 1).with("color", "red")),
            true,
        )
        .unwrap();

    let record = &ledger.records()[0];
    assert!(record.get("color").is_none());
    assert_eq!(record.get("acc"), Some(&FieldValue::Int(1)));
    assert_eq!(
        ledger.events().with_level(LogLevel::Warning).count(),
        warnings + 1
    );
    assert!(!ledger.trigger_table().unwrap().contains("red"));
}

// ===========================================================================
// Ports
// ===========================================================================

#[test]
fn dummy_mode_never_touches_the_port() {
    let port = RecordingPort::new();
    let handle = port.clone();
    let mut ledger: Ledger =
        TriggerLedger::open(config(), ManualTimer::new(), move || Ok(port)).unwrap();
    assert!(ledger.is_dummy());

    ledger.start_trial();
    ledger.trigger("fixation").unwrap();
    ledger.send_trigger("stimulus", None, false).unwrap();
    ledger.send_clear().unwrap();

    assert!(handle.writes().is_empty());
    assert_eq!(ledger.records().len(), 2);
    assert_eq!(ledger.next_sequence_number(), 3);
    assert_eq!(ledger.trial_marker(), Some(2));
}

#[test]
fn live_mode_writes_value_then_clear() {
    let (mut ledger, port) = live_ledger();
    assert!(!ledger.is_dummy());

    ledger.trigger("fixation").unwrap();
    ledger.send_trigger("stimulus", None, false).unwrap();
    ledger.send_clear().unwrap();

    assert_eq!(port.writes(), vec![1, CLEAR_VALUE, 2, CLEAR_VALUE]);
}

#[test]
fn live_mode_writes_before_rejecting_unknown_type() {
    let (mut ledger, port) = live_ledger();
    assert!(ledger.trigger("blink").is_err());
    assert_eq!(port.writes(), vec![1]);
    assert!(ledger.records().is_empty());
}

#[test]
fn connect_twice_keeps_first_port() {
    let mut ledger = dummy_ledger();
    let first = RecordingPort::new();
    let handle = first.clone();
    ledger.connect(move || Ok(first)).unwrap();

    let mut reopened = false;
    ledger
        .connect(|| {
            reopened = true;
            Ok(RecordingPort::new())
        })
        .unwrap();
    assert!(!reopened);
    assert!(ledger
        .events()
        .with_level(LogLevel::Warning)
        .any(|e| e.message.contains("already established")));

    ledger.send_trigger("stimulus", None, false).unwrap();
    assert_eq!(handle.writes(), vec![1]);
}

#[test]
fn failed_connect_stays_dummy() {
    let mut ledger = dummy_ledger();
    let err = ledger
        .connect(|| Err(io::Error::new(io::ErrorKind::NotFound, "no parport")))
        .unwrap_err();
    assert!(matches!(err, TriggerError::Port(_)));
    assert!(ledger.is_dummy());
}

#[test]
fn port_failure_propagates_and_records_nothing() {
    let mut ledger: TriggerLedger<BrokenPort, ManualTimer> =
        TriggerLedger::open(config().with_dummy_mode(false), ManualTimer::new(), || {
            Ok(BrokenPort)
        })
        .unwrap();

    assert!(matches!(ledger.trigger("stimulus"), Err(TriggerError::Port(_))));
    assert!(ledger.records().is_empty());
    assert!(ledger
        .events()
        .with_level(LogLevel::Critical)
        .any(|e| e.message.contains("cable unplugged")));
}

#[test]
fn failed_clear_still_records_the_sent_trigger() {
    let port = RecordingPort::new();
    let handle = port.clone();
    let mut ledger: TriggerLedger<StuckPort, ManualTimer> =
        TriggerLedger::open(config().with_dummy_mode(false), ManualTimer::new(), move || {
            Ok(StuckPort(port))
        })
        .unwrap();
    ledger.start_trial();

    assert!(matches!(ledger.trigger("stimulus"), Err(TriggerError::Port(_))));
    assert_eq!(ledger.records().len(), 1);
    assert_eq!(ledger.records()[0].sequence_number(), 1);
    assert_eq!(ledger.next_sequence_number(), 2);
    assert_eq!(ledger.trial_marker(), Some(1));

    assert!(ledger.trigger("response").is_err());
    assert_eq!(handle.writes(), vec![1, 2]);
    assert_eq!(ledger.records()[1].sequence_number(), 2);
}

#[test]
fn hold_time_is_slept_once_per_delayed_trigger() {
    let timer = ManualTimer::new();
    let mut ledger: Ledger = TriggerLedger::new(
        config().with_hold_time(Duration::from_millis(6)),
        timer.clone(),
    )
    .unwrap();
    ledger.trigger("fixation").unwrap();
    ledger.trigger("stimulus").unwrap();
    ledger.send_clear().unwrap();

    assert_eq!(timer.sleeps(), vec![Duration::from_millis(6); 2]);
    let last = ledger.events().entries().last().unwrap();
    assert_eq!(last.elapsed, Duration::from_millis(12));
}

// ===========================================================================
// Report
// ===========================================================================

#[test]
fn persisted_report_reparses_to_one_row_per_record() {
    let dir = test_dir();
    let path = dir.join("triggers.csv");

    let mut ledger = dummy_ledger();
    ledger.start_trial();
    ledger.trigger("fixation").unwrap();
    ledger.trigger("stimulus").unwrap();
    ledger
        .send_trigger("response", Some(Fields::new().with("key", "z")), true)
        .unwrap();
    ledger
        .annotate_recent(Fields::new().with("acc", 0), -1)
        .unwrap();
    ledger.persist(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let table: String = text
        .lines()
        .take_while(|l| !l.starts_with("# "))
        .map(|l| format!("{l}\n"))
        .collect();
    let mut reader = csv::Reader::from_reader(table.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        ["trigger_no", "trigger_type", "acc", "key"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), ledger.records().len());
    assert_eq!(&rows[0][1], "fixation");
    assert_eq!(&rows[0][3], "UNKNOWN");
    assert_eq!(&rows[2][3], "z");
    assert!(rows.iter().all(|r| &r[2] == "0"));

    assert_eq!(
        text.lines().filter(|l| l.starts_with("# ")).count(),
        ledger.events().len()
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn report_survives_a_fatal_error() {
    let dir = test_dir();
    let path = dir.join("crash.csv");

    let mut ledger = dummy_ledger();
    ledger.trigger("fixation").unwrap();
    assert!(ledger.trigger("nonsense").is_err());
    ledger.persist(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("critical | There's no trigger type called: nonsense."));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn persist_to_missing_directory_fails() {
    let ledger = dummy_ledger();
    let err = ledger
        .persist("/nonexistent-cogex-dir/triggers.csv")
        .unwrap_err();
    assert!(matches!(err, TriggerError::Io(_)));
}
