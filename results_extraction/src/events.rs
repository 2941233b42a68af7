// Structured scan events.
//
// Every noteworthy decision the scanner takes is reported through an
// observer so callers can log it, count it, or assert on it in tests.

use log::{debug, warn};

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ScanEvent {
    PrecinctFound {
        line_no: usize,
        precinct: String,
    },
    OfficeFound {
        line_no: usize,
        office: String,
    },
    /// The line matched no pattern in the cascade. Non-fatal.
    UnclassifiedLine {
        line_no: usize,
        line: String,
    },
    /// A pattern anchored but its numeric payload was unusable.
    MalformedNumericField {
        line_no: usize,
        line: String,
    },
    /// A vote line arrived before any precinct or office header.
    MissingContext {
        line_no: usize,
        line: String,
    },
    RecordIngested {
        line_no: usize,
        candidate: String,
    },
}

pub trait ScanObserver {
    fn event(&mut self, event: ScanEvent);
}

/// Forwards events to the `log` facade. Anomalies go to warn, the rest
/// to debug.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ScanObserver for LogObserver {
    fn event(&mut self, event: ScanEvent) {
        match &event {
            ScanEvent::UnclassifiedLine { line_no, line } => {
                debug!("line {}: unclassified: {:?}", line_no, line);
            }
            ScanEvent::MalformedNumericField { line_no, line } => {
                warn!("line {}: malformed numeric field: {:?}", line_no, line);
            }
            ScanEvent::MissingContext { line_no, line } => {
                warn!("line {}: vote line outside any context: {:?}", line_no, line);
            }
            other => debug!("{:?}", other),
        }
    }
}

/// Retains every event, for assertions in tests.
#[derive(Debug, Default)]
pub struct CountingObserver {
    pub events: Vec<ScanEvent>,
}

impl CountingObserver {
    pub fn new() -> CountingObserver {
        CountingObserver::default()
    }

    pub fn unclassified(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ScanEvent::UnclassifiedLine { .. }))
            .count()
    }

    pub fn missing_context(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ScanEvent::MissingContext { .. }))
            .count()
    }
}

impl ScanObserver for CountingObserver {
    fn event(&mut self, event: ScanEvent) {
        self.events.push(event);
    }
}

/// Aggregate counters returned with every scan.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ScanStats {
    pub lines_seen: usize,
    pub records: usize,
    pub unclassified: usize,
    pub malformed: usize,
    pub missing_context: usize,
}
