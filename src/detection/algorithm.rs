use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{duration_minutes, Event, EventType, Reading};
use crate::detection::config::ThresholdTable;

/// An event still accumulating readings.
#[derive(Debug, Clone)]
struct OpenEvent {
    event_type: EventType,
    start_time: DateTime<Utc>,
    start_value: f64,
    peak_value: f64,
    reading_ids: Vec<String>,
}

impl OpenEvent {
    fn open(event_type: EventType, reading: &Reading) -> Self {
        Self {
            event_type,
            start_time: reading.timestamp,
            start_value: reading.glucose_mg_dl,
            peak_value: reading.glucose_mg_dl,
            reading_ids: vec![reading.id.clone()],
        }
    }

    fn extend(&mut self, reading: &Reading) {
        self.reading_ids.push(reading.id.clone());
        self.peak_value = self
            .event_type
            .worse_of(self.peak_value, reading.glucose_mg_dl);
    }

    /// Close at `boundary`'s time and value.
    fn close(self, session_id: &str, user_id: &str, boundary: Option<&Reading>) -> Event {
        let end_time = boundary.map(|r| r.timestamp);
        Event {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            event_type: self.event_type,
            severity: self.event_type.severity(),
            start_time: self.start_time,
            end_time,
            start_value: self.start_value,
            end_value: boundary.map(|r| r.glucose_mg_dl),
            peak_value: self.peak_value,
            duration_minutes: duration_minutes(self.start_time, end_time),
            reading_ids: self.reading_ids,
        }
    }
}

/// Segments a reading stream into clinical events.
#[derive(Debug, Clone)]
pub struct EventDetector {
    thresholds: ThresholdTable,
}

impl EventDetector {
    pub fn new(thresholds: ThresholdTable) -> Self {
        Self { thresholds }
    }

    /// Single pass over `readings` in timestamp order. Every returned event is closed.
    ///
    /// Boundary rules:
    /// - a reading back in range closes the open event at that reading;
    /// - a reading of another out-of-range type closes the open event at the
    ///   previous reading and opens a new one;
    /// - an event still open when the stream ends closes at the last reading.
    ///
    /// Adjacency is positional within this batch only.
    pub fn detect(&self, session_id: &str, user_id: &str, readings: &[Reading]) -> Vec<Event> {
        let mut sorted: Vec<&Reading> = readings.iter().collect();
        sorted.sort_by_key(|reading| reading.timestamp);

        let mut events = Vec::new();
        let mut current: Option<OpenEvent> = None;
        let mut previous: Option<&Reading> = None;

        for reading in sorted {
            let class = self.thresholds.classify(reading.glucose_mg_dl);

            current = match (current.take(), class) {
                (None, None) => None,
                (None, Some(event_type)) => Some(OpenEvent::open(event_type, reading)),
                (Some(mut open), Some(event_type)) if open.event_type == event_type => {
                    open.extend(reading);
                    Some(open)
                }
                (Some(open), None) => {
                    events.push(open.close(session_id, user_id, Some(reading)));
                    None
                }
                (Some(open), Some(event_type)) => {
                    events.push(open.close(session_id, user_id, previous));
                    Some(OpenEvent::open(event_type, reading))
                }
            };

            previous = Some(reading);
        }

        if let Some(open) = current {
            events.push(open.close(session_id, user_id, previous));
        }

        events
    }
}
