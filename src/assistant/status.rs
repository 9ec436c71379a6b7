//! Status messages shown while a request is processing

use serde::Serialize;
use std::time::Duration;

/// One status message and how long it stays up
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusStage {
    pub text: &'static str,
    #[serde(with = "millis")]
    pub duration: Duration,
}

/// Stages in display order
pub const STATUS_STAGES: &[StatusStage] = &[
    StatusStage {
        text: "Understanding your request...",
        duration: Duration::from_millis(500),
    },
    StatusStage {
        text: "Checking 47 parking facilities...",
        duration: Duration::from_millis(800),
    },
    StatusStage {
        text: "Analyzing GT vs. Clemson game impact...",
        duration: Duration::from_millis(800),
    },
    StatusStage {
        text: "Evaluating traffic patterns...",
        duration: Duration::from_millis(700),
    },
    StatusStage {
        text: "Calculating walking routes...",
        duration: Duration::from_millis(600),
    },
    StatusStage {
        text: "Finding your best options...",
        duration: Duration::from_millis(500),
    },
];

/// Sum of all stage durations
pub fn total_duration() -> Duration {
    STATUS_STAGES.iter().map(|stage| stage.duration).sum()
}

/// Offset from entering processing at which each later stage comes up
///
/// Yields `(stage, offset)` for stages `1..`, then `(STATUS_STAGES.len(),
/// total_duration())` for the point where every stage has run.
pub fn stage_starts() -> impl Iterator<Item = (usize, Duration)> {
    STATUS_STAGES
        .iter()
        .scan(Duration::ZERO, |boundary, stage| {
            *boundary += stage.duration;
            Some(*boundary)
        })
        .enumerate()
        .map(|(index, start)| (index + 1, start))
}

/// Stage visible after `elapsed` time in processing
///
/// Returns the stage index and stage, or `None` once every stage has run.
pub fn status_at(elapsed: Duration) -> Option<(usize, &'static StatusStage)> {
    let mut boundary = Duration::ZERO;
    for (index, stage) in STATUS_STAGES.iter().enumerate() {
        boundary += stage.duration;
        if elapsed < boundary {
            return Some((index, stage));
        }
    }
    None
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().min(u64::MAX as u128) as u64)
    }
}
