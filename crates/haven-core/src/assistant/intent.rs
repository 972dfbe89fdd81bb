//! Keyword-matching intent detection.
//!
//! Crisis phrases are checked before escalation phrases so a message that
//! mentions both is always treated as a crisis.

use haven_types::assistant::Intent;

const CRISIS_PHRASES: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "want to die",
    "self-harm",
    "self harm",
    "hurt myself",
    "harm myself",
    "no reason to live",
];

const ESCALATION_PHRASES: &[&str] = &[
    "expert",
    "counsellor",
    "counselor",
    "therapist",
    "psychologist",
    "doctor",
    "real person",
    "human",
    "talk to someone",
    "speak to someone",
];

/// Classify a user message.
pub fn detect_intent(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    if CRISIS_PHRASES.iter().any(|p| lowered.contains(p)) {
        Intent::Crisis
    } else if ESCALATION_PHRASES.iter().any(|p| lowered.contains(p)) {
        Intent::Escalation
    } else {
        Intent::General
    }
}
