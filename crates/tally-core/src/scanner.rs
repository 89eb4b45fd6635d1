//! # Barcode Input Classifier
//!
//! Tells a hardware scanner apart from a person typing, from keystroke
//! timing alone.
//!
//! ## How a Scanner Looks on the Wire
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scanner (keyboard wedge)                                               │
//! │    5   9   0   1   2   3   4   1   2   3   4   5   7  ⏎                │
//! │    |<5ms>|<5ms>| ...                                  |                 │
//! │    all gaps << 50 ms ──────────────────────────────► emit "5901234..."  │
//! │                                                                         │
//! │  Human                                                                  │
//! │    5 ......... 9 ....... 0 ......... 1  ⏎                               │
//! │      180 ms      140 ms     210 ms                                      │
//! │    every gap > 50 ms resets the buffer ─────────────► nothing emitted   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine
//! ```text
//!            printable key                 printable key (gap <= threshold)
//!   ┌──────┐ ─────────────► ┌──────────────┐ ◄──────────┐
//!   │ Idle │                │ Accumulating │ ───────────┘
//!   └──────┘ ◄───────────── └──────────────┘
//!      ▲      idle timeout         │
//!      │                           │ Enter
//!      └───────────────────────────┘ (emit if len >= min, else drop)
//! ```
//!
//! The classifier never reads a clock: every [`KeyEvent`] carries its own
//! `Instant`, and idle expiry is applied when the next event arrives or when
//! the caller's timer fires [`BarcodeClassifier::expire`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::validate_code;
use crate::{IDLE_TIMEOUT_MS, INTER_KEY_THRESHOLD_MS, MIN_CODE_LENGTH};

// =============================================================================
// Configuration
// =============================================================================

/// Timing and length rules for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Largest gap between two scanner keystrokes.
    pub inter_key_threshold: Duration,
    /// Idle time after which a partial buffer is dropped.
    pub idle_timeout: Duration,
    /// Shortest buffer emitted as a code.
    pub min_code_length: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            inter_key_threshold: Duration::from_millis(INTER_KEY_THRESHOLD_MS),
            idle_timeout: Duration::from_millis(IDLE_TIMEOUT_MS),
            min_code_length: MIN_CODE_LENGTH,
        }
    }
}

// =============================================================================
// Input Events
// =============================================================================

/// A single key press as seen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A printable character.
    Char(char),
    /// Enter / carriage return, the scanner's terminator.
    Enter,
    /// Modifiers, arrows, function keys. Ignored.
    Other,
}

impl KeyInput {
    /// Maps a raw character (terminal or serial byte) to a key.
    pub fn from_char(c: char) -> Self {
        match c {
            '\r' | '\n' => KeyInput::Enter,
            c if c.is_control() => KeyInput::Other,
            c => KeyInput::Char(c),
        }
    }
}

/// A key press with its arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyInput,
    pub at: Instant,
}

impl KeyEvent {
    pub fn new(key: KeyInput, at: Instant) -> Self {
        KeyEvent { key, at }
    }
}

/// What currently holds keyboard focus in the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FocusTarget {
    /// Nothing focused (page body).
    #[default]
    None,
    /// The dedicated scan field.
    ScanField,
    TextInput,
    NumberInput,
    Select,
    /// A non-input element such as a button.
    Other,
}

/// Focus and modal state, broadcast by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FocusContext {
    pub modal_open: bool,
    pub focused: FocusTarget,
}

impl FocusContext {
    /// True when keystrokes belong to the scanner.
    ///
    /// A modal, or focus in any form input other than the scan field, hands
    /// the keyboard to the form.
    pub fn should_capture(&self) -> bool {
        !self.modal_open
            && matches!(
                self.focused,
                FocusTarget::None | FocusTarget::ScanField | FocusTarget::Other
            )
    }
}

// =============================================================================
// Classifier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassifierState {
    Idle,
    Accumulating { buffer: String, last_key: Instant },
}

/// Turns a keystroke stream into scanned codes.
#[derive(Debug, Clone)]
pub struct BarcodeClassifier {
    config: ScannerConfig,
    state: ClassifierState,
}

impl BarcodeClassifier {
    pub fn new(config: ScannerConfig) -> Self {
        BarcodeClassifier {
            config,
            state: ClassifierState::Idle,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Feeds one key event. Returns a code when Enter completes a burst.
    ///
    /// ## Rules
    /// - Suppressed focus: the event is ignored entirely
    /// - A gap above the inter-key threshold drops everything typed before it
    /// - Enter emits the buffer if it meets the minimum length, otherwise
    ///   drops it silently; either way the classifier returns to Idle
    pub fn handle(&mut self, event: KeyEvent, focus: &FocusContext) -> Option<String> {
        if !focus.should_capture() {
            return None;
        }

        self.expire(event.at);

        match event.key {
            KeyInput::Char(c) => {
                self.push(c, event.at);
                None
            }
            KeyInput::Enter => self.terminate(event.at),
            KeyInput::Other => None,
        }
    }

    /// When the current buffer goes stale, if one exists.
    pub fn idle_deadline(&self) -> Option<Instant> {
        match &self.state {
            ClassifierState::Idle => None,
            ClassifierState::Accumulating { last_key, .. } => Some(*last_key + self.config.idle_timeout),
        }
    }

    /// Drops a buffer that has been idle for the timeout. Returns true if it
    /// dropped something.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.idle_deadline() {
            Some(deadline) if now >= deadline => {
                self.state = ClassifierState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Characters collected so far.
    pub fn buffer(&self) -> &str {
        match &self.state {
            ClassifierState::Idle => "",
            ClassifierState::Accumulating { buffer, .. } => buffer,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == ClassifierState::Idle
    }

    pub fn reset(&mut self) {
        self.state = ClassifierState::Idle;
    }

    fn push(&mut self, c: char, at: Instant) {
        let threshold = self.config.inter_key_threshold;
        match &mut self.state {
            ClassifierState::Accumulating { buffer, last_key } => {
                if at.saturating_duration_since(*last_key) > threshold {
                    buffer.clear();
                }
                buffer.push(c);
                *last_key = at;
            }
            ClassifierState::Idle => {
                self.state = ClassifierState::Accumulating {
                    buffer: c.to_string(),
                    last_key: at,
                };
            }
        }
    }

    fn terminate(&mut self, at: Instant) -> Option<String> {
        let state = std::mem::replace(&mut self.state, ClassifierState::Idle);
        let ClassifierState::Accumulating { buffer, last_key } = state else {
            return None;
        };

        // A pause before Enter is human cadence too.
        if at.saturating_duration_since(last_key) > self.config.inter_key_threshold {
            return None;
        }

        if buffer.chars().count() >= self.config.min_code_length {
            Some(buffer)
        } else {
            None
        }
    }
}

impl Default for BarcodeClassifier {
    fn default() -> Self {
        BarcodeClassifier::new(ScannerConfig::default())
    }
}

// =============================================================================
// Manual Entry
// =============================================================================

/// Tokens parsed from one line of typed or pasted text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualEntry {
    /// Tokens that passed validation, in input order.
    pub codes: Vec<String>,
    /// Tokens dropped as too short or malformed.
    pub rejected: Vec<String>,
}

/// Splits a manual entry line into codes.
///
/// Tokens are separated by whitespace or commas. Short tokens are counted as
/// rejected; only an entirely empty line is an error.
///
/// ```rust
/// use tally_core::scanner::parse_manual_entry;
///
/// let entry = parse_manual_entry("5901234123457, 12 TEA-GRN-250", 4).unwrap();
/// assert_eq!(entry.codes, vec!["5901234123457", "TEA-GRN-250"]);
/// assert_eq!(entry.rejected, vec!["12"]);
/// assert!(parse_manual_entry("   ", 4).is_err());
/// ```
pub fn parse_manual_entry(input: &str, min_len: usize) -> Result<ManualEntry, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    let mut entry = ManualEntry::default();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        match validate_code(token, min_len) {
            Ok(code) => entry.codes.push(code),
            Err(_) => entry.rejected.push(token.to_string()),
        }
    }

    Ok(entry)
}

/// Outcome of one code in a multi-code submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScanResult {
    pub code: String,
    pub success: bool,
    pub message: String,
}

/// Per-token tally for a manual entry line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScanSummary {
    pub added: usize,
    pub failed: usize,
    pub rejected_tokens: Vec<String>,
    pub results: Vec<ScanResult>,
}

impl ScanSummary {
    /// Starts a summary with the tokens parsing already rejected.
    pub fn with_rejected(rejected: Vec<String>) -> Self {
        ScanSummary {
            failed: rejected.len(),
            rejected_tokens: rejected,
            ..ScanSummary::default()
        }
    }

    pub fn record_success(&mut self, code: &str, message: impl Into<String>) {
        self.added += 1;
        self.results.push(ScanResult {
            code: code.to_string(),
            success: true,
            message: message.into(),
        });
    }

    pub fn record_failure(&mut self, code: &str, message: impl Into<String>) {
        self.failed += 1;
        self.results.push(ScanResult {
            code: code.to_string(),
            success: false,
            message: message.into(),
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
