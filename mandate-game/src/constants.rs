//! Centralized balance and tuning constants for Mandate game logic.
//!
//! Content (scenario text, ending text) lives in JSON assets; the rules that
//! interpret it live here so they only change through reviewed code.

// Stat defaults -------------------------------------------------------------
/// Neutral midpoint every stat starts a run at.
pub const INITIAL_STAT: i32 = 50;
/// Divisor used to turn a stat into a 0..1 gauge fraction.
pub const GAUGE_SCALE: f64 = 100.0;
/// Number of stats the approval average is taken over.
pub(crate) const APPROVAL_SOURCES: i32 = 3;

// Run pacing ----------------------------------------------------------------
/// Decisions per run when no configuration overrides it.
pub const DEFAULT_MAX_CHOICES: u32 = 12;
/// Every scenario offers exactly this many choices.
pub const CHOICES_PER_SCENARIO: usize = 2;
/// Labels handed out to choices by position.
pub const CHOICE_ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

// Threshold banding ---------------------------------------------------------
/// Ending bands read every third threshold.
pub const ENDING_STRIDE: usize = 3;
/// Default shared threshold array: live view reads the first three entries,
/// ending view reads entries 0, 3 and 6.
pub const DEFAULT_THRESHOLDS: [i32; 9] = [0, 40, 60, 60, 60, 60, 75, 75, 75];
/// Background sprites available per stat for live banding.
pub const DEFAULT_LIVE_SPRITES: usize = 3;

// Endings -------------------------------------------------------------------
/// Ordinary ending pages, one per stat.
pub const ENDING_PAGE_COUNT: u8 = 4;
/// Scenario id that unlocks the bonus ending background.
pub const BONUS_SCENARIO_ID: u32 = 7;
/// Background key of the bonus ending.
pub const BONUS_BACKGROUND: &str = "Endings/Backgrounds/GodzillaEnd";
/// Extra copies of the regular background added next to the bonus entry.
pub const BONUS_FILLER_COPIES: usize = 9;
/// Position of the bonus entry inside the candidate list.
pub const BONUS_CANDIDATE_INDEX: usize = 1;
/// Prefix shared by the default per-stat ending backgrounds.
pub(crate) const ENDING_BACKGROUND_PREFIX: &str = "Endings/Backgrounds/";
/// Suffixes for default ending backgrounds, worst to best.
pub(crate) const ENDING_BACKGROUND_TIERS: [&str; 3] = ["Bad", "Neutral", "Good"];

// RNG domains ---------------------------------------------------------------
pub(crate) const RNG_DOMAIN_SELECTION: &[u8] = b"selection";
pub(crate) const RNG_DOMAIN_ENDING: &[u8] = b"ending";
