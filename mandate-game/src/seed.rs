//! Reversible share-code scheme for run seeds.
//! Code format: MN-<WORD><NN>, e.g., MN-HARBOR42

const CODE_PREFIX: &str = "MN";

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// Word list for share codes
pub const WORD_LIST: [&str; 48] = [
    "HARBOR", "COUNCIL", "BUDGET", "TRAMWAY", "PARKS", "LEDGER", "CIVIC", "MAYOR", "BALLOT",
    "SEWER", "BRIDGE", "ZONING", "TAXES", "METRO", "SOLAR", "TURBINE", "RECYCLE", "GRANT",
    "BOND", "AUDIT", "PERMIT", "DISTRICT", "PLAZA", "LIBRARY", "CANAL", "DEPOT", "FERRY",
    "SUBURB", "FOREST", "RIVER", "SMOG", "LIZARD", "KAIJU", "PIER", "TOWER", "MARKET",
    "SCHOOL", "CLINIC", "GARDEN", "STADIUM", "MUSEUM", "TUNNEL", "SIGNAL", "QUARRY",
    "WHARF", "ORCHARD", "MEADOW", "BEACON",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    // Domain-separated FNV input
    let mut buf = [0u8; 9];
    buf[..6].copy_from_slice(b"MANDT-");
    buf[6] = (packed & 0xFF) as u8;
    buf[7] = (packed >> 8) as u8;
    buf[8] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

#[must_use]
pub fn encode_friendly(seed: u64) -> String {
    let packed = (seed & 0xFFFF) as u16;
    let (wi, nn) = unpack(packed);
    let word = WORD_LIST
        .get(usize::from(wi) % WORD_LIST.len())
        .copied()
        .unwrap_or("HARBOR");
    format!("{CODE_PREFIX}-{word}{:02}", nn % 100)
}

#[must_use]
pub fn decode_to_seed(code: &str) -> Option<u64> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    if !prefix.eq_ignore_ascii_case(CODE_PREFIX) || !rest.is_ascii() || rest.len() < 3 {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn))
}

/// Share code that replays exactly `seed`.
///
/// Only seeds minted from a code survive the round trip; any other seed gets
/// `None` because its code would decode to a different run.
#[must_use]
pub fn replay_code(seed: u64) -> Option<String> {
    let code = encode_friendly(seed);
    (decode_to_seed(&code) == Some(seed)).then_some(code)
}

/// Token that reproduces `seed` when passed back as a seed input: the share
/// code when one exists, the decimal seed otherwise.
#[must_use]
pub fn replay_token(seed: u64) -> String {
    replay_code(seed).unwrap_or_else(|| seed.to_string())
}

#[must_use]
pub fn generate_code_from_entropy(entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = ((entropy >> 17) % 100) as u8;
    encode_friendly(compose_seed(wi, nn))
}
