//! Anisette provider constants
//!
//! Built-in endpoints, override variable names, and the header keys that make
//! up an anisette document. None of these are secrets.

/// Public anisette provider used when no single-endpoint override is set.
pub const PRIMARY_ENDPOINT: &str = "https://armconverter.com/anisette/irGb3Quww8zrhgqnzmrx";

/// Local fallback providers, always appended after the primary.
pub const LOCAL_FALLBACK_ENDPOINTS: [&str; 2] = ["http://127.0.0.1:6969", "http://localhost:6969"];

/// Delimited list of endpoints; replaces the defaults entirely when non-empty.
pub const SERVERS_ENV: &str = "ALTSERVER_ANISETTE_SERVERS";

/// Single endpoint that takes the place of [`PRIMARY_ENDPOINT`].
pub const SERVER_ENV: &str = "ALTSERVER_ANISETTE_SERVER";

/// User-Agent sent to anisette providers unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "Xcode";

/// Per-endpoint request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Maximum body characters quoted in a diagnostic before truncation.
pub const SNIPPET_MAX_CHARS: usize = 240;

/// Wire format of `X-Apple-I-Client-Time`.
pub const CLIENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub const MACHINE_ID_KEY: &str = "X-Apple-I-MD-M";
pub const ONE_TIME_PASSWORD_KEY: &str = "X-Apple-I-MD";
pub const LOCAL_USER_ID_KEY: &str = "X-Apple-I-MD-LU";
pub const ROUTING_INFO_KEY: &str = "X-Apple-I-MD-RINFO";
pub const DEVICE_UNIQUE_ID_KEY: &str = "X-Mme-Device-Id";
pub const DEVICE_SERIAL_NUMBER_KEY: &str = "X-Apple-I-SRL-NO";
pub const DEVICE_DESCRIPTION_KEY: &str = "X-MMe-Client-Info";
pub const CLIENT_TIME_KEY: &str = "X-Apple-I-Client-Time";
pub const LOCALE_KEY: &str = "X-Apple-Locale";
pub const TIME_ZONE_KEY: &str = "X-Apple-I-TimeZone";

/// Every key a provider response must carry, in header order.
pub const REQUIRED_KEYS: [&str; 10] = [
    MACHINE_ID_KEY,
    ONE_TIME_PASSWORD_KEY,
    LOCAL_USER_ID_KEY,
    ROUTING_INFO_KEY,
    DEVICE_UNIQUE_ID_KEY,
    DEVICE_SERIAL_NUMBER_KEY,
    DEVICE_DESCRIPTION_KEY,
    CLIENT_TIME_KEY,
    LOCALE_KEY,
    TIME_ZONE_KEY,
];
