// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_WORKSPACE_POOL_SIZE: usize = 100;

// Session configuration
pub const SESSION_NAME: &str = "rc_garage_session";
pub const SESSION_EXPIRY_DAYS: i64 = 30;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
pub const AUTH_SESSION_KEY: &str = "auth_session";

// Routes the auth gate redirects to
pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

// File store documents
pub const TIMER_RECORDS_FILE: &str = "timer-records.json";
pub const TRANSACTIONS_FILE: &str = "transactions.json";

// Remote store tables
pub const TIMER_RECORDS_TABLE: &str = "timer_records";
pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const PROFILES_TABLE: &str = "profiles";

// Timer
pub const TICK_MS: u64 = 10;
pub const MS_PER_HOUR: f64 = 3_600_000.0;
pub const DEFAULT_PLACEHOLDER_AMOUNT: &str = "1000000";

// Validation limits
pub const MAX_ITEM_NAME_LENGTH: usize = 255;
pub const MAX_NOTE_LENGTH: usize = 2000;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Provider sessions are refreshed this many seconds before they expire
pub const SESSION_EXPIRY_SKEW_SECONDS: i64 = 60;

// Error messages
pub const ERR_INVALID_LOGIN: &str = "Invalid username or password";
pub const ERR_INVALID_AMOUNT: &str = "Please enter a valid amount";
pub const ERR_ITEM_REQUIRED: &str = "Please enter an item name";
pub const ERR_ID_REQUIRED: &str = "ID is required";
pub const MSG_RELOAD_FAILED: &str = "Changes were saved, but the list could not be reloaded";
pub const MSG_VERIFY_EMAIL: &str =
    "Registration successful! Please verify your email before logging in.";
