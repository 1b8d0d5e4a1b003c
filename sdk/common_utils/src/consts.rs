//! Consolidated constants for the checkout core

use std::time::Duration;

// =============================================================================
// Checkout API paths
// =============================================================================

/// Query parameter carrying the client key on session endpoints
pub const CLIENT_KEY_QUERY: &str = "clientKey";
/// Query parameter carrying the client key on legacy endpoints
pub const TOKEN_QUERY: &str = "token";

pub const SESSIONS_PATH: &str = "v1/sessions";
pub const STATUS_PATH: &str = "services/PaymentInitiation/v1/status";
pub const SUBMIT_FINGERPRINT_PATH: &str = "v1/submitThreeDS2Fingerprint";
pub const NATIVE_REDIRECT_PATH: &str = "v1/nativeRedirect/redirectResult";
pub const QR_CODE_IMAGE_PATH: &str = "barcode.shtml";

// =============================================================================
// HTTP Headers
// =============================================================================

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

// =============================================================================
// Status polling
// =============================================================================

/// Delay between polls during the first minute
pub const POLLING_DELAY_FAST: Duration = Duration::from_secs(2);
/// Delay between polls once the fast window has elapsed
pub const POLLING_DELAY_SLOW: Duration = Duration::from_secs(10);
/// Length of the fast polling window
pub const POLLING_THRESHOLD: Duration = Duration::from_secs(60);
/// Upper bound for polling when the payment method does not define one
pub const DEFAULT_MAX_POLLING_DURATION: Duration = Duration::from_secs(15 * 60);

// =============================================================================
// Streams
// =============================================================================

/// Buffer of every UI facing stream, oldest items are dropped once full
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Result codes
// =============================================================================

pub const RESULT_PENDING: &str = "pending";
pub const RESULT_REFUSED: &str = "refused";
