/*!
 * # Logwheel - Rotating File Logging for Services
 *
 * Logwheel is a small bootstrap layer for long-running components (servers,
 * routers, gateways): call it once at startup and every record emitted
 * through the `log` facade lands in a single size-capped, rotating file.
 *
 * ## Core Features
 *
 * - **Rotating Sink**: append-only log file capped at 1 MiB, archived under
 *   numbered names when the cap is passed
 * - **One-Shot Initialization**: installs the sink as the sole process-wide
 *   log destination with a fixed timestamp/level/thread/message format
 * - **Failure Guard**: a sink that can no longer persist records reports on
 *   the raw stderr stream and takes the process down instead of silently
 *   dropping diagnostics
 * - **Exception Logging**: records a message plus an error's full cause
 *   chain, line by line, at one severity
 *
 * ## Module Structure
 *
 * - `config`: sink configuration and defaults
 * - `rotate`: the size-capped rotating file
 * - `guard`: the write adapter that makes sink failure fatal
 * - `logging`: process-wide installation and the exception logger
 */

/// Sink configuration and defaults
pub mod config;
/// Write adapter that makes sink failure fatal
pub mod guard;
/// Process-wide installation and the exception logger
pub mod logging;
/// Size-capped rotating file
pub mod rotate;

pub use config::{LogConfig, DEFAULT_BACKUP_COUNT, LOG_MAX_SIZE};
pub use logging::{init_logging, Logging};
