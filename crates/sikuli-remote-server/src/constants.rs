//! Constants used throughout the keyword server
//!
//! This module centralizes magic numbers for better maintainability.

/// Default timeout for wait operations in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 3.0;

/// Default minimum similarity for image matching
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.7;

/// Default number of search cycles per second while waiting (one cycle every 500 ms)
pub const DEFAULT_WAIT_SCAN_RATE: f64 = 2.0;

/// Default delay in seconds before the mouse moves to a target
pub const DEFAULT_MOVE_MOUSE_DELAY: f64 = 0.5;

/// Default OCR language
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Sub-folder under the capture base folder that receives screenshots
pub const CAPTURE_SUB_FOLDER: &str = "sikuli_captured";

/// File suffixes that mark a locator as an image reference
pub const IMAGE_SUFFIXES: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff"];

/// Default width of a virtual screen
pub const VIRTUAL_SCREEN_WIDTH: i32 = 1920;

/// Default height of a virtual screen
pub const VIRTUAL_SCREEN_HEIGHT: i32 = 1080;
