//! Keyword implementations
//!
//! Each submodule implements one family of keywords as plain async
//! functions. [`registry`] is the registration table that names them,
//! documents them and declares their signatures.

pub mod application;
pub mod highlight;
pub mod input;
pub mod region;
pub mod screen;
pub mod settings;

use crate::coerce::{BoundArgs, ParamType, Scalar};
use crate::context::LibraryContext;
use crate::errors::{KeywordError, KeywordResult};
use crate::registry::{KeywordDescriptor, KeywordRegistry, Signature};
use serde_json::{Value, json};
use sikuli_remote_protocol::{Action, EngineSetting, Rect};

/// Wrap an async keyword function into a registry handler
macro_rules! handler {
    ($f:path) => {
        |ctx, args| Box::pin($f(ctx, args))
    };
}

const STR: ParamType = ParamType::Str;
const INT: ParamType = ParamType::Int;
const FLOAT: ParamType = ParamType::Float;
const BOOL: ParamType = ParamType::Bool;
const COORDS: ParamType = ParamType::List(Scalar::Int);
const NAMES: ParamType = ParamType::List(Scalar::Str);

/// Perform `action`, turning a zero result code into a `ScreenOperationError`
pub(crate) async fn perform(
    ctx: &LibraryContext,
    action: Action,
    operation: &str,
    target: &str,
) -> KeywordResult<()> {
    let code = ctx.engine().perform(&action).await?;
    if code == 0 {
        return Err(KeywordError::screen_operation(
            operation,
            target,
            "the screen engine reported failure",
        ));
    }
    Ok(())
}

/// Forward a setting to the engine; returns whether it was accepted
pub(crate) async fn configure(ctx: &LibraryContext, setting: EngineSetting) -> KeywordResult<bool> {
    let accepted = ctx.engine().configure(&setting).await?;
    if !accepted {
        tracing::debug!("Engine did not accept {:?}", setting);
    }
    Ok(accepted)
}

/// `[x, y, w, h]` as returned to remote callers
pub(crate) fn rect_value(rect: Rect) -> Value {
    json!(rect.to_array())
}

/// Read a `[x, y, w, h]` argument into a validated region
pub(crate) fn rect_arg(args: &BoundArgs, name: &str) -> KeywordResult<Rect> {
    let coords = args.coord_list(name)?;
    match coords.as_slice() {
        &[x, y, w, h] => crate::region::validate(Rect::new(x, y, w, h)),
        _ => Err(KeywordError::invalid_argument(
            args.keyword(),
            name,
            "four coordinates [x, y, w, h]",
            format!("{:?}", coords),
        )),
    }
}

/// Build the registration table of every keyword
pub fn registry() -> KeywordRegistry {
    let image = || Signature::new().arg("image", STR);

    KeywordRegistry::builder()
        // settings
        .keyword(
            KeywordDescriptor::new(
                "set_timeout",
                "Set the default timeout in seconds for every wait.\n\nReturns the previous timeout.",
                handler!(settings::set_timeout),
            )
            .signature(Signature::new().arg("timeout", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_min_similarity",
                "Set the minimum similarity (0 to 1) used by image locators without their own threshold.\n\nReturns the previous value.",
                handler!(settings::set_min_similarity),
            )
            .signature(Signature::new().arg("min_similarity", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "add_image_path",
                "Add a folder to the image search path.",
                handler!(settings::add_image_path),
            )
            .signature(Signature::new().arg("path", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "remove_image_path",
                "Remove a folder from the image search path.",
                handler!(settings::remove_image_path),
            )
            .signature(Signature::new().arg("path", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_capture_folder",
                "Save captured images under `path/sikuli_captured/`. The folder is created right away.",
                handler!(settings::set_capture_folder),
            )
            .signature(Signature::new().arg("path", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_capture_matched_image",
                "Enable or disable capturing matched regions.\n\nFailure captures are always taken. Returns the previous value.",
                handler!(settings::set_capture_matched_image),
            )
            .signature(Signature::new().arg("value", BOOL)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_ocr_text_read",
                "Enable or disable OCR text reading.",
                handler!(settings::set_ocr_text_read),
            )
            .signature(Signature::new().arg("ocr_text_read", BOOL)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_ocr_language",
                "Set the OCR language, for example `eng`.",
                handler!(settings::set_ocr_language),
            )
            .signature(Signature::new().arg("language", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_show_actions",
                "Visualize every action on the screen before it is performed.",
                handler!(settings::set_show_actions),
            )
            .signature(Signature::new().arg("show_actions", BOOL)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_move_mouse_delay",
                "Set the time in seconds the mouse takes to move to a target.",
                handler!(settings::set_move_mouse_delay),
            )
            .signature(Signature::new().arg("delay", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_slow_motion_delay",
                "Set the time in seconds actions are shown for when actions are visualized.",
                handler!(settings::set_slow_motion_delay),
            )
            .signature(Signature::new().arg("delay", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_wait_scan_rate",
                "Set how many search cycles per second a wait runs.",
                handler!(settings::set_wait_scan_rate),
            )
            .signature(Signature::new().arg("scan_rate", FLOAT)),
        )
        // clicks and typing
        .keyword(
            KeywordDescriptor::new(
                "click",
                "Click the center of an image, optionally shifted by a pixel offset.",
                handler!(screen::click),
            )
            .signature(image())
            .signature(image().arg("x_offset", INT).arg("y_offset", INT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "double_click",
                "Double click the center of an image, optionally shifted by a pixel offset.",
                handler!(screen::double_click),
            )
            .signature(image())
            .signature(image().arg("x_offset", INT).arg("y_offset", INT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "right_click",
                "Right click the center of an image, optionally shifted by a pixel offset.",
                handler!(screen::right_click),
            )
            .signature(image())
            .signature(image().arg("x_offset", INT).arg("y_offset", INT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "click_nth",
                "Click the n-th occurrence of an image, counting from 0.\n\nOccurrences are ordered by column (left to right, then top to bottom) or, with `sort_by_column=false`, by row.",
                handler!(screen::click_nth),
            )
            .signature(
                image()
                    .arg("index", INT)
                    .with_default("sort_by_column", BOOL, "True"),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "click_in",
                "Click a target image found inside an area image.",
                handler!(screen::click_in),
            )
            .signature(Signature::new().arg("area_image", STR).arg("target_image", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "double_click_in",
                "Double click a target image found inside an area image.",
                handler!(screen::double_click_in),
            )
            .signature(Signature::new().arg("area_image", STR).arg("target_image", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "right_click_in",
                "Right click a target image found inside an area image.",
                handler!(screen::right_click_in),
            )
            .signature(Signature::new().arg("area_image", STR).arg("target_image", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "click_region",
                "Click the center of a region given as `[x, y, w, h]`.",
                handler!(screen::click_region),
            )
            .signature(Signature::new().arg("coordinates", COORDS)),
        )
        .keyword(
            KeywordDescriptor::new(
                "input_text",
                "Click an image, then type text.\n\nWith an empty image the text goes to the focused element.",
                handler!(screen::input_text),
            )
            .signature(image().arg("text", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "type_with_modifiers",
                "Type text while holding modifier keys such as `CTRL` or `SHIFT`.",
                handler!(screen::type_with_modifiers),
            )
            .signature(Signature::new().arg("text", STR).varargs("modifiers", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "paste_text",
                "Click an image, then paste text through the clipboard.\n\nWith an empty image the text goes to the focused element.",
                handler!(screen::paste_text),
            )
            .signature(image().arg("text", STR)),
        )
        // waits and checks
        .keyword(
            KeywordDescriptor::new(
                "wait_until_screen_contain",
                "Wait until an image is shown in the region of interest.\n\nWithout a timeout the default timeout applies.",
                handler!(screen::wait_until_screen_contain),
            )
            .signature(image().optional("timeout", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "wait_until_screen_not_contain",
                "Wait until an image is no longer shown in the region of interest.",
                handler!(screen::wait_until_screen_not_contain),
            )
            .signature(image().optional("timeout", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "screen_should_contain",
                "Fail unless an image shows up within the default timeout.",
                handler!(screen::screen_should_contain),
            )
            .signature(image()),
        )
        .keyword(
            KeywordDescriptor::new(
                "screen_should_not_contain",
                "Fail if an image is currently shown.",
                handler!(screen::screen_should_not_contain),
            )
            .signature(image()),
        )
        .keyword(
            KeywordDescriptor::new(
                "exists",
                "Return whether an image shows up within `timeout` seconds.",
                handler!(screen::exists),
            )
            .signature(image().with_default("timeout", FLOAT, "0")),
        )
        .keyword(
            KeywordDescriptor::new(
                "wait_for_image",
                "Wait for a wanted image, failing at once if an unwanted image appears first.",
                handler!(screen::wait_for_image),
            )
            .signature(
                Signature::new()
                    .arg("wanted_image", STR)
                    .arg("not_wanted_image", STR)
                    .arg("timeout", FLOAT),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "wait_for_multiple_images",
                "Wait for any of the expected images, failing at once if an unexpected image appears.\n\nReturns the expected image that was found.",
                handler!(screen::wait_for_multiple_images),
            )
            .signature(
                Signature::new()
                    .arg("timeout", FLOAT)
                    .arg("polling_interval", FLOAT)
                    .arg("expected_images", NAMES)
                    .arg("not_expected_images", NAMES),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "image_count",
                "Return how many times an image currently occurs in the region of interest.",
                handler!(screen::image_count),
            )
            .signature(image()),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_match_score",
                "Return the similarity score of an image's best match.",
                handler!(screen::get_match_score),
            )
            .signature(image()),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_text",
                "Read text by OCR from the match of an image, or from the region of interest.",
                handler!(screen::get_text),
            )
            .signature(Signature::new().optional("image", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "drag_and_drop",
                "Drag one image onto another.",
                handler!(screen::drag_and_drop),
            )
            .signature(Signature::new().arg("src_image", STR).arg("target_image", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "drag_and_drop_by_offset",
                "Drag an image by a pixel offset.",
                handler!(screen::drag_and_drop_by_offset),
            )
            .signature(
                Signature::new()
                    .arg("src_image", STR)
                    .arg("x_offset", INT)
                    .arg("y_offset", INT),
            ),
        )
        // captures
        .keyword(
            KeywordDescriptor::new(
                "capture_screen",
                "Capture the active screen and embed it in the log.\n\nReturns the saved path.",
                handler!(screen::capture_screen),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "capture_region",
                "Capture a region given as `[x, y, w, h]` and embed it in the log.\n\nReturns the saved path.",
                handler!(screen::capture_region),
            )
            .signature(Signature::new().arg("coordinates", COORDS)),
        )
        .keyword(
            KeywordDescriptor::new(
                "capture_roi",
                "Capture the region of interest and embed it in the log.\n\nReturns the saved path.",
                handler!(screen::capture_roi),
            ),
        )
        // keyboard and mouse
        .keyword(
            KeywordDescriptor::new(
                "press_special_key",
                "Press a named key such as `ENTER`, `TAB`, `ESC`, `PAGE_DOWN` or `F5`.",
                handler!(input::press_special_key),
            )
            .signature(Signature::new().arg("key", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "key_down",
                "Hold a key down. A single character is taken literally, anything longer must name a special key.",
                handler!(input::key_down),
            )
            .signature(Signature::new().arg("key", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "key_up",
                "Release a key held with `Key Down`.",
                handler!(input::key_up),
            )
            .signature(Signature::new().arg("key", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "mouse_move",
                "Move the mouse to the center of an image.",
                handler!(input::mouse_move),
            )
            .signature(image()),
        )
        .keyword(
            KeywordDescriptor::new(
                "mouse_down",
                "Press a mouse button: `LEFT`, `MIDDLE` or `RIGHT`.",
                handler!(input::mouse_down),
            )
            .signature(Signature::new().with_default("button", STR, "LEFT")),
        )
        .keyword(
            KeywordDescriptor::new(
                "mouse_up",
                "Release a mouse button: `LEFT`, `MIDDLE` or `RIGHT`.",
                handler!(input::mouse_up),
            )
            .signature(Signature::new().with_default("button", STR, "LEFT")),
        )
        .keyword(
            KeywordDescriptor::new(
                "wheel_up",
                "Turn the mouse wheel up, over an image or over the center of the region of interest.",
                handler!(input::wheel_up),
            )
            .signature(Signature::new().arg("steps", INT).optional("image", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "wheel_down",
                "Turn the mouse wheel down, over an image or over the center of the region of interest.",
                handler!(input::wheel_down),
            )
            .signature(Signature::new().arg("steps", INT).optional("image", STR)),
        )
        // screens and regions
        .keyword(
            KeywordDescriptor::new(
                "change_screen_id",
                "Make another monitor the active screen. The region of interest is reset to its bounds.",
                handler!(region::change_screen_id),
            )
            .signature(Signature::new().arg("screen_id", INT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_current_screen_id",
                "Return the id of the active screen.",
                handler!(region::get_current_screen_id),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_number_of_screens",
                "Return the number of monitors.",
                handler!(region::get_number_of_screens),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_screen_coordinates",
                "Return `[x, y, w, h]` of a monitor, the active screen by default.",
                handler!(region::get_screen_coordinates),
            )
            .signature(Signature::new().optional("screen_id", INT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_image_coordinates",
                "Return `[x, y, w, h]` of an image's match, searched in the region of interest or in the given region.",
                handler!(region::get_image_coordinates),
            )
            .signature(image().optional("coordinates", COORDS)),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_extended_region_from_image",
                "Return the region next to an image's match.\n\n`direction` is one of `above`, `below`, `left`, `right` or `original`; the region is moved by its own size `number_of_times_to_repeat` times.",
                handler!(region::get_extended_region_from_image),
            )
            .signature(
                image()
                    .arg("direction", STR)
                    .arg("number_of_times_to_repeat", INT),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_extended_region_from_region",
                "Return the region next to a region given as `[x, y, w, h]`.\n\n`direction` is one of `above`, `below`, `left`, `right` or `original`.",
                handler!(region::get_extended_region_from_region),
            )
            .signature(
                Signature::new()
                    .arg("coordinates", COORDS)
                    .arg("direction", STR)
                    .arg("number_of_times_to_repeat", INT),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "read_text_from_region",
                "Read text by OCR from a region given as `[x, y, w, h]`.",
                handler!(region::read_text_from_region),
            )
            .signature(Signature::new().arg("coordinates", COORDS)),
        )
        .keyword(
            KeywordDescriptor::new(
                "set_roi",
                "Set the region of interest, as `[x, y, w, h]` or as four separate values.\n\nWith a timeout the new region is highlighted for that many seconds.",
                handler!(region::set_roi),
            )
            .signature(
                Signature::new()
                    .arg("coordinates", COORDS)
                    .optional("timeout", FLOAT),
            )
            .signature(
                Signature::new()
                    .arg("x", INT)
                    .arg("y", INT)
                    .arg("w", INT)
                    .arg("h", INT),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "get_roi",
                "Return the region of interest as `[x, y, w, h]`.",
                handler!(region::get_roi),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "reset_roi",
                "Make the region of interest the full active screen.",
                handler!(region::reset_roi),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "select_region",
                "Let the user draw a region on the screen and return it as `[x, y, w, h]`.",
                handler!(region::select_region),
            )
            .signature(Signature::new().arg("message", STR)),
        )
        // highlights
        .keyword(
            KeywordDescriptor::new(
                "highlight",
                "Highlight an image's match, for `secs` seconds or until cleared.\n\nHighlighting an image that is already highlighted does nothing.",
                handler!(highlight::highlight),
            )
            .signature(image().optional("secs", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "clear_highlight",
                "Remove the highlight of an image.",
                handler!(highlight::clear_highlight),
            )
            .signature(image()),
        )
        .keyword(
            KeywordDescriptor::new(
                "clear_all_highlights",
                "Remove every highlight.",
                handler!(highlight::clear_all_highlights),
            ),
        )
        .keyword(
            KeywordDescriptor::new(
                "highlight_region",
                "Highlight a region given as `[x, y, w, h]` for `timeout` seconds.",
                handler!(highlight::highlight_region),
            )
            .signature(Signature::new().arg("coordinates", COORDS).arg("timeout", FLOAT)),
        )
        .keyword(
            KeywordDescriptor::new(
                "highlight_roi",
                "Highlight the region of interest for `timeout` seconds.",
                handler!(highlight::highlight_roi),
            )
            .signature(Signature::new().arg("timeout", FLOAT)),
        )
        // applications
        .keyword(
            KeywordDescriptor::new(
                "open_application",
                "Start an application by path or command.",
                handler!(application::open_application),
            )
            .signature(Signature::new().arg("path", STR)),
        )
        .keyword(
            KeywordDescriptor::new(
                "close_application",
                "Close an application by name.",
                handler!(application::close_application),
            )
            .signature(Signature::new().arg("name", STR)),
        )
        .build()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::LibraryContext;
    use crate::context::test_support::context_with;
    use crate::registry::KeywordRegistry;
    use serde_json::Value;
    use sikuli_remote_engine::VirtualScreen;
    use sikuli_remote_protocol::RemoteResult;
    use std::path::Path;
    use std::sync::Arc;

    use crate::dispatch::RemoteDispatchServer;

    /// Dispatch server with the full keyword table over `screen`
    pub async fn dispatcher(screen: Arc<VirtualScreen>, dir: &Path) -> RemoteDispatchServer {
        let ctx: Arc<LibraryContext> = Arc::new(context_with(screen, dir).await);
        let registry: KeywordRegistry = super::registry();
        RemoteDispatchServer::new(registry, ctx)
    }

    /// Run a keyword with string arguments
    pub async fn run(server: &RemoteDispatchServer, name: &str, args: &[&str]) -> RemoteResult {
        let args: Vec<Value> = args.iter().map(|a| Value::String(a.to_string())).collect();
        server.invoke(name, &args, None).await
    }
}
