//! Tool name → configuration key
//!
//! A tool such as `arm-none-eabi-gcc` is configured through variables named
//! `CC_LOGGER_OUTPUT_ARG_ARM_NONE_EABI_GCC`, so the tool name has to be folded
//! into something that is valid inside an environment variable name.

/// Maximum key length in bytes. Longer tool names are truncated, so two tools
/// whose names share the first `TOOL_KEY_MAX_LEN` bytes share a key.
pub const TOOL_KEY_MAX_LEN: usize = 100;

/// Fold a tool name into its configuration key.
///
/// ASCII letters are upper-cased, ASCII digits kept, every other byte becomes
/// `_`. The mapping is per byte, so a multi-byte character such as `ü`
/// yields one `_` for each of its UTF-8 bytes.
pub fn tool_key(tool_name: &str) -> String {
    tool_name
        .bytes()
        .take(TOOL_KEY_MAX_LEN)
        .map(|b| {
            if b.is_ascii_alphanumeric() {
                char::from(b.to_ascii_uppercase())
            } else {
                '_'
            }
        })
        .collect()
}
