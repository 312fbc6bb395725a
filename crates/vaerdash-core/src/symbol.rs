/// Fallback symbol when an entry carries no summary window at all.
pub const DEFAULT_SYMBOL: &str = "cloudy";

/// Human-readable text for a symbol code: "heavyrainshowers_day" becomes
/// "heavyrainshowers day". The UI picks icons from the raw code; this text
/// backs alt attributes and tooltips.
pub fn display_text(symbol: &str) -> String {
    if symbol.is_empty() {
        return "ukjent vær".to_string();
    }
    symbol.replace(['_', '-'], " ")
}
