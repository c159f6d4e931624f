/// Turns a raw tree key into a display segment: `Reading_List` -> `Reading List`.
pub fn format_key(key: &str) -> String {
    key.replace('_', " ")
}
