/// Splits message text into whitespace-separated tokens. A double quote at the start of a
/// token opens a phrase that runs to the next double quote; an unterminated quote is kept
/// as ordinary text.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('"') {
            if let Some(end) = quoted.find('"') {
                tokens.push(quoted[..end].to_string());
                rest = quoted[end + 1..].trim_start();
                continue;
            }
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        tokens.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }

    tokens
}
