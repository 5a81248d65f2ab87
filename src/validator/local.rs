/// Règles strictes: atext ASCII + '.' non initial/terminal, pas de ".."
pub(crate) fn is_local_strict(s: &str) -> bool {
    if !has_valid_dots(s) {
        return false;
    }
    s.chars().all(|c| c.is_ascii_alphanumeric() || is_atext_symbol(c) || c == '.')
}

/// Règles relaxed: quoted-string simple, ou atext étendu aux
/// alphanumériques Unicode (adresses internationalisées).
pub(crate) fn is_local_relaxed(s: &str) -> bool {
    if is_quoted(s) {
        return !s[1..s.len() - 1].contains(['\r', '\n']);
    }
    if !has_valid_dots(s) {
        return false;
    }
    s.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || is_atext_symbol(c)
            || c == '.'
            || (!c.is_ascii() && c.is_alphanumeric())
    })
}

pub(crate) fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

fn has_valid_dots(s: &str) -> bool {
    !(s.starts_with('.') || s.ends_with('.') || s.contains(".."))
}

fn is_atext_symbol(c: char) -> bool {
    matches!(
        c,
        '!' | '#'
            | '$'
            | '%'
            | '&'
            | '\''
            | '*'
            | '+'
            | '-'
            | '/'
            | '='
            | '?'
            | '^'
            | '_'
            | '`'
            | '{'
            | '|'
            | '}'
            | '~'
    )
}
