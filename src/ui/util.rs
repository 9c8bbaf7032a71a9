use rust_decimal::Decimal;

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"1,234,567.89"`
fn group_thousands(val: Decimal) -> String {
    let formatted = format!("{:.2}", val.abs());
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    format!("{with_commas}.{dec_part}")
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        "KRW" => Some("₩"),
        _ => None,
    }
}

/// Money in the trip's currency: `$1,234.56` for well-known codes,
/// `1,234.56 CHF` otherwise.
pub(crate) fn format_money(val: Decimal, currency: &str) -> String {
    let sign = if val < Decimal::ZERO { "-" } else { "" };
    let digits = group_thousands(val);
    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{digits}"),
        None => format!("{sign}{digits} {}", currency.to_ascii_uppercase()),
    }
}

pub(crate) fn format_percent(pct: f64) -> String {
    // Avoid printing "-0.0%" for tiny negative drift.
    let pct = if pct.abs() < 0.05 { 0.0 } else { pct };
    format!("{pct:.1}%")
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// The result is guaranteed to be at most `max` characters (counting "…" as one).
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// `[████░░░░]` style gauge; `ratio` is clamped to 0..=1.
pub(crate) fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Move a list cursor down by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_down(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if *index + 1 < len {
        *index += 1;
        if *index >= *scroll + page {
            *scroll = index.saturating_sub(page.saturating_sub(1));
        }
    }
}

/// Move a list cursor up by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_up(index: &mut usize, scroll: &mut usize) {
    *index = index.saturating_sub(1);
    if *index < *scroll {
        *scroll = *index;
    }
}

pub(crate) fn scroll_to_top(index: &mut usize, scroll: &mut usize) {
    *index = 0;
    *scroll = 0;
}

pub(crate) fn scroll_to_bottom(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if len > 0 {
        *index = len - 1;
        *scroll = index.saturating_sub(page.saturating_sub(1));
    }
}

/// Parse a money amount typed by the user: `1200`, `1,200.50`, `$80`,
/// `80 EUR`. Anything besides one currency marker, a sign, digits,
/// well-placed thousands commas and one decimal point is rejected.
pub(crate) fn parse_amount(input: &str) -> anyhow::Result<Decimal> {
    let invalid = || anyhow::anyhow!("Not an amount: '{input}'");

    let mut rest = input.trim();
    let mut negative = false;
    if let Some(r) = rest.strip_prefix('-') {
        negative = true;
        rest = r.trim_start();
    }
    rest = strip_currency(rest);
    if !negative {
        if let Some(r) = rest.strip_prefix('-') {
            negative = true;
            rest = r;
        }
    }

    let (whole, fraction) = match rest.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (rest, None),
    };
    if !valid_whole(whole) {
        return Err(invalid());
    }
    if let Some(f) = fraction {
        if f.is_empty() || !f.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
    }

    let mut digits = whole.replace(',', "");
    if let Some(f) = fraction {
        digits.push('.');
        digits.push_str(f);
    }
    let value = digits
        .parse::<Decimal>()
        .map_err(|e| anyhow::anyhow!("Not an amount: '{input}' ({e})"))?;
    Ok(if negative { -value } else { value })
}

/// Drop one leading or trailing currency symbol or three-letter code.
fn strip_currency(s: &str) -> &str {
    const SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩'];
    let is_code = |code: &str| code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic());

    if let Some(r) = s.strip_prefix(SYMBOLS) {
        return r.trim_start();
    }
    if let Some(r) = s.strip_suffix(SYMBOLS) {
        return r.trim_end();
    }
    if let Some((code, r)) = s.split_once(char::is_whitespace) {
        if is_code(code) {
            return r.trim_start();
        }
    }
    if let Some((r, code)) = s.rsplit_once(char::is_whitespace) {
        if is_code(code) {
            return r.trim_end();
        }
    }
    s
}

/// `1200` or `1,200` style digits; commas only between groups of three.
fn valid_whole(whole: &str) -> bool {
    let mut groups = whole.split(',');
    let Some(first) = groups.next() else {
        return false;
    };
    let all_digits = |g: &str| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit());
    if !all_digits(first) {
        return false;
    }
    let rest: Vec<&str> = groups.collect();
    if rest.is_empty() {
        return true;
    }
    first.len() <= 3 && rest.iter().all(|g| g.len() == 3 && all_digits(g))
}

pub(crate) fn parse_date(input: &str) -> anyhow::Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{input}'. Use YYYY-MM-DD"))
}

/// Percent typed by the user, with or without a trailing `%`.
pub(crate) fn parse_percent(input: &str) -> anyhow::Result<f64> {
    let value: f64 = input
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| anyhow::anyhow!("Not a percentage: '{input}'"))?;
    if !value.is_finite() {
        anyhow::bail!("Not a percentage: '{input}'");
    }
    Ok(value)
}
