#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::util::*;

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
}

#[test]
fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
}

#[test]
fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 5), "hell…");
}

#[test]
fn test_truncate_zero_max() {
    assert_eq!(truncate("hello", 0), "");
}

#[test]
fn test_truncate_unicode() {
    assert_eq!(truncate("東京スカイツリー", 4), "東京ス…");
}

#[test]
fn test_truncate_one_char() {
    assert_eq!(truncate("hello", 1), "…");
    assert_eq!(truncate("a", 1), "a");
}

// ── format_money ──────────────────────────────────────────────

#[test]
fn test_format_money_usd() {
    assert_eq!(format_money(dec!(1234.56), "USD"), "$1,234.56");
}

#[test]
fn test_format_money_symbols() {
    assert_eq!(format_money(dec!(2500), "EUR"), "€2,500.00");
    assert_eq!(format_money(dec!(80.5), "GBP"), "£80.50");
    assert_eq!(format_money(dec!(150000), "JPY"), "¥150,000.00");
}

#[test]
fn test_format_money_lowercase_code() {
    assert_eq!(format_money(dec!(10), "usd"), "$10.00");
}

#[test]
fn test_format_money_unknown_code_suffix() {
    assert_eq!(format_money(dec!(1999.9), "CHF"), "1,999.90 CHF");
    assert_eq!(format_money(dec!(-5), "thb"), "-5.00 THB");
}

#[test]
fn test_format_money_negative() {
    assert_eq!(format_money(dec!(-42.50), "USD"), "-$42.50");
}

#[test]
fn test_format_money_zero_and_millions() {
    assert_eq!(format_money(dec!(0), "USD"), "$0.00");
    assert_eq!(format_money(dec!(10000000.00), "USD"), "$10,000,000.00");
}

// ── format_percent ────────────────────────────────────────────

#[test]
fn test_format_percent() {
    assert_eq!(format_percent(25.0), "25.0%");
    assert_eq!(format_percent(23.684_210_526), "23.7%");
    assert_eq!(format_percent(100.0), "100.0%");
}

#[test]
fn test_format_percent_no_negative_zero() {
    assert_eq!(format_percent(-1e-9), "0.0%");
}

// ── progress_bar ──────────────────────────────────────────────

#[test]
fn test_progress_bar_fill() {
    assert_eq!(progress_bar(0.5, 4), "[██░░]");
    assert_eq!(progress_bar(0.0, 3), "[░░░]");
}

#[test]
fn test_progress_bar_clamps() {
    assert_eq!(progress_bar(1.7, 2), "[██]");
    assert_eq!(progress_bar(-0.3, 2), "[░░]");
    assert_eq!(progress_bar(f64::NAN, 2), "[░░]");
}

// ── scrolling ─────────────────────────────────────────────────

#[test]
fn test_scroll_down_moves_window() {
    let (mut index, mut scroll) = (0, 0);
    for _ in 0..5 {
        scroll_down(&mut index, &mut scroll, 10, 3);
    }
    assert_eq!(index, 5);
    assert_eq!(scroll, 3);
}

#[test]
fn test_scroll_down_stops_at_end() {
    let (mut index, mut scroll) = (1, 0);
    scroll_down(&mut index, &mut scroll, 2, 5);
    assert_eq!(index, 1);
}

#[test]
fn test_scroll_up_and_jumps() {
    let (mut index, mut scroll) = (4, 4);
    scroll_up(&mut index, &mut scroll);
    assert_eq!((index, scroll), (3, 3));

    scroll_to_bottom(&mut index, &mut scroll, 10, 4);
    assert_eq!((index, scroll), (9, 6));

    scroll_to_top(&mut index, &mut scroll);
    assert_eq!((index, scroll), (0, 0));
}

// ── parsing ───────────────────────────────────────────────────

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("1200").unwrap(), dec!(1200));
    assert_eq!(parse_amount("$1,200.50").unwrap(), dec!(1200.50));
    assert_eq!(parse_amount(" 80 EUR ").unwrap(), dec!(80));
    assert!(parse_amount("lots").is_err());
    assert!(parse_amount("1.2.3").is_err());
}

#[test]
fn test_parse_amount_signs_and_codes() {
    assert_eq!(parse_amount("-$42.50").unwrap(), dec!(-42.50));
    assert_eq!(parse_amount("$-42.50").unwrap(), dec!(-42.50));
    assert_eq!(parse_amount("EUR 1,999.90").unwrap(), dec!(1999.90));
    assert_eq!(parse_amount("12,345,678").unwrap(), dec!(12345678));
    assert_eq!(parse_amount("0.5€").unwrap(), dec!(0.5));
}

#[test]
fn test_parse_amount_rejects_malformed() {
    for bad in [
        "2 x 40", "1e3", "12abc34", "1 200,50", "1,20", "12,3456", ",100", "100.", ".", "-", "$", "",
        "--5", "80 EURO", "$$80",
    ] {
        assert!(parse_amount(bad).is_err(), "accepted {bad:?}");
    }
}

#[test]
fn test_parse_date() {
    assert_eq!(
        parse_date("2025-04-01").unwrap(),
        chrono::NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    );
    assert!(parse_date("04/01/2025").is_err());
    assert!(parse_date("2025-02-30").is_err());
}

#[test]
fn test_parse_percent() {
    assert_eq!(parse_percent("40").unwrap(), 40.0);
    assert_eq!(parse_percent("12.5%").unwrap(), 12.5);
    assert!(parse_percent("abc").is_err());
    assert!(parse_percent("inf").is_err());
}
