// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Parsing of time-typed axis labels.
//!
//! A time dimension carries a format string.  An empty format means "any
//! recognisable calendar date"; otherwise the format is a small subset of
//! strftime: `%Y`, `%m`, `%d`, `%H`, `%M`, `%S` and `%Q` (calendar quarter),
//! with every other character matched literally.

use lazy_static::lazy_static;
use regex::Regex;

/// Format used for labels like `2021-Q3`.
pub const QUARTER_FORMAT: &str = "%Y-Q%Q";

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeStamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeStamp {
    fn new(year: i32, month: u32, day: u32) -> Self {
        TimeStamp {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 61
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

lazy_static! {
    static ref ISO_DATE_RE: Regex = Regex::new(
        r"^(\d{4})[-/](\d{1,2})(?:[-/](\d{1,2}))?(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?$"
    )
    .unwrap();
    static ref DMY_DATE_RE: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap();
}

fn capture_u32(caps: &regex::Captures, i: usize) -> Option<u32> {
    caps.get(i).and_then(|m| m.as_str().parse().ok())
}

/// Parse a calendar date without a prescribed format.
pub fn parse_date(text: &str) -> Option<TimeStamp> {
    let text = text.trim();
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month = capture_u32(&caps, 2)?;
        let day = capture_u32(&caps, 3).unwrap_or(1);
        let mut ts = TimeStamp::new(year, month, day);
        ts.hour = capture_u32(&caps, 4).unwrap_or(0);
        ts.minute = capture_u32(&caps, 5).unwrap_or(0);
        ts.second = capture_u32(&caps, 6).unwrap_or(0);
        return Some(ts).filter(TimeStamp::is_valid);
    }
    if let Some(caps) = DMY_DATE_RE.captures(text) {
        let ts = TimeStamp::new(
            caps[3].parse().ok()?,
            capture_u32(&caps, 2)?,
            capture_u32(&caps, 1)?,
        );
        return Some(ts).filter(TimeStamp::is_valid);
    }
    None
}

// reads up to max_len ascii digits from the front of text
fn take_digits(text: &str, max_len: usize) -> Option<(u32, &str)> {
    let len = text
        .bytes()
        .take(max_len)
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len == 0 {
        return None;
    }
    Some((text[..len].parse().ok()?, &text[len..]))
}

/// Parse `text` according to a time dimension's format string.
pub fn parse_time(format: &str, text: &str) -> Option<TimeStamp> {
    if format.is_empty() {
        return parse_date(text);
    }

    let mut ts = TimeStamp::new(0, 1, 1);
    let mut rest = text.trim();
    let mut spec = format.chars();
    while let Some(c) = spec.next() {
        if c != '%' {
            rest = rest.strip_prefix(c)?;
            continue;
        }
        let directive = spec.next()?;
        if directive == '%' {
            rest = rest.strip_prefix('%')?;
            continue;
        }
        let max_len = match directive {
            'Y' => 4,
            'Q' => 1,
            _ => 2,
        };
        let (value, tail) = take_digits(rest, max_len)?;
        match directive {
            'Y' => ts.year = value as i32,
            'm' => ts.month = value,
            'd' => ts.day = value,
            'H' => ts.hour = value,
            'M' => ts.minute = value,
            'S' => ts.second = value,
            'Q' => {
                if !(1..=4).contains(&value) {
                    return None;
                }
                ts.month = 3 * (value - 1) + 1;
            }
            _ => return None,
        }
        rest = tail;
    }

    if !rest.is_empty() {
        return None;
    }
    Some(ts).filter(TimeStamp::is_valid)
}
