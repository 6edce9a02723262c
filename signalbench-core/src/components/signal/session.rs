//! Session bucketing for time-of-day strategies.
//!
//! A session is the recurring window [session_start, session_end) and may
//! cross midnight. Every timestamp is measured as an offset from the most
//! recent session_start (mod 24h); sub-windows are half-open ranges of that
//! offset. A bar belongs to the session keyed by the calendar date of
//! (timestamp - session_start), so with a 22:00 start a 01:00 bar belongs to
//! the previous day's session and a bar exactly at 22:00 opens a new one.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::domain::Bar;

const DAY_SECS: u32 = 24 * 60 * 60;

/// Session layout for the VWAP + Initial Balance family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindows {
    pub session_start: NaiveTime,
    pub session_end: NaiveTime,
    pub ib_start: NaiveTime,
    pub ib_end: NaiveTime,
}

/// One session's bars split into its two sub-windows.
#[derive(Debug, Clone)]
pub struct SessionSlice<'a> {
    pub key: NaiveDate,
    pub initial_balance: Vec<&'a Bar>,
    pub trading: Vec<&'a Bar>,
}

impl SessionWindows {
    /// Seconds since the most recent session_start, in [0, 86400).
    pub fn offset(&self, t: NaiveTime) -> u32 {
        let t = t.num_seconds_from_midnight();
        let s = self.session_start.num_seconds_from_midnight();
        (t + DAY_SECS - s) % DAY_SECS
    }

    /// Session date for a timestamp: calendar date of (ts - session_start).
    pub fn session_key(&self, ts: NaiveDateTime) -> NaiveDate {
        let anchor = chrono::Duration::seconds(i64::from(
            self.session_start.num_seconds_from_midnight(),
        ));
        (ts - anchor).date()
    }

    /// Session length; an end equal to the start means a full day.
    fn session_len(&self) -> u32 {
        match self.offset(self.session_end) {
            0 => DAY_SECS,
            len => len,
        }
    }

    /// Half-open membership of `t` in [from, to), both measured as offsets.
    fn within(&self, t: NaiveTime, from: NaiveTime, to: NaiveTime) -> bool {
        let off = self.offset(t);
        let lo = self.offset(from);
        let hi = match self.offset(to) {
            0 => DAY_SECS,
            hi => hi,
        };
        lo <= off && off < hi && off < self.session_len()
    }

    pub fn in_session(&self, t: NaiveTime) -> bool {
        self.offset(t) < self.session_len()
    }

    pub fn in_initial_balance(&self, t: NaiveTime) -> bool {
        self.within(t, self.ib_start, self.ib_end)
    }

    /// Trading window is [ib_end, session_end).
    pub fn in_trading_window(&self, t: NaiveTime) -> bool {
        self.within(t, self.ib_end, self.session_end)
    }

    /// Group bars into sessions in timestamp order.
    ///
    /// Bars outside the session window are dropped. Sessions are contiguous
    /// runs because keys are monotone in time.
    pub fn split<'a>(&self, bars: &'a [Bar]) -> Vec<SessionSlice<'a>> {
        let mut sessions: Vec<SessionSlice<'a>> = Vec::new();
        for bar in bars {
            let t = bar.time_of_day();
            if !self.in_session(t) {
                continue;
            }
            let key = self.session_key(bar.timestamp);
            if sessions.last().map_or(true, |s| s.key != key) {
                sessions.push(SessionSlice {
                    key,
                    initial_balance: Vec::new(),
                    trading: Vec::new(),
                });
            }
            let Some(current) = sessions.last_mut() else {
                continue;
            };
            if self.in_initial_balance(t) {
                current.initial_balance.push(bar);
            }
            if self.in_trading_window(t) {
                current.trading.push(bar);
            }
        }
        sessions
    }
}
