use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono::offset::LocalResult;
use chrono_tz::Tz;
use crate::domain::models::event::{Event, EventStatus};

const LAST_MILLI_OF_DAY: i64 = 86_399_999;

#[derive(Clone, Copy)]
enum Bias {
    Earliest,
    Latest,
}

fn to_utc(tz: Tz, local: NaiveDateTime, bias: Bias) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, latest) => match bias {
            Bias::Earliest => earliest.with_timezone(&Utc),
            Bias::Latest => latest.with_timezone(&Utc),
        },
        // Local time skipped by a DST jump: use the first instant after the gap.
        LocalResult::None => tz.from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local)),
    }
}

/// 00:00:00.000 of `date` in `tz`.
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    to_utc(tz, date.and_time(NaiveTime::MIN), Bias::Earliest)
}

/// 23:59:59.999 of `date` in `tz`.
pub fn day_end(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN) + TimeDelta::milliseconds(LAST_MILLI_OF_DAY);
    to_utc(tz, local, Bias::Latest)
}

pub fn local_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Lifecycle status of an event dated `date` as seen at `now`.
///
/// `stored` is the last persisted value. A cancelled event stays cancelled whatever `now` is.
/// When none of the date rules match, `stored` is returned unchanged.
pub fn compute_status(stored: EventStatus, date: NaiveDate, now: DateTime<Utc>, tz: Tz) -> EventStatus {
    if stored == EventStatus::Cancelled {
        return EventStatus::Cancelled;
    }

    let start = day_start(date, tz);
    let end = day_end(date, tz);
    let today_start = day_start(local_today(now, tz), tz);

    if now > end {
        EventStatus::Completed
    } else if start <= now && now <= end {
        EventStatus::Ongoing
    } else if start > today_start {
        EventStatus::Upcoming
    } else {
        stored
    }
}

pub fn is_registration_open(event: &Event, now: DateTime<Utc>, tz: Tz) -> bool {
    if event.status_at(now, tz) != EventStatus::Upcoming {
        return false;
    }
    if event.is_full() {
        return false;
    }
    match event.registration_deadline {
        Some(deadline) => now <= day_end(deadline, tz),
        None => true,
    }
}
