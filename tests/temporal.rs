use chrono::NaiveDate;
use medin::temporal::{parse_date, parse_datetime, parse_lenient, MetadataDate, Precision, TemporalValue};

#[test]
fn partial_dates_keep_their_precision() {
    let year = parse_date("2003").expect("year");
    assert_eq!(year, TemporalValue::Year(2003));
    assert_eq!(year.precision(), Precision::Year);
    assert_eq!(year.month(), None, "a year must not pretend to have a month");
    assert_eq!(year.day(), None);

    let month = parse_date("2003-04").expect("year and month");
    assert_eq!(month, TemporalValue::YearMonth(2003, 4));
    assert_eq!(month.precision(), Precision::Month);
    assert_eq!(month.day(), None, "a month must not pretend to have a day");

    let day = parse_date(" 2003-04-17 ").expect("full date");
    assert_eq!(day.precision(), Precision::Day);
    assert_eq!((day.year(), day.month(), day.day()), (2003, Some(4), Some(17)));
}

#[test]
fn temporal_values_print_at_their_precision() {
    assert_eq!(parse_date("2003").expect("year").to_string(), "2003");
    assert_eq!(parse_date("2003-04").expect("month").to_string(), "2003-04");
    assert_eq!(parse_date("2003-04-17").expect("day").to_string(), "2003-04-17");
    assert_eq!(
        serde_json::to_value(parse_date("1988-03").expect("month")).expect("json"),
        serde_json::json!("1988-03")
    );
}

#[test]
fn impossible_dates_are_rejected() {
    assert!(parse_date("2003-13-01").is_err(), "month 13 must fail");
    assert!(parse_date("2003-02-30").is_err(), "february 30 must fail");
    assert!(parse_date("2003-00").is_err(), "month 0 must fail");
    assert!(parse_date("not-a-date").is_err());
    assert!(parse_date("").is_err());
    assert!(parse_date("03-04-17").is_err(), "two digit years are not dates");
}

#[test]
fn timestamps_parse_with_and_without_fractions() {
    let expected = NaiveDate::from_ymd_opt(2010, 1, 5).and_then(|d| d.and_hms_opt(10, 30, 0)).expect("timestamp");
    assert_eq!(parse_datetime("2010-01-05T10:30:00").expect("plain"), expected);
    let fractional = parse_datetime("2010-01-05T10:30:00.250").expect("fractional");
    assert_eq!(fractional.date(), expected.date());
    assert!(parse_datetime("2010-01-05").is_err(), "a bare date is not a timestamp");
    assert!(parse_datetime("2010-01-05T25:00:00").is_err());
}

#[test]
fn lenient_parsing_truncates_timestamps_to_their_date() {
    let value = parse_lenient("2008-06-30T12:00:00").expect("timestamp");
    assert_eq!(value, TemporalValue::Date(NaiveDate::from_ymd_opt(2008, 6, 30).expect("date")));
    assert_eq!(parse_lenient("2008").expect("year"), TemporalValue::Year(2008));
    assert!(parse_lenient("summer 2008").is_err());
}

#[test]
fn metadata_dates_print_in_their_source_form() {
    let date = MetadataDate::Date(parse_date("2009-11-10").expect("date"));
    assert_eq!(date.to_string(), "2009-11-10");
    let stamp = MetadataDate::DateTime(parse_datetime("2010-01-05T10:30:00").expect("timestamp"));
    assert_eq!(stamp.to_string(), "2010-01-05T10:30:00");
}
