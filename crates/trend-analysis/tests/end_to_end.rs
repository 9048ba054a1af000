//! Table in, trend table and summary out.

use std::fs;

use chrono::NaiveDate;
use trend_analysis::{
    analyze_trends, read_table, summarize_trends, write_summary, write_trend_table,
    AnalysisOptions, SortKey, TableSchema, TimeSeriesRecord, TrendColumns, TrendDirection,
};
use test_utils::{assert_approx_eq, constant_series, linear_series};

/// Three units over ten irrigation years: A rising, B flat, C falling.
/// Dates alternate between November (counted in the next irrigation year)
/// and spring months so the derived year matters.
fn three_unit_records() -> Vec<TimeSeriesRecord> {
    let series = [
        ("A", linear_series(10, 100.0, 5.0)),
        ("B", constant_series(10, 250.0)),
        ("C", linear_series(10, 400.0, -7.0)),
    ];

    let mut records = Vec::new();
    // Reverse order so sorting is exercised
    for i in (0..10).rev() {
        let irrigation_year = 2011 + i as i32;
        let date = if i % 2 == 0 {
            NaiveDate::from_ymd_opt(irrigation_year - 1, 11, 15)
        } else {
            NaiveDate::from_ymd_opt(irrigation_year, 4, 1)
        };
        for (unit, values) in &series {
            records.push(TimeSeriesRecord::new(*unit, date).with_value("ppt", values[i]));
        }
    }
    records
}

#[test]
fn test_one_of_each_label() {
    let records = three_unit_records();
    let rows = analyze_trends(&records, &["ppt"], &AnalysisOptions::default());

    let labels: Vec<_> = rows
        .iter()
        .map(|r| (r.unit.as_str(), r.get("ppt").unwrap().trend()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("A", Some(TrendDirection::Increasing)),
            ("B", Some(TrendDirection::NoTrend)),
            ("C", Some(TrendDirection::Decreasing)),
        ]
    );

    let a = rows[0].get("ppt").unwrap();
    assert_approx_eq!(a.slope().unwrap(), 5.0, 1e-9);
    assert!(a.p_value().unwrap() < 0.05);
    assert_eq!(rows[1].get("ppt").unwrap().slope(), Some(0.0));
    assert_approx_eq!(rows[2].get("ppt").unwrap().slope().unwrap(), -7.0, 1e-9);

    let summary = summarize_trends(&rows, &["ppt"]);
    assert_eq!(summary.len(), 1);
    assert_eq!(
        (summary[0].increasing, summary[0].decreasing, summary[0].no_trend),
        (1, 1, 1)
    );
}

#[test]
fn test_calendar_year_sort_differs() {
    // Sorting by calendar year puts each November record before the spring
    // record of the same calendar year, scrambling unit A's sequence
    let records = three_unit_records();
    let options = AnalysisOptions {
        sort_key: SortKey::CalendarYear,
        ..AnalysisOptions::default()
    };
    let rows = analyze_trends(&records, &["ppt"], &options);
    let by_irrigation = analyze_trends(&records, &["ppt"], &AnalysisOptions::default());
    assert_ne!(
        rows[0].get("ppt").unwrap().stats().unwrap().s,
        by_irrigation[0].get("ppt").unwrap().stats().unwrap().s
    );
}

#[test]
fn test_csv_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("huc_monthly.csv");

    let mut csv = String::from("huc12,Date,ppt,et\n");
    for (i, year) in (2005..2015).enumerate() {
        csv.push_str(&format!("170100,{}-12-01,{},\n", year, 10.0 + i as f64));
        csv.push_str(&format!("170200,{}-06-01,{},{}\n", year, 50.0 - i as f64, 1.0));
    }
    fs::write(&input, csv).unwrap();

    let table = read_table(&input, &TableSchema::default()).unwrap();
    table.require_columns(&["ppt", "et"]).unwrap();

    let variables = ["ppt", "et"];
    let rows = analyze_trends(&table.records, &variables, &AnalysisOptions::default());
    assert_eq!(rows.len(), 2);
    // Unit 170100 has no et values at all
    assert!(rows[0].get("et").unwrap().trend().is_none());
    assert_eq!(rows[1].get("et").unwrap().trend(), Some(TrendDirection::NoTrend));

    let trend_path = dir.path().join("trends.csv");
    write_trend_table(
        fs::File::create(&trend_path).unwrap(),
        "huc12",
        &rows,
        &variables,
        TrendColumns::Basic,
    )
    .unwrap();
    let written = fs::read_to_string(&trend_path).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("huc12,ppt_slope,ppt_p,ppt_trend,et_slope,et_p,et_trend")
    );
    assert!(lines.next().unwrap().ends_with(",increasing,,,"));

    let summary_path = dir.path().join("summary.csv");
    write_summary(
        fs::File::create(&summary_path).unwrap(),
        &summarize_trends(&rows, &variables),
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(&summary_path).unwrap(),
        "Variable,Increasing,Decreasing,No Trend\nppt,1,1,0\net,0,0,1\n"
    );
}
