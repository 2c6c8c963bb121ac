//! Plain-text report for `--view report`.

use std::io::{self, Write};

use insights_core::formatting::{format_amount, format_number, format_usd};
use insights_core::models::{Dimension, SummaryTable};
use insights_data::aggregator::PayoutAggregator;
use insights_runtime::session::DashboardSnapshot;

/// Width of the key column in summary listings.
const KEY_WIDTH: usize = 28;

/// Write the KPIs followed by the endpoint, customer, and month summaries.
pub fn write_report<W: Write>(out: &mut W, snapshot: &DashboardSnapshot) -> io::Result<()> {
    writeln!(
        out,
        "Generated {} (load {} ms, transform {:.3} s)",
        snapshot.metadata.generated_at,
        snapshot.metadata.load_time_ms,
        snapshot.metadata.transform_time_seconds
    )?;
    writeln!(out)?;
    writeln!(out, "KPIs")?;
    writeln!(out, "  Total Amount   {}", format_usd(snapshot.kpis.total_amount))?;
    writeln!(out, "  Payout Amount  {}", format_usd(snapshot.kpis.payout_amount))?;
    writeln!(
        out,
        "  Rows           {} of {}",
        format_number(snapshot.metadata.rows_filtered as f64, 0),
        format_number(snapshot.metadata.rows_total as f64, 0)
    )?;
    if let Some(range) = snapshot.date_range {
        writeln!(out, "  Date range     {}", range)?;
    }

    for (title, dimension) in [
        ("Payout by API endpoint", Dimension::Endpoint),
        ("Payout by customer", Dimension::Customer),
        ("Payout by month", Dimension::Month),
    ] {
        writeln!(out)?;
        write_summary(out, title, snapshot.summary(dimension))?;
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, title: &str, summary: &SummaryTable) -> io::Result<()> {
    writeln!(out, "{}", title)?;
    if summary.is_empty() {
        writeln!(out, "  (no rows)")?;
        return Ok(());
    }
    for row in &summary.rows {
        writeln!(
            out,
            "  {:<width$} {:>14}",
            row.key,
            format_amount(row.totals.payout_amount),
            width = KEY_WIDTH
        )?;
    }
    let totals = PayoutAggregator::calculate_totals(summary);
    writeln!(
        out,
        "  {:<width$} {:>14}",
        "TOTAL",
        format_amount(totals.payout_amount),
        width = KEY_WIDTH
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use insights_core::models::{PayoutRecord, PayoutTable};
    use insights_runtime::session::SessionContext;

    fn make_session(rows: Vec<(&str, f64, &str, &str)>) -> SessionContext {
        let table = rows
            .into_iter()
            .map(|(created, payout, customer, endpoint)| PayoutRecord {
                created_at: NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S").unwrap(),
                total_amount: Some(payout),
                payout_amount: Some(payout),
                paid: Some(true),
                paidout: Some(true),
                additional_amount: None,
                refunded: Some(false),
                refunded_amount: None,
                id: None,
                plan_price: None,
                customer: customer.to_string(),
                endpoint: endpoint.to_string(),
            })
            .collect::<PayoutTable>();
        SessionContext::from_table(table, None)
    }

    fn render(session: &SessionContext) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, &session.snapshot()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_report_sections_in_order() {
        let session = make_session(vec![
            ("2021-03-15 10:00:00", 100.0, "acme", "foo"),
            ("2022-06-01 09:00:00", 50.0, "globex", "bar"),
        ]);
        let text = render(&session);

        let kpis = text.find("KPIs").unwrap();
        let endpoint = text.find("Payout by API endpoint").unwrap();
        let customer = text.find("Payout by customer").unwrap();
        let month = text.find("Payout by month").unwrap();
        assert!(kpis < endpoint && endpoint < customer && customer < month);

        assert!(text.starts_with("Generated "));
        assert!(text.contains("transform "));
        assert!(text.contains("Payout Amount  USD 150.00"));
        assert!(text.contains("2021-03"));
        assert!(text.contains("2022-06"));
    }

    #[test]
    fn test_report_customer_order_descending() {
        let session = make_session(vec![
            ("2021-03-15 10:00:00", 10.0, "small", "foo"),
            ("2021-03-16 10:00:00", 90.0, "large", "foo"),
        ]);
        let text = render(&session);
        let section = &text[text.find("Payout by customer").unwrap()..];
        assert!(section.find("large").unwrap() < section.find("small").unwrap());
    }

    #[test]
    fn test_report_summaries_end_with_total() {
        let session = make_session(vec![
            ("2021-03-15 10:00:00", 1000.0, "acme", "foo"),
            ("2021-04-16 10:00:00", 250.5, "globex", "bar"),
        ]);
        let text = render(&session);
        let totals: Vec<&str> = text
            .lines()
            .filter(|l| l.trim_start().starts_with("TOTAL"))
            .collect();
        assert_eq!(totals.len(), 3);
        assert!(totals.iter().all(|l| l.ends_with("1,250.50")));
    }

    #[test]
    fn test_report_empty_filter() {
        let mut session = make_session(vec![("2021-03-15 10:00:00", 10.0, "acme", "foo")]);
        session.set_endpoints(["none"]);
        let text = render(&session);
        assert!(text.contains("USD 0.00"));
        assert_eq!(text.matches("(no rows)").count(), 3);
    }
}
