//! The CSV rendering of a report.

use time::error::Format;

use crate::{Error, report::{REPORT_COLUMNS, ReportRow}, validation::DATE_FORMAT};

/// Write the header and one record per row.
///
/// Dates use the format YYYY-MM-DD, amounts have two decimal places and
/// missing comments are empty fields.
pub fn write_csv(rows: &[ReportRow]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(REPORT_COLUMNS)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for row in rows {
        let date = row
            .date
            .format(DATE_FORMAT)
            .map_err(|error: Format| Error::CsvError(error.to_string()))?;
        let amount = row.amount.to_string();

        writer
            .write_record([
                row.section.label(),
                &date,
                &row.category,
                &amount,
                row.comment.as_deref().unwrap_or_default(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

#[cfg(test)]
mod write_csv_tests {
    use time::macros::date;

    use crate::{Amount, report::ReportRow, transaction::TransactionKind};

    use super::write_csv;

    #[test]
    fn empty_report_has_only_the_header() {
        let csv = write_csv(&[]).unwrap();

        assert_eq!(String::from_utf8(csv).unwrap(), "Section,Date,Category,Amount,Comment\n");
    }

    #[test]
    fn missing_comment_is_an_empty_field() {
        let rows = [ReportRow {
            section: TransactionKind::Income,
            date: date!(2024 - 01 - 15),
            category: "Salary".to_owned(),
            amount: Amount::parse("100").unwrap(),
            comment: None,
        }];

        let csv = write_csv(&rows).unwrap();

        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Section,Date,Category,Amount,Comment\nIncome,2024-01-15,Salary,100.00,\n"
        );
    }
}
