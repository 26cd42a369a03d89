use crate::application::checkout::CheckoutSnapshot;
use crate::domain::order::OrderHistory;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Final output of a scripted run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub checkout: CheckoutSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<OrderHistory>,
}

pub struct ReportWriter<W: Write> {
    writer: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_report(&mut self, report: &RunReport) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::checkout::CheckoutState;
    use crate::domain::money::Price;

    fn browsing() -> CheckoutSnapshot {
        CheckoutSnapshot {
            state: CheckoutState::Browsing,
            store: None,
            lines: Vec::new(),
            total: Price::ZERO,
            last_failure: None,
            confirmation: None,
        }
    }

    #[test]
    fn test_write_report_without_history() {
        let mut buffer = Vec::new();
        let report = RunReport {
            checkout: browsing(),
            history: None,
        };
        ReportWriter::new(&mut buffer).write_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["checkout"]["state"], "browsing");
        assert_eq!(value["checkout"]["total"], "0");
        assert!(value.get("history").is_none());
    }

    #[test]
    fn test_write_report_with_history() {
        let mut buffer = Vec::new();
        let report = RunReport {
            checkout: browsing(),
            history: Some(OrderHistory {
                diner_id: "3".to_string(),
                orders: Vec::new(),
            }),
        };
        ReportWriter::new(&mut buffer).write_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["history"]["dinerId"], "3");
        assert_eq!(value["history"]["orders"], serde_json::json!([]));
    }
}
