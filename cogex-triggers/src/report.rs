use crate::error::{Result, TriggerError};
use crate::ledger::TriggerLedger;
use crate::port::OutputPort;
use crate::record::TriggerRecord;
use cogex_timing::Timer;
use std::path::Path;

/// Placeholder for a registered field a record never received.
pub const UNKNOWN: &str = "UNKNOWN";

impl<P: OutputPort, T: Timer> TriggerLedger<P, T> {
    /// Header cells followed by one row of cells per record.
    pub fn trigger_rows(&self) -> Vec<Vec<String>> {
        let params = self.params();
        let mut rows = Vec::with_capacity(self.records().len() + 1);
        rows.push(params.iter().map(|p| p.to_string()).collect());
        for record in self.records() {
            rows.push(params.iter().map(|p| cell(record, p)).collect());
        }
        rows
    }

    /// The trigger rows as CSV text, values quoted where needed.
    pub fn trigger_table(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in self.trigger_rows() {
            writer.write_record(&row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TriggerError::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn print_trigger_list(&self) -> Result<()> {
        print!("{}", self.trigger_table()?);
        Ok(())
    }

    /// Trigger table, then the full event log.
    pub fn render_report(&self) -> Result<String> {
        let mut out = self.trigger_table()?;
        for entry in self.events().entries() {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        Ok(out)
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render_report()?)?;
        tracing::info!(
            path = %path.display(),
            triggers = self.records().len(),
            "trigger report saved"
        );
        Ok(())
    }
}

fn cell(record: &TriggerRecord, param: &str) -> String {
    match param {
        "trigger_no" => record.sequence_number().to_string(),
        "trigger_type" => record.trigger_type().to_string(),
        field => record
            .get(field)
            .map_or_else(|| UNKNOWN.to_string(), |v| v.to_string()),
    }
}
