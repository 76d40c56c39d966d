use card_checkout::application::alerts::AlertCenter;
use card_checkout::application::checkout::Collaborators;
use card_checkout::domain::risk::RiskVerdict;
use card_checkout::infrastructure::in_memory::InMemoryCustomerDirectory;
use card_checkout::infrastructure::simulated::{SimulatedGateway, SimulatedRiskVerifier};
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Writes a session script with the `action,field,value` header.
pub fn write_script(rows: &[[&str; 3]]) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    {
        let mut wtr = csv::Writer::from_writer(file.as_file_mut());
        wtr.write_record(["action", "field", "value"])?;
        for row in rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
    }
    file.flush()?;
    Ok(file)
}

pub struct Simulated {
    pub collaborators: Collaborators,
    pub gateway: Arc<SimulatedGateway>,
    pub directory: InMemoryCustomerDirectory,
    pub alerts: Arc<AlertCenter>,
}

pub fn simulated(verdict: RiskVerdict) -> Simulated {
    let gateway = Arc::new(SimulatedGateway::new());
    let directory = InMemoryCustomerDirectory::new();
    let alerts = Arc::new(AlertCenter::default());
    let collaborators = Collaborators {
        gateway: gateway.clone(),
        directory: Arc::new(directory.clone()),
        verifier: Arc::new(SimulatedRiskVerifier::with_verdict(verdict)),
        alerts: alerts.clone(),
    };
    Simulated {
        collaborators,
        gateway,
        directory,
        alerts,
    }
}
