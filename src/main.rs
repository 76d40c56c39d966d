use card_checkout::application::alerts::AlertCenter;
use card_checkout::application::checkout::{Checkout, CheckoutSubmit, Collaborators};
use card_checkout::config::CheckoutConfig;
use card_checkout::domain::form::{CardFields, FieldName};
use card_checkout::domain::risk::RiskPolicy;
use card_checkout::domain::strong_auth::BridgeMessage;
use card_checkout::error::{CheckoutError, Result as CheckoutResult};
use card_checkout::interfaces::csv::session_reader::{
    SessionAction, SessionEvent, SessionScriptReader,
};
use card_checkout::interfaces::report::SessionReport;
use card_checkout::telemetry;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Token sent to the risk verifier when a row does not carry one.
const SCRIPT_RISK_TOKEN: &str = "scripted-session";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Session script CSV file (`action,field,value`)
    script: PathBuf,

    #[command(flatten)]
    config: CheckoutConfig,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let alerts = Arc::new(AlertCenter::new(cli.config.alert_ttl()));
    let collaborators = cli.config.collaborators(alerts.clone()).into_diagnostic()?;
    let policy = cli.config.risk_policy();
    let mut checkout = Checkout::new(collaborators.clone(), policy, CardFields::default());

    let file = File::open(&cli.script).into_diagnostic()?;
    let reader = SessionScriptReader::new(file);
    for (row, event) in reader.events().enumerate() {
        let row = row + 1;
        match event {
            Ok(event) => {
                if let Err(e) = apply(&mut checkout, &collaborators, policy, &event).await {
                    eprintln!("Error applying row {}: {}", row, e);
                }
            }
            Err(e) => {
                eprintln!("Error reading row {}: {}", row, e);
            }
        }
    }

    let report = SessionReport::capture(&checkout, &alerts);
    report.write_json(io::stdout().lock()).into_diagnostic()?;

    Ok(())
}

async fn apply(
    checkout: &mut Checkout,
    collaborators: &Collaborators,
    policy: RiskPolicy,
    event: &SessionEvent,
) -> CheckoutResult<()> {
    match event.action {
        SessionAction::Identify => {
            let field = event.field()?;
            let center_id: i64 = field
                .parse()
                .map_err(|_| CheckoutError::Validation(format!("invalid center id: {}", field)))?;
            let identified = collaborators
                .identify_customer(&policy, SCRIPT_RISK_TOKEN, event.value_or_empty(), center_id)
                .await;
            if let Some(profile) = identified {
                *checkout = Checkout::for_customer(collaborators.clone(), policy, &profile);
            }
        }
        SessionAction::Set => {
            let name: FieldName = event.field()?.parse()?;
            if !checkout.update_field(name, event.value_or_empty()) {
                return Err(CheckoutError::Validation(format!(
                    "input refused for {}",
                    name
                )));
            }
        }
        SessionAction::Next => checkout.go_to_next_step(),
        SessionAction::Back => checkout.go_to_previous_step(),
        SessionAction::Submit => {
            let token = event.value.as_deref().unwrap_or(SCRIPT_RISK_TOKEN);
            let outcome = checkout.submit(token).await;
            debug!(?outcome, "submit replayed");
            if outcome == CheckoutSubmit::NotReady {
                return Err(CheckoutError::Validation(
                    "form is not ready for submission".to_string(),
                ));
            }
        }
        SessionAction::Auth => {
            let message = bridge_message(event.value_or_empty())?;
            if checkout.handle_strong_auth_message(&message).await.is_none() {
                debug!("strong-auth message had no effect");
            }
        }
        SessionAction::Close => checkout.close_strong_auth(),
    }
    Ok(())
}

/// A JSON message as posted by the strong-auth document, or a bare response key.
fn bridge_message(raw: &str) -> CheckoutResult<BridgeMessage> {
    if raw.starts_with('{') {
        BridgeMessage::parse(raw).ok_or_else(|| {
            CheckoutError::Validation("unrecognized strong-auth message".to_string())
        })
    } else {
        Ok(BridgeMessage::response(raw))
    }
}
