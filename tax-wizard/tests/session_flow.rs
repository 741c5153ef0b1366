//! End-to-end runs of the wizard: a scripted return through the command
//! runner, and direct session use around the simulated background tasks.

use std::{fs, path::Path, time::Duration};

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_core::{DocumentId, IncomeField, ProcessingStatus, VerificationMethod};
use tax_wizard::{Action, Step, SubmissionStatus, WizardConfig, WizardSession, runner};

fn fixture_script() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("full_return.txt");
    fs::read_to_string(path).expect("fixture script should be readable")
}

fn config_in(dir: &Path) -> WizardConfig {
    WizardConfig {
        output_dir: dir.to_path_buf(),
        ..WizardConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn scripted_return_reaches_complete() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut events) = WizardSession::new(&config_in(dir.path())).unwrap();
    let script = fixture_script();
    let mut out = Vec::new();

    runner::run(&mut session, &mut events, script.as_bytes(), &mut out)
        .await
        .unwrap();
    let output = String::from_utf8(out).unwrap();

    assert!(!output.contains("error:"), "unexpected error in:\n{output}");
    assert_eq!(session.step(), Step::Complete);
    assert!(output.contains("Estimated refund    $1,862"));
    assert!(output.contains("Filing Complete"));

    let SubmissionStatus::Submitted { confirmation, .. } = session.submission() else {
        panic!("return should be submitted, got {:?}", session.submission());
    };
    assert!(confirmation.starts_with("TX-"));
    assert_eq!(confirmation.len(), 12);

    let summary = fs::read_to_string(dir.path().join("Tax_Return_2024_Federal.txt")).unwrap();
    assert!(summary.contains("Email:            jane@example.com"));
    assert!(summary.contains("SSN:              ***-**-6789"));
    assert!(summary.contains(confirmation.as_str()));
}

#[tokio::test(start_paused = true)]
async fn continue_on_complete_starts_a_fresh_return() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut events) = WizardSession::new(&config_in(dir.path())).unwrap();
    let script = format!("{}next\n", fixture_script());
    let mut out = Vec::new();

    runner::run(&mut session, &mut events, script.as_bytes(), &mut out)
        .await
        .unwrap();

    assert_eq!(session.step(), Step::Registration);
    assert_eq!(session.registration().email, "");
    assert_eq!(session.record().total_income(), dec!(0));
    assert_eq!(session.submission(), &SubmissionStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn document_removed_while_processing_stays_removed() {
    let (mut session, mut events) = WizardSession::new(&WizardConfig::default()).unwrap();
    session.dispatch(Action::ChooseVerification(VerificationMethod::ThirdParty)).unwrap();
    session.dispatch(Action::StartProviderCheck).unwrap();

    let event = events.recv().await.unwrap();
    session.apply_event(event);
    session.dispatch(Action::ConfirmCode("654321".into())).unwrap();
    assert!(session.record().verification.is_verified());

    for action in [
        Action::SetEmail("sam@example.org".into()),
        Action::SetPassword("hunter22".into()),
        Action::SetPhone("5550001111".into()),
        Action::SetSsn("111-22-3333".into()),
        Action::Continue,
        Action::SetIncome(IncomeField::Wages, "40000".into()),
        Action::Continue,
        Action::UploadDocument {
            name: "1099.pdf".into(),
            size_bytes: 512,
        },
        Action::ImportFromProvider,
        Action::RemoveDocument(DocumentId(1)),
    ] {
        session.dispatch(action).unwrap();
    }
    assert_eq!(session.step(), Step::DocumentUpload);

    tokio::time::sleep(Duration::from_secs(3)).await;
    while let Ok(event) = events.try_recv() {
        session.apply_event(event);
    }

    let documents = &session.record().documents;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, DocumentId(2));
    assert_eq!(documents[0].status, ProcessingStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn config_file_delays_drive_the_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tax-wizard.toml");
    fs::write(
        &path,
        "tax_year = 2025\nverification_delay_ms = 10\n\n[estimator]\nstate_rate = \"0.04\"\n",
    )
    .unwrap();
    let config = WizardConfig::load(&path).unwrap();
    assert_eq!(config.tax_year, 2025);

    let (mut session, mut events) = WizardSession::new(&config).unwrap();
    session.dispatch(Action::ChooseVerification(VerificationMethod::Document)).unwrap();
    session.dispatch(Action::UploadIdDocument).unwrap();

    let started = tokio::time::Instant::now();
    let event = events.recv().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(10));
    assert!(started.elapsed() < Duration::from_millis(1500));
    session.apply_event(event);

    let summary = session.download_summary_to(dir.path(), "State").unwrap();
    assert_eq!(summary, dir.path().join("Tax_Return_2025_State.txt"));
}
